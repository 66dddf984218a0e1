//! Pausable timer queue.
//!
//! Timers carry a typed payload instead of a callback. The owner drains due
//! payloads with [`Scheduler::poll`] and decides what each one means, so the
//! queue itself knows nothing about the game driving it.
//!
//! All times passed in are host milliseconds; all times handed out are
//! milliseconds since the scheduler's origin.

use tracing::trace;

/// Cancellation handle returned by [`Scheduler::after`] and [`Scheduler::every`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    /// Due time, relative to the scheduler origin.
    pub at: u64,
    pub event: E,
}

#[derive(Debug, Clone)]
struct Entry<E> {
    handle: TimerHandle,
    due: u64,
    /// Delay left when the queue was paused.
    remaining: u64,
    period: Option<u64>,
    event: E,
}

#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
    origin: u64,
    cursor: u64,
    paused_at: Option<u64>,
    paused_total: u64,
}

impl<E: Clone> Scheduler<E> {
    pub fn new(origin_ms: u64) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            origin: origin_ms,
            cursor: origin_ms,
            paused_at: None,
            paused_total: 0,
        }
    }

    /// Milliseconds since the origin, paused spans included.
    pub fn now(&self) -> u64 {
        self.cursor - self.origin
    }

    /// Milliseconds since the origin with every paused span removed.
    pub fn active_now(&self) -> u64 {
        let current_pause = self.paused_at.map_or(0, |at| self.cursor.saturating_sub(at));
        self.now().saturating_sub(self.paused_total + current_pause)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Delay left before `handle` fires, measured on the scheduler clock.
    pub fn remaining(&self, handle: TimerHandle) -> Option<u64> {
        self.entries.iter().find(|e| e.handle == handle).map(|e| {
            if self.is_paused() {
                e.remaining
            } else {
                e.due.saturating_sub(self.cursor)
            }
        })
    }

    /// Schedules `event` once, `delay_ms` after the current scheduler time.
    pub fn after(&mut self, delay_ms: u64, event: E) -> TimerHandle {
        self.insert(delay_ms, None, event)
    }

    /// Schedules `event` every `interval_ms` until cancelled. The first
    /// firing is one interval out.
    pub fn every(&mut self, interval_ms: u64, event: E) -> TimerHandle {
        let interval_ms = interval_ms.max(1);
        self.insert(interval_ms, Some(interval_ms), event)
    }

    fn insert(&mut self, delay_ms: u64, period: Option<u64>, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            due: self.cursor.saturating_add(delay_ms),
            remaining: delay_ms,
            period,
            event,
        });
        handle
    }

    /// Returns `true` only for the call that actually removed the timer.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Freezes every pending timer. No-op when already paused.
    pub fn pause(&mut self, at_ms: u64) -> bool {
        if self.is_paused() {
            return false;
        }
        self.cursor = self.cursor.max(at_ms);
        for entry in &mut self.entries {
            entry.remaining = entry.due.saturating_sub(self.cursor);
        }
        self.paused_at = Some(self.cursor);
        true
    }

    /// Re-arms every frozen timer with the delay it had left. No-op when running.
    pub fn resume(&mut self, at_ms: u64) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        self.cursor = self.cursor.max(at_ms);
        self.paused_total += self.cursor - paused_at;
        for entry in &mut self.entries {
            entry.due = self.cursor + entry.remaining;
        }
        true
    }

    /// Pops the earliest timer due at or before `until_ms`.
    ///
    /// While a timer is being handed out the scheduler clock sits at its due
    /// time, so anything the owner schedules in response is measured from
    /// there rather than from `until_ms`. Once nothing else is due the clock
    /// moves to `until_ms`.
    pub fn poll(&mut self, until_ms: u64) -> Option<Fired<E>> {
        if self.is_paused() {
            self.cursor = self.cursor.max(until_ms);
            return None;
        }

        let next = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until_ms)
            .min_by_key(|(_, e)| (e.due, e.handle))
            .map(|(idx, _)| idx);

        let Some(idx) = next else {
            self.cursor = self.cursor.max(until_ms);
            return None;
        };

        let due = self.entries[idx].due;
        self.cursor = self.cursor.max(due);
        let fired = match self.entries[idx].period {
            Some(period) => {
                let entry = &mut self.entries[idx];
                entry.due += period;
                Fired {
                    handle: entry.handle,
                    at: due - self.origin,
                    event: entry.event.clone(),
                }
            }
            None => {
                let entry = self.entries.remove(idx);
                Fired {
                    handle: entry.handle,
                    at: due - self.origin,
                    event: entry.event,
                }
            }
        };
        trace!(handle = fired.handle.0, at = fired.at, "timer fired");
        Some(fired)
    }

    /// Moves the clock to `until_ms` and returns every due timer in firing order.
    ///
    /// Repeating timers that fall behind are caught up one period at a time.
    pub fn drain_due(&mut self, until_ms: u64) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while let Some(f) = self.poll(until_ms) {
            fired.push(f);
        }
        fired
    }
}
