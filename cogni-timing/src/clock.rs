use std::time::{Duration, Instant};

/// Source of host-side timestamps, in milliseconds.
///
/// Engines never read a clock themselves: the host stamps every input and
/// every `advance` call with a value taken from one of these.
pub trait Clock {
    fn now_ms(&self) -> u64;

    fn elapsed_since(&self, earlier_ms: u64) -> Duration {
        Duration::from_millis(self.now_ms().saturating_sub(earlier_ms))
    }
}

/// Wall clock backed by `Instant`, counting from construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Sleeps until `target_ms` on this clock; returns immediately if it already passed.
    ///
    /// Early or interrupted wake-ups go back to sleep for what is left.
    pub fn sleep_until(&self, target_ms: u64) {
        let deadline = self.start + Duration::from_millis(target_ms);
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return;
            }
            nap(left);
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Virtual clock for simulations and tests. Time only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: u64,
}

impl ManualClock {
    pub fn starting_at(now: u64) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, ms: u64) -> u64 {
        self.now = self.now.saturating_add(ms);
        self.now
    }

    /// Moves the clock forward to `ms`. Never moves backwards.
    pub fn set(&mut self, ms: u64) {
        self.now = self.now.max(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

#[cfg(not(target_os = "linux"))]
fn nap(left: Duration) {
    std::thread::sleep(left);
}

/// One absolute-deadline sleep on `CLOCK_MONOTONIC`.
#[cfg(target_os = "linux")]
fn nap(left: Duration) {
    const NANOS: u64 = 1_000_000_000;
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: both timespecs live on this stack frame for the whole call.
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut now);
        let nanos = now.tv_nsec as u64 + u64::from(left.subsec_nanos());
        let wake = libc::timespec {
            tv_sec: now.tv_sec + (left.as_secs() + nanos / NANOS) as libc::time_t,
            tv_nsec: (nanos % NANOS) as libc::c_long,
        };
        libc::clock_nanosleep(
            libc::CLOCK_MONOTONIC,
            libc::TIMER_ABSTIME,
            &wake,
            std::ptr::null_mut(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_goes_backwards() {
        let mut clock = ManualClock::starting_at(500);
        clock.set(200);
        assert_eq!(clock.now_ms(), 500);
        assert_eq!(clock.advance(250), 750);
        clock.set(1_000);
        assert_eq!(clock.now_ms(), 1_000);
    }

    #[test]
    fn elapsed_since_saturates() {
        let clock = ManualClock::starting_at(100);
        assert_eq!(clock.elapsed_since(40), Duration::from_millis(60));
        assert_eq!(clock.elapsed_since(400), Duration::ZERO);
    }

    #[test]
    fn sleep_until_reaches_the_target() {
        let clock = MonotonicClock::new();
        let target = clock.now_ms() + 3;
        clock.sleep_until(target);
        assert!(clock.now_ms() >= target);
        // already passed: no sleep at all
        clock.sleep_until(0);
    }
}
