//! Generic engine driver shared by every game.
//!
//! A [`Game`] is a state machine that reacts to typed timer events and player
//! input. [`Engine`] owns the game together with its scheduler, trial log and
//! RNG, feeds it events strictly in firing order, and emits the single
//! [`ScoreReport`] once the game declares itself finished.

use std::fmt;

use cogni_core::{Domain, GameRng, Phase, ScoreReport, Snapshot, TrialLog};
use cogni_timing::{Scheduler, TimerHandle};
use tracing::{debug, info, trace, warn};

/// Everything a game may touch while handling one event.
pub struct Context<E, S> {
    timers: Scheduler<E>,
    log: TrialLog<S>,
    rng: GameRng,
    finished: bool,
}

/// Context type for a given game.
pub type Cx<G> = Context<<G as Game>::Event, <G as Game>::Stimulus>;

impl<E: Clone, S> Context<E, S> {
    fn new(seed: u64, origin_ms: u64) -> Self {
        Self {
            timers: Scheduler::new(origin_ms),
            log: TrialLog::new(),
            rng: GameRng::new(seed),
            finished: false,
        }
    }

    /// Active milliseconds since the engine was created; paused spans are excluded.
    pub fn now(&self) -> u64 {
        self.timers.active_now()
    }

    pub fn after(&mut self, delay_ms: u64, event: E) -> TimerHandle {
        self.timers.after(delay_ms, event)
    }

    pub fn every(&mut self, interval_ms: u64, event: E) -> TimerHandle {
        self.timers.every(interval_ms, event)
    }

    /// Cancels `handle` if it is still pending. Safe to call repeatedly.
    pub fn cancel(&mut self, handle: Option<TimerHandle>) {
        if let Some(h) = handle {
            self.timers.cancel(h);
        }
    }

    pub fn remaining(&self, handle: Option<TimerHandle>) -> Option<u64> {
        handle.and_then(|h| self.timers.remaining(h))
    }

    pub fn log(&self) -> &TrialLog<S> {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut TrialLog<S> {
        &mut self.log
    }

    pub fn rng(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Marks the game as done. The engine scores it after the current event returns.
    pub fn finish(&mut self) {
        self.finished = true;
    }
}

/// One mini-game: its phases, stimuli, timer events, input and scoring rules.
pub trait Game {
    type Phase: Phase;
    type Stimulus: Clone + fmt::Debug;
    type Input: fmt::Debug;
    type Event: Clone + fmt::Debug;

    const DOMAIN: Domain;

    fn phase(&self) -> Self::Phase;

    /// Called once when the host starts the engine.
    fn start(&mut self, cx: &mut Cx<Self>);

    fn on_event(&mut self, event: Self::Event, cx: &mut Cx<Self>);

    /// Only called while the phase allows input and the engine is not paused.
    fn on_input(&mut self, input: Self::Input, cx: &mut Cx<Self>);

    fn on_pause(&mut self, _cx: &mut Cx<Self>) {}

    fn on_resume(&mut self, _cx: &mut Cx<Self>) {}

    fn snapshot(&self, cx: &Cx<Self>) -> Snapshot;

    fn report(&self, log: &TrialLog<Self::Stimulus>) -> ScoreReport;
}

/// Moves `current` to `next` if the phase graph allows it.
pub(crate) fn advance_phase<P: Phase>(current: &mut P, next: P) -> bool {
    if !current.can_advance_to(next) {
        warn!(
            from = current.label(),
            to = next.label(),
            "rejected phase transition"
        );
        return false;
    }
    debug!(
        from = current.label(),
        to = next.label(),
        "phase transition"
    );
    *current = next;
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Finished,
    Abandoned,
}

pub struct Engine<G: Game> {
    game: G,
    cx: Cx<G>,
    status: Status,
    report: Option<ScoreReport>,
}

impl<G: Game> Engine<G> {
    /// `origin_ms` is the host timestamp the engine counts from.
    pub fn new(game: G, seed: u64, origin_ms: u64) -> Self {
        Self {
            game,
            cx: Context::new(seed, origin_ms),
            status: Status::Idle,
            report: None,
        }
    }

    pub fn start(&mut self, at_ms: u64) -> Option<ScoreReport> {
        if self.status != Status::Idle {
            return None;
        }
        self.cx.timers.drain_due(at_ms);
        self.status = Status::Running;
        info!(domain = %G::DOMAIN, seed = self.cx.rng.seed(), "engine started");
        self.game.start(&mut self.cx);
        self.settle()
    }

    /// Fires every timer due at or before `now_ms`. Returns the report if the game ended.
    pub fn advance(&mut self, now_ms: u64) -> Option<ScoreReport> {
        if self.status != Status::Running {
            return None;
        }
        while let Some(fired) = self.cx.timers.poll(now_ms) {
            trace!(at = fired.at, event = ?fired.event, "dispatch");
            self.game.on_event(fired.event, &mut self.cx);
            if let Some(report) = self.settle() {
                return Some(report);
            }
        }
        None
    }

    /// Forwards one player action stamped with the host time it happened.
    ///
    /// Timers due before `at_ms` are fired first. Input outside an active
    /// phase, or while paused, is dropped without effect.
    pub fn input(&mut self, at_ms: u64, input: G::Input) -> Option<ScoreReport> {
        if let Some(report) = self.advance(at_ms) {
            return Some(report);
        }
        if self.status != Status::Running
            || self.cx.timers.is_paused()
            || !self.game.phase().allows_input()
        {
            trace!(?input, phase = self.game.phase().label(), "input ignored");
            return None;
        }
        self.game.on_input(input, &mut self.cx);
        self.settle()
    }

    /// Freezes every pending timer.
    ///
    /// Timers due at or before `at_ms` fire first. If one of them ends the
    /// game nothing is paused and the report is available from
    /// [`Engine::report`].
    pub fn pause(&mut self, at_ms: u64) -> bool {
        if self.advance(at_ms).is_some() {
            return false;
        }
        if self.status != Status::Running
            || self.cx.timers.is_paused()
            || !self.game.phase().is_pausable()
        {
            return false;
        }
        self.cx.timers.pause(at_ms);
        self.game.on_pause(&mut self.cx);
        debug!(at = at_ms, "engine paused");
        true
    }

    pub fn resume(&mut self, at_ms: u64) -> bool {
        if self.status != Status::Running || !self.cx.timers.resume(at_ms) {
            return false;
        }
        self.game.on_resume(&mut self.cx);
        debug!(at = at_ms, "engine resumed");
        true
    }

    /// Stops the engine without scoring it. All pending timers are dropped.
    pub fn abandon(&mut self) {
        if matches!(self.status, Status::Finished | Status::Abandoned) {
            return;
        }
        let dropped = self.cx.timers.cancel_all();
        self.status = Status::Abandoned;
        info!(domain = %G::DOMAIN, dropped_timers = dropped, "engine abandoned");
    }

    fn settle(&mut self) -> Option<ScoreReport> {
        if !self.cx.finished || self.status != Status::Running {
            return None;
        }
        self.cx.timers.cancel_all();
        self.status = Status::Finished;
        let report = self.game.report(&self.cx.log);
        info!(
            domain = %G::DOMAIN,
            score = report.score,
            accuracy = report.accuracy,
            trials = report.trials,
            "engine finished"
        );
        self.report = Some(report.clone());
        Some(report)
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = self.game.snapshot(&self.cx);
        snapshot.paused = self.cx.timers.is_paused();
        snapshot
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn phase(&self) -> G::Phase {
        self.game.phase()
    }

    pub fn is_paused(&self) -> bool {
        self.cx.timers.is_paused()
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn trials(&self) -> &TrialLog<G::Stimulus> {
        &self.cx.log
    }

    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    pub fn pending_timers(&self) -> usize {
        self.cx.timers.pending()
    }

    /// Active milliseconds the engine has run, paused spans excluded.
    pub fn elapsed(&self) -> u64 {
        self.cx.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogni_core::TrialOutcome;

    /// Two-trial toy game: each trial opens on a timer and closes on input or after 1s.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    enum ToyPhase {
        #[default]
        Setup,
        Playing,
        Result,
    }

    impl Phase for ToyPhase {
        fn allows_input(&self) -> bool {
            matches!(self, ToyPhase::Playing)
        }
        fn can_advance_to(&self, next: Self) -> bool {
            matches!(
                (self, next),
                (ToyPhase::Setup, ToyPhase::Playing) | (ToyPhase::Playing, ToyPhase::Result)
            )
        }
        fn is_terminal(&self) -> bool {
            matches!(self, ToyPhase::Result)
        }
        fn label(&self) -> &'static str {
            "toy"
        }
    }

    #[derive(Debug, Clone)]
    enum ToyEvent {
        Present,
        Expire(usize),
    }

    #[derive(Default)]
    struct Toy {
        phase: ToyPhase,
        current: Option<(usize, TimerHandle)>,
    }

    impl Toy {
        fn next(&mut self, cx: &mut Cx<Self>) {
            if cx.log().len() == 2 {
                advance_phase(&mut self.phase, ToyPhase::Result);
                cx.finish();
            } else {
                cx.after(100, ToyEvent::Present);
            }
        }
    }

    impl Game for Toy {
        type Phase = ToyPhase;
        type Stimulus = u8;
        type Input = ();
        type Event = ToyEvent;
        const DOMAIN: Domain = Domain::Attention;

        fn phase(&self) -> ToyPhase {
            self.phase
        }
        fn start(&mut self, cx: &mut Cx<Self>) {
            advance_phase(&mut self.phase, ToyPhase::Playing);
            cx.after(100, ToyEvent::Present);
        }
        fn on_event(&mut self, event: ToyEvent, cx: &mut Cx<Self>) {
            match event {
                ToyEvent::Present => {
                    let now = cx.now();
                    let id = cx.log_mut().open(1, now);
                    let h = cx.after(1_000, ToyEvent::Expire(id));
                    self.current = Some((id, h));
                }
                ToyEvent::Expire(id) => {
                    let now = cx.now();
                    cx.log_mut().expire(id, now, false);
                    self.current = None;
                    self.next(cx);
                }
            }
        }
        fn on_input(&mut self, _: (), cx: &mut Cx<Self>) {
            if let Some((id, h)) = self.current.take() {
                cx.cancel(Some(h));
                let now = cx.now();
                cx.log_mut().respond(id, now, true, 10);
                self.next(cx);
            }
        }
        fn snapshot(&self, _cx: &Cx<Self>) -> Snapshot {
            Snapshot::new(self.phase.label())
        }
        fn report(&self, log: &TrialLog<u8>) -> ScoreReport {
            let correct = log.iter().filter(|t| t.is_correct()).count();
            ScoreReport::new(
                Domain::Attention,
                correct as f64 * 50.0,
                0.0,
                None,
                "toy",
                log.len(),
            )
        }
    }

    #[test]
    fn report_is_emitted_exactly_once() {
        let mut engine = Engine::new(Toy::default(), 1, 10_000);
        assert!(engine.start(10_000).is_none());
        assert!(engine.advance(10_100).is_none());
        assert!(engine.input(10_350, ()).is_none());
        let report = engine.advance(10_450 + 1_000).unwrap();
        assert_eq!(report.score, 50);
        assert_eq!(engine.status(), Status::Finished);
        assert_eq!(engine.pending_timers(), 0);

        assert!(engine.advance(99_999).is_none());
        assert!(engine.input(99_999, ()).is_none());
        assert_eq!(engine.trials().len(), 2);
    }

    #[test]
    fn reaction_time_excludes_pause() {
        let mut engine = Engine::new(Toy::default(), 1, 0);
        engine.start(0);
        engine.advance(100);
        assert!(engine.pause(150));
        assert!(!engine.pause(160));
        // input while paused is dropped
        engine.input(400, ());
        assert!(engine.trials().is_open(0));
        assert!(engine.resume(5_000));
        engine.input(5_050, ());
        let trial = engine.trials().get(0).unwrap();
        assert_eq!(trial.reaction_time(), Some(100));
    }

    #[test]
    fn paused_timers_do_not_fire() {
        let mut engine = Engine::new(Toy::default(), 1, 0);
        engine.start(0);
        engine.advance(100);
        engine.pause(100);
        assert!(engine.advance(60_000).is_none());
        assert!(engine.trials().is_open(0));
        engine.resume(60_000);
        engine.advance(60_999);
        assert!(engine.trials().is_open(0));
        engine.advance(61_000);
        assert_eq!(
            engine.trials().get(0).unwrap().outcome,
            TrialOutcome::Expired { correct: false }
        );
    }

    #[test]
    fn pause_fires_overdue_timers_first() {
        let mut engine = Engine::new(Toy::default(), 1, 0);
        engine.start(0);
        engine.advance(100);
        // the first trial expired at 1100, before the pause
        assert!(engine.pause(1_500));
        assert_eq!(
            engine.trials().get(0).unwrap().outcome,
            TrialOutcome::Expired { correct: false }
        );
        assert_eq!(engine.trials().get(0).unwrap().closed_at, Some(1_100));
        assert!(engine.resume(9_000));
        assert_eq!(engine.elapsed(), 1_500);
    }

    #[test]
    fn pause_after_the_final_timer_reports_instead() {
        let mut engine = Engine::new(Toy::default(), 1, 0);
        engine.start(0);
        engine.advance(2_150);
        assert_eq!(engine.trials().len(), 2);
        // second trial expires at 2200 and ends the game
        assert!(!engine.pause(2_500));
        assert_eq!(engine.status(), Status::Finished);
        assert!(!engine.is_paused());
        assert!(engine.report().is_some());
        assert!(!engine.resume(3_000));
    }

    #[test]
    fn abandon_cancels_everything_and_never_reports() {
        let mut engine = Engine::new(Toy::default(), 1, 0);
        engine.start(0);
        engine.advance(100);
        assert!(engine.pending_timers() > 0);
        engine.abandon();
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.status(), Status::Abandoned);
        assert!(engine.advance(100_000).is_none());
        assert!(engine.input(100_000, ()).is_none());
        assert!(engine.report().is_none());
    }

    #[test]
    fn illegal_transition_is_refused() {
        let mut phase = ToyPhase::Setup;
        assert!(!advance_phase(&mut phase, ToyPhase::Result));
        assert_eq!(phase, ToyPhase::Setup);
        assert!(advance_phase(&mut phase, ToyPhase::Playing));
    }
}
