//! Go/no-go vigilance task bounded by wall-clock time.
//!
//! Targets and distractors pop up at random non-overlapping positions and
//! vanish after a fixed lifetime. The run ends when the active-time budget
//! runs out, however many stimuli were shown.

mod scoring;

pub use scoring::score_session;

use cogni_core::{
    Domain, GameRng, Phase, Position, ScoreReport, Snapshot, TrialId, TrialLog, VisibleStimulus,
    VisualClass,
};
use cogni_timing::TimerHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::VigilanceConfig;
use crate::engine::{Cx, Game, advance_phase};

const HIT_POINTS: u64 = 100;
const FALSE_ALARM_PENALTY: u64 = 50;

#[derive(Copy, Debug, Clone, PartialEq, Default)]
pub enum VigilancePhase {
    #[default]
    Setup,
    Countdown,
    Playing,
    Paused,
    Result,
}

impl Phase for VigilancePhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Playing)
    }

    fn can_advance_to(&self, next: Self) -> bool {
        use VigilancePhase::*;
        matches!(
            (self, next),
            (Setup, Countdown)
                | (Countdown, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, Result)
        )
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Result)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Countdown => "countdown",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Result => "result",
        }
    }

    fn is_pausable(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VigilanceStimulus {
    pub is_target: bool,
    pub x: f32,
    pub y: f32,
    /// Active milliseconds since play began when the stimulus appeared.
    pub elapsed_ms: u64,
}

#[derive(Debug)]
pub enum VigilanceInput {
    /// Tap on the visible stimulus with this id.
    Tap(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VigilanceEvent {
    CountdownTick,
    SecondTick,
    Spawn,
    Expire(TrialId),
    BudgetElapsed,
}

#[derive(Debug, Clone)]
struct Live {
    trial: TrialId,
    position: Position,
    is_target: bool,
    expiry: TimerHandle,
}

/// Picks a point at least `min_separation` away from every occupied point.
///
/// Gives up after `attempts` draws and keeps the last candidate.
pub fn place_stimulus(
    rng: &mut GameRng,
    occupied: &[Position],
    config: &VigilanceConfig,
) -> Position {
    let (w, h) = config.arena;
    let m = config.margin;
    let mut candidate = Position::new(w / 2.0, h / 2.0);
    for _ in 0..config.placement_attempts.max(1) {
        candidate = Position::new(rng.uniform(m, w - m), rng.uniform(m, h - m));
        if occupied
            .iter()
            .all(|p| p.distance(&candidate) >= config.min_separation)
        {
            return candidate;
        }
    }
    trace!(
        visible = occupied.len(),
        "no free spot found, accepting overlap"
    );
    candidate
}

/// Next spawn delay: the drawn base interval stretched when recent accuracy drops.
pub fn spawn_interval(base_ms: u64, accuracy_so_far: f64) -> u64 {
    let factor = (2.0 - accuracy_so_far).clamp(0.7, 1.3);
    (base_ms as f64 * factor).round() as u64
}

pub struct VigilanceGame {
    config: VigilanceConfig,
    phase: VigilancePhase,
    countdown_left: u32,
    seconds_left: u64,
    countdown_timer: Option<TimerHandle>,
    second_timer: Option<TimerHandle>,
    spawn_timer: Option<TimerHandle>,
    playing_since: u64,
    elapsed_ms: u64,
    visible: Vec<Live>,
    hits: u32,
    misses: u32,
    false_alarms: u32,
    correct_rejections: u32,
    running_score: u64,
}

impl VigilanceGame {
    pub fn new(config: VigilanceConfig) -> Self {
        let config = config.sanitized();
        Self {
            phase: VigilancePhase::Setup,
            countdown_left: config.countdown_secs,
            seconds_left: config.duration_ms.div_ceil(1_000),
            countdown_timer: None,
            second_timer: None,
            spawn_timer: None,
            playing_since: 0,
            elapsed_ms: 0,
            visible: Vec::new(),
            hits: 0,
            misses: 0,
            false_alarms: 0,
            correct_rejections: 0,
            running_score: 0,
            config,
        }
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn false_alarms(&self) -> u32 {
        self.false_alarms
    }

    pub fn correct_rejections(&self) -> u32 {
        self.correct_rejections
    }

    /// Active milliseconds played once the budget ran out.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Share of resolved stimuli handled correctly; 1.0 before anything resolved.
    pub fn accuracy_so_far(&self) -> f64 {
        let resolved = self.hits + self.misses + self.false_alarms + self.correct_rejections;
        if resolved == 0 {
            return 1.0;
        }
        (self.hits + self.correct_rejections) as f64 / resolved as f64
    }

    fn begin_playing(&mut self, cx: &mut Cx<Self>) {
        cx.cancel(self.countdown_timer.take());
        advance_phase(&mut self.phase, VigilancePhase::Playing);
        self.playing_since = cx.now();
        cx.after(self.config.duration_ms, VigilanceEvent::BudgetElapsed);
        self.second_timer = Some(cx.every(1_000, VigilanceEvent::SecondTick));
        self.schedule_spawn(cx);
    }

    fn schedule_spawn(&mut self, cx: &mut Cx<Self>) {
        let (lo, hi) = self.config.spawn_interval_ms;
        let base = cx.rng().between(lo, hi);
        let delay = spawn_interval(base, self.accuracy_so_far());
        self.spawn_timer = Some(cx.after(delay, VigilanceEvent::Spawn));
    }

    fn spawn(&mut self, cx: &mut Cx<Self>) {
        let occupied: Vec<Position> = self.visible.iter().map(|l| l.position).collect();
        let position = place_stimulus(cx.rng(), &occupied, &self.config);
        let is_target = cx.rng().chance(self.config.target_probability);
        let now = cx.now();
        let stimulus = VigilanceStimulus {
            is_target,
            x: position.x,
            y: position.y,
            elapsed_ms: now - self.playing_since,
        };
        let trial = cx.log_mut().open(stimulus, now);
        let expiry = cx.after(
            self.config.stimulus_lifetime_ms,
            VigilanceEvent::Expire(trial),
        );
        trace!(trial, is_target, "spawned");
        self.visible.push(Live {
            trial,
            position,
            is_target,
            expiry,
        });
    }

    fn expire(&mut self, trial: TrialId, cx: &mut Cx<Self>) {
        let Some(idx) = self.visible.iter().position(|l| l.trial == trial) else {
            return;
        };
        let live = self.visible.remove(idx);
        let now = cx.now();
        if live.is_target {
            self.misses += 1;
        } else {
            self.correct_rejections += 1;
        }
        cx.log_mut().expire(trial, now, !live.is_target);
    }

    fn finish(&mut self, cx: &mut Cx<Self>) {
        cx.cancel(self.spawn_timer.take());
        cx.cancel(self.second_timer.take());
        let now = cx.now();
        for live in self.visible.drain(..) {
            cx.cancel(Some(live.expiry));
            cx.log_mut().withdraw(live.trial, now);
        }
        self.elapsed_ms = now - self.playing_since;
        self.seconds_left = 0;
        advance_phase(&mut self.phase, VigilancePhase::Result);
        debug!(
            hits = self.hits,
            misses = self.misses,
            false_alarms = self.false_alarms,
            elapsed_ms = self.elapsed_ms,
            "vigilance budget elapsed"
        );
        cx.finish();
    }
}

impl Game for VigilanceGame {
    type Phase = VigilancePhase;
    type Stimulus = VigilanceStimulus;
    type Input = VigilanceInput;
    type Event = VigilanceEvent;

    const DOMAIN: Domain = Domain::Attention;

    fn phase(&self) -> VigilancePhase {
        self.phase
    }

    fn start(&mut self, cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, VigilancePhase::Countdown);
        if self.countdown_left == 0 {
            self.begin_playing(cx);
        } else {
            self.countdown_timer = Some(cx.every(1_000, VigilanceEvent::CountdownTick));
        }
    }

    fn on_event(&mut self, event: VigilanceEvent, cx: &mut Cx<Self>) {
        match event {
            VigilanceEvent::CountdownTick => {
                self.countdown_left = self.countdown_left.saturating_sub(1);
                if self.countdown_left == 0 {
                    self.begin_playing(cx);
                }
            }
            VigilanceEvent::SecondTick => {
                self.seconds_left = self.seconds_left.saturating_sub(1);
            }
            VigilanceEvent::Spawn => {
                self.spawn(cx);
                self.schedule_spawn(cx);
            }
            VigilanceEvent::Expire(trial) => self.expire(trial, cx),
            VigilanceEvent::BudgetElapsed => self.finish(cx),
        }
    }

    fn on_input(&mut self, input: VigilanceInput, cx: &mut Cx<Self>) {
        let VigilanceInput::Tap(id) = input;
        let Some(idx) = self.visible.iter().position(|l| l.trial as u64 == id) else {
            return;
        };
        let live = self.visible.remove(idx);
        cx.cancel(Some(live.expiry));
        let now = cx.now();
        if live.is_target {
            self.hits += 1;
            self.running_score += HIT_POINTS;
            cx.log_mut()
                .respond(live.trial, now, true, HIT_POINTS as u32);
        } else {
            self.false_alarms += 1;
            self.running_score = self.running_score.saturating_sub(FALSE_ALARM_PENALTY);
            cx.log_mut().respond(live.trial, now, false, 0);
        }
    }

    fn on_pause(&mut self, _cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, VigilancePhase::Paused);
    }

    fn on_resume(&mut self, _cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, VigilancePhase::Playing);
    }

    fn snapshot(&self, cx: &Cx<Self>) -> Snapshot {
        let mut snapshot = Snapshot::new(self.phase.label());
        snapshot.stimuli = self
            .visible
            .iter()
            .map(|l| VisibleStimulus {
                id: l.trial as u64,
                position: l.position,
                class: if l.is_target {
                    VisualClass::Target
                } else {
                    VisualClass::Distractor
                },
            })
            .collect();
        snapshot.trial = cx.log().len();
        snapshot.time_remaining_ms = Some(match self.phase {
            VigilancePhase::Setup | VigilancePhase::Countdown => self.countdown_left as u64 * 1_000,
            _ => self.seconds_left * 1_000,
        });
        snapshot.running_score = self.running_score;
        snapshot
    }

    fn report(&self, log: &TrialLog<VigilanceStimulus>) -> ScoreReport {
        score_session(log, &self.config, self.elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_scaling_is_clamped() {
        assert_eq!(spawn_interval(1_000, 1.0), 1_000);
        assert_eq!(spawn_interval(1_000, 0.0), 1_300);
        assert_eq!(spawn_interval(1_000, 0.8), 1_200);
        // accuracy can't push below 0.7 of base
        assert_eq!(spawn_interval(1_000, 5.0), 700);
    }

    #[test]
    fn placement_respects_separation_when_possible() {
        let config = VigilanceConfig::default();
        let mut rng = GameRng::new(11);
        let mut occupied = Vec::new();
        for _ in 0..5 {
            let p = place_stimulus(&mut rng, &occupied, &config);
            let apart = |o: &Position| o.distance(&p) >= config.min_separation;
            assert!(occupied.iter().all(apart));
            let inside = config.margin..=config.arena.0 - config.margin;
            assert!(inside.contains(&p.x));
            occupied.push(p);
        }
    }

    #[test]
    fn crowded_arena_still_places() {
        let config = VigilanceConfig {
            min_separation: 10_000.0,
            ..VigilanceConfig::default()
        };
        let mut rng = GameRng::new(1);
        let occupied = vec![Position::new(400.0, 300.0)];
        let p = place_stimulus(&mut rng, &occupied, &config);
        let inside = config.margin..=config.arena.1 - config.margin;
        assert!(inside.contains(&p.y));
    }

    #[test]
    fn paused_is_reachable_only_from_playing() {
        use VigilancePhase::*;
        assert!(Playing.can_advance_to(Paused));
        assert!(Paused.can_advance_to(Playing));
        assert!(!Countdown.can_advance_to(Paused));
        assert!(!Paused.can_advance_to(Result));
        assert!(!Paused.allows_input());
        assert!(!Countdown.is_pausable());
    }
}
