//! Mental-rotation matching: pick which of four candidates is the reference
//! shape turned by the shown angle.

mod scoring;
mod shape;

pub use scoring::{score_session, trial_points};
pub use shape::{Shape, angular_distance, quarter_turns, shape_bank};

use cogni_core::{
    Domain, GameRng, Phase, Position, ScoreReport, ShapeRole, Snapshot, TrialId, TrialLog,
    VisibleStimulus, VisualClass,
};
use cogni_timing::TimerHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::adaptive::StreakPolicy;
use crate::config::RotationConfig;
use crate::engine::{Cx, Game, advance_phase};

pub const OPTION_COUNT: usize = 4;
/// Snapshot id of the reference shape; options use ids `0..OPTION_COUNT`.
pub const REFERENCE_ID: u64 = 100;
/// Mirror-distractor probability per challenge level.
const MIRROR_DISTRACTOR_CHANCE: [f64; 3] = [0.5, 0.75, 1.0];

#[derive(Copy, Debug, Clone, PartialEq, Default)]
pub enum RotationPhase {
    #[default]
    Setup,
    Countdown,
    Playing,
    Result,
}

impl Phase for RotationPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Playing)
    }

    fn can_advance_to(&self, next: Self) -> bool {
        use RotationPhase::*;
        matches!(
            (self, next),
            (Setup, Countdown) | (Countdown, Playing) | (Playing, Result)
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
            Self::Result => "result",
        }
    }
}

/// One generated trial, as logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationStimulus {
    pub shape: String,
    /// Displayed angle in degrees.
    pub angle: u16,
    pub quarter_turns: u8,
    /// The reference is the mirrored base shape.
    pub mirror_task: bool,
    pub complexity: u8,
    pub reference: Shape,
    pub options: Vec<Shape>,
    pub correct_index: usize,
    pub has_mirror_distractor: bool,
}

impl RotationStimulus {
    pub fn correct(&self) -> Option<&Shape> {
        self.options.get(self.correct_index)
    }
}

#[derive(Debug)]
pub enum RotationInput {
    OptionSelect(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RotationEvent {
    CountdownTick,
    NextTrial,
    TrialTimeout(TrialId),
}

/// Complexity 1..=5 from size, asymmetry, off-grid angle and mirror distractor.
pub fn complexity(shape: &Shape, angle: u16, mirror_distractor: bool) -> u8 {
    let score = 1
        + u8::from(shape.len() >= 5)
        + u8::from(shape.is_chiral())
        + u8::from(angle % 90 != 0)
        + u8::from(mirror_distractor);
    score.min(5)
}

/// Fills `options` up to [`OPTION_COUNT`] with shapes not already present.
///
/// Higher complexity favours turned or mirrored copies of the reference over
/// other bank shapes. Random draws are bounded by `attempts`; a sweep over
/// the whole bank then guarantees completion.
fn add_fillers(
    rng: &mut GameRng,
    options: &mut Vec<Shape>,
    reference: &Shape,
    bank: &[(&'static str, Shape)],
    complexity: u8,
    attempts: u32,
) {
    let same_shape_chance = complexity as f64 / 5.0;
    let mut tries = 0;
    while options.len() < OPTION_COUNT && tries < attempts {
        tries += 1;
        let candidate = if rng.chance(same_shape_chance) {
            let turned = reference.rotated(rng.index(4) as u8);
            if rng.chance(0.5) {
                turned.mirrored()
            } else {
                turned
            }
        } else {
            let idx = rng.index(bank.len());
            bank[idx].1.rotated(rng.index(4) as u8)
        };
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }
    if options.len() < OPTION_COUNT {
        trace!(tries, "random fillers exhausted, sweeping bank");
    }
    'sweep: for (_, base) in bank {
        for turns in 0..4 {
            for candidate in [base.rotated(turns), base.rotated(turns).mirrored()] {
                if options.len() >= OPTION_COUNT {
                    break 'sweep;
                }
                if !options.contains(&candidate) {
                    options.push(candidate);
                }
            }
        }
    }
    if options.len() < OPTION_COUNT {
        warn!(
            options = options.len(),
            "shape bank too small for distinct options"
        );
    }
}

/// Builds one trial. `challenge` (0..=2) raises the odds of a mirror distractor.
pub fn generate_trial(
    rng: &mut GameRng,
    config: &RotationConfig,
    challenge: usize,
) -> RotationStimulus {
    let bank = shape_bank();
    let (name, base) = bank[rng.index(bank.len())].clone();
    let angle = rng.choose(&config.angle_pool).copied().unwrap_or(90);
    let turns = quarter_turns(angle);
    let mirror_task = rng.chance(config.mirror_task_probability);
    let reference = if mirror_task { base.mirrored() } else { base };
    let correct = reference.rotated(turns);

    let step = challenge.min(MIRROR_DISTRACTOR_CHANCE.len() - 1);
    let distractor_chance = MIRROR_DISTRACTOR_CHANCE[step];
    let mirror = correct.mirrored();
    let has_mirror_distractor = mirror != correct && (mirror_task || rng.chance(distractor_chance));
    let complexity = complexity(&reference, angle, has_mirror_distractor);

    let mut options = vec![correct.clone()];
    if has_mirror_distractor {
        options.push(mirror);
    }
    add_fillers(
        rng,
        &mut options,
        &reference,
        &bank,
        complexity,
        config.distractor_attempts,
    );

    let mut tagged: Vec<(bool, Shape)> = options
        .into_iter()
        .enumerate()
        .map(|(i, s)| (i == 0, s))
        .collect();
    rng.shuffle(&mut tagged);
    let correct_index = tagged
        .iter()
        .position(|(is_correct, _)| *is_correct)
        .unwrap_or(0);

    RotationStimulus {
        shape: name.to_string(),
        angle,
        quarter_turns: turns,
        mirror_task,
        complexity,
        reference,
        options: tagged.into_iter().map(|(_, s)| s).collect(),
        correct_index,
        has_mirror_distractor,
    }
}

struct Current {
    trial: TrialId,
    stimulus: RotationStimulus,
    timeout: TimerHandle,
}

pub struct RotationGame {
    config: RotationConfig,
    phase: RotationPhase,
    countdown_left: u32,
    countdown_timer: Option<TimerHandle>,
    current: Option<Current>,
    challenge: StreakPolicy,
    mirror_errors: usize,
    running_score: u64,
}

impl RotationGame {
    pub fn new(config: RotationConfig) -> Self {
        let config = config.sanitized();
        Self {
            phase: RotationPhase::Setup,
            countdown_left: config.countdown_secs,
            countdown_timer: None,
            current: None,
            challenge: StreakPolicy::new(0, 0, MIRROR_DISTRACTOR_CHANCE.len() - 1, 2),
            mirror_errors: 0,
            running_score: 0,
            config,
        }
    }

    pub fn mirror_errors(&self) -> usize {
        self.mirror_errors
    }

    pub fn challenge(&self) -> usize {
        self.challenge.level()
    }

    /// The trial on screen, if any.
    pub fn current(&self) -> Option<&RotationStimulus> {
        self.current.as_ref().map(|c| &c.stimulus)
    }

    fn begin_playing(&mut self, cx: &mut Cx<Self>) {
        cx.cancel(self.countdown_timer.take());
        advance_phase(&mut self.phase, RotationPhase::Playing);
        self.present(cx);
    }

    fn present(&mut self, cx: &mut Cx<Self>) {
        let stimulus = generate_trial(cx.rng(), &self.config, self.challenge.level());
        let now = cx.now();
        let trial = cx.log_mut().open(stimulus.clone(), now);
        let timeout = cx.after(
            self.config.response_window_ms,
            RotationEvent::TrialTimeout(trial),
        );
        trace!(
            trial,
            shape = %stimulus.shape,
            angle = stimulus.angle,
            complexity = stimulus.complexity,
            "rotation trial shown"
        );
        self.current = Some(Current {
            trial,
            stimulus,
            timeout,
        });
    }

    fn answer(&mut self, choice: usize, cx: &mut Cx<Self>) {
        if choice >= self.current.as_ref().map_or(0, |c| c.stimulus.options.len()) {
            return;
        }
        let Some(current) = self.current.take() else {
            return;
        };
        cx.cancel(Some(current.timeout));
        let now = cx.now();
        let stim = &current.stimulus;
        let correct = choice == stim.correct_index;
        let rt = cx
            .log()
            .get(current.trial)
            .map_or(0, |t| now.saturating_sub(t.presented_at));
        let points = if correct {
            trial_points(stim.complexity, rt, stim.angle % 90 != 0, stim.mirror_task)
        } else {
            if stim.correct().map(Shape::mirrored).as_ref() == stim.options.get(choice) {
                self.mirror_errors += 1;
                trace!(trial = current.trial, "mirror confusion");
            }
            0
        };
        cx.log_mut().respond(current.trial, now, correct, points);
        self.running_score += points as u64;
        debug!(
            trial = current.trial,
            correct,
            rt,
            points,
            "rotation answered"
        );
        self.close(correct, cx);
    }

    fn timeout(&mut self, trial: TrialId, cx: &mut Cx<Self>) {
        if self.current.as_ref().map(|c| c.trial) != Some(trial) {
            return;
        }
        self.current = None;
        let now = cx.now();
        cx.log_mut().expire(trial, now, false);
        debug!(trial, "rotation response window elapsed");
        self.close(false, cx);
    }

    fn close(&mut self, correct: bool, cx: &mut Cx<Self>) {
        if let Some(adjustment) = self.challenge.record(correct) {
            debug!(?adjustment, level = self.challenge.level(), "rotation challenge changed");
        }
        if cx.log().closed().count() >= self.config.trials {
            advance_phase(&mut self.phase, RotationPhase::Result);
            cx.finish();
        } else {
            cx.after(self.config.feedback_ms, RotationEvent::NextTrial);
        }
    }
}

impl Game for RotationGame {
    type Phase = RotationPhase;
    type Stimulus = RotationStimulus;
    type Input = RotationInput;
    type Event = RotationEvent;

    const DOMAIN: Domain = Domain::Visuospatial;

    fn phase(&self) -> RotationPhase {
        self.phase
    }

    fn start(&mut self, cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, RotationPhase::Countdown);
        if self.countdown_left == 0 {
            self.begin_playing(cx);
        } else {
            self.countdown_timer = Some(cx.every(1_000, RotationEvent::CountdownTick));
        }
    }

    fn on_event(&mut self, event: RotationEvent, cx: &mut Cx<Self>) {
        match event {
            RotationEvent::CountdownTick => {
                self.countdown_left = self.countdown_left.saturating_sub(1);
                if self.countdown_left == 0 {
                    self.begin_playing(cx);
                }
            }
            RotationEvent::NextTrial => self.present(cx),
            RotationEvent::TrialTimeout(trial) => self.timeout(trial, cx),
        }
    }

    fn on_input(&mut self, input: RotationInput, cx: &mut Cx<Self>) {
        let RotationInput::OptionSelect(choice) = input;
        self.answer(choice, cx);
    }

    fn snapshot(&self, cx: &Cx<Self>) -> Snapshot {
        let mut snapshot = Snapshot::new(self.phase.label());
        if let Some(current) = &self.current {
            let stim = &current.stimulus;
            snapshot.stimuli.push(VisibleStimulus {
                id: REFERENCE_ID,
                position: Position::new(400.0, 150.0),
                class: VisualClass::Shape {
                    cells: stim.reference.cells().to_vec(),
                    role: ShapeRole::Reference {
                        rotate_by: stim.angle,
                    },
                },
            });
            for (i, shape) in stim.options.iter().enumerate() {
                snapshot.stimuli.push(VisibleStimulus {
                    id: i as u64,
                    position: Position::new(130.0 + 180.0 * i as f32, 420.0),
                    class: VisualClass::Shape {
                        cells: shape.cells().to_vec(),
                        role: ShapeRole::Option(i),
                    },
                });
            }
            snapshot.time_remaining_ms = cx.remaining(Some(current.timeout));
        } else if matches!(self.phase, RotationPhase::Setup | RotationPhase::Countdown) {
            snapshot.time_remaining_ms = Some(self.countdown_left as u64 * 1_000);
        }
        snapshot.trial = cx.log().len();
        snapshot.trial_budget = Some(self.config.trials);
        snapshot.running_score = self.running_score;
        snapshot
    }

    fn report(&self, log: &TrialLog<RotationStimulus>) -> ScoreReport {
        score_session(log, self.mirror_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_is_bounded() {
        let bank = shape_bank();
        let (_, l4) = &bank[0];
        let (_, t4) = &bank[1];
        assert_eq!(complexity(t4, 90, false), 1);
        assert_eq!(complexity(l4, 90, false), 2);
        let (_, f5) = &bank[3];
        assert_eq!(complexity(f5, 60, true), 5);
    }

    #[test]
    fn options_are_distinct_with_one_correct() {
        let config = RotationConfig::default();
        let mut rng = GameRng::new(5);
        for challenge in 0..3 {
            for _ in 0..50 {
                let t = generate_trial(&mut rng, &config, challenge);
                assert_eq!(t.options.len(), OPTION_COUNT);
                let expected = t.reference.rotated(t.quarter_turns);
                let matching = t.options.iter().filter(|o| **o == expected).count();
                assert_eq!(matching, 1);
                assert_eq!(t.correct(), Some(&expected));
                for (i, a) in t.options.iter().enumerate() {
                    for b in &t.options[i + 1..] {
                        assert_ne!(a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn mirror_distractor_is_present_when_flagged() {
        let config = RotationConfig {
            mirror_task_probability: 1.0,
            ..RotationConfig::default()
        };
        let mut rng = GameRng::new(8);
        for _ in 0..30 {
            let t = generate_trial(&mut rng, &config, 0);
            assert!(t.mirror_task);
            let correct = t.correct().cloned().unwrap();
            if t.has_mirror_distractor {
                assert!(t.options.contains(&correct.mirrored()));
            } else {
                // symmetric shapes have no distinct mirror image
                assert!(!correct.is_chiral());
            }
        }
    }

    #[test]
    fn single_attempt_still_fills_options() {
        let config = RotationConfig {
            distractor_attempts: 1,
            ..RotationConfig::default()
        };
        let mut rng = GameRng::new(2);
        for _ in 0..20 {
            let trial = generate_trial(&mut rng, &config, 2);
            assert_eq!(trial.options.len(), OPTION_COUNT);
        }
    }
}
