//! Two-phase executive-function test: a block of colour-word interference
//! trials followed by one disk-transfer puzzle.

mod scoring;
mod tower;

pub use scoring::{score_session, stroop_points, tower_points};
pub use tower::Tower;

use cogni_core::{
    Domain, Phase, Position, ScoreReport, Snapshot, TrialId, TrialLog, VisibleStimulus, VisualClass,
};
use cogni_timing::TimerHandle;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::DualTaskConfig;
use crate::engine::{Cx, Game, advance_phase};

const TOWER_DISKS: u8 = 3;
const PEGS: usize = 3;
/// Snapshot id of the colour word; pads use ids `0..palette_size`.
pub const WORD_ID: u64 = 100;

#[derive(Copy, Debug, Clone, PartialEq, Default)]
pub enum DualTaskPhase {
    #[default]
    Setup,
    Countdown,
    Stroop,
    Tower,
    Result,
}

impl Phase for DualTaskPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Stroop | Self::Tower)
    }

    fn can_advance_to(&self, next: Self) -> bool {
        use DualTaskPhase::*;
        matches!(
            (self, next),
            (Setup, Countdown) | (Countdown, Stroop) | (Stroop, Tower) | (Tower, Result)
        )
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Result)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Countdown => "countdown",
            Self::Stroop => "stroop",
            Self::Tower => "tower",
            Self::Result => "result",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum DualTaskStimulus {
    Stroop {
        word: usize,
        ink: usize,
        congruent: bool,
    },
    Tower { disks: u8, optimal_moves: u32 },
}

#[derive(Debug)]
pub enum DualTaskInput {
    /// Answer a colour-word trial with a palette index.
    ColorTap(usize),
    /// Select a source peg, then a destination peg.
    PegSelect(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DualTaskEvent {
    CountdownTick,
    NextStroop,
    TowerTick,
    TowerTimeout,
}

#[derive(Debug, Clone, Copy)]
struct StroopTrial {
    id: TrialId,
    word: usize,
    ink: usize,
}

/// Milliseconds between presenting `trial` and `now`.
fn since_presented(cx: &Cx<DualTaskGame>, trial: TrialId, now: u64) -> u64 {
    match cx.log().get(trial) {
        Some(t) => now.saturating_sub(t.presented_at),
        None => 0,
    }
}

pub struct DualTaskGame {
    config: DualTaskConfig,
    phase: DualTaskPhase,
    countdown_left: u32,
    countdown_timer: Option<TimerHandle>,
    current: Option<StroopTrial>,
    stroop_done: usize,
    tower: Tower,
    tower_trial: Option<TrialId>,
    selected: Option<usize>,
    tower_seconds_left: u64,
    tick_timer: Option<TimerHandle>,
    timeout_timer: Option<TimerHandle>,
    running_score: u64,
}

impl DualTaskGame {
    pub fn new(config: DualTaskConfig) -> Self {
        let config = config.sanitized();
        Self {
            phase: DualTaskPhase::Setup,
            countdown_left: config.countdown_secs,
            countdown_timer: None,
            current: None,
            stroop_done: 0,
            tower: Tower::new(TOWER_DISKS),
            tower_trial: None,
            selected: None,
            tower_seconds_left: config.tower_time_limit_ms.div_ceil(1_000),
            tick_timer: None,
            timeout_timer: None,
            running_score: 0,
            config,
        }
    }

    pub fn tower(&self) -> &Tower {
        &self.tower
    }

    pub fn selected_peg(&self) -> Option<usize> {
        self.selected
    }

    pub fn stroop_completed(&self) -> usize {
        self.stroop_done
    }

    fn begin_stroop(&mut self, cx: &mut Cx<Self>) {
        cx.cancel(self.countdown_timer.take());
        advance_phase(&mut self.phase, DualTaskPhase::Stroop);
        self.present_stroop(cx);
    }

    fn present_stroop(&mut self, cx: &mut Cx<Self>) {
        let palette = self.config.palette_size;
        let word = cx.rng().index(palette);
        let ink = cx.rng().index(palette);
        let now = cx.now();
        let id = cx.log_mut().open(
            DualTaskStimulus::Stroop {
                word,
                ink,
                congruent: word == ink,
            },
            now,
        );
        trace!(trial = id, word, ink, "colour word shown");
        self.current = Some(StroopTrial { id, word, ink });
    }

    fn answer_stroop(&mut self, answer: usize, cx: &mut Cx<Self>) {
        if answer >= self.config.palette_size {
            return;
        }
        let Some(trial) = self.current.take() else {
            return;
        };
        let now = cx.now();
        let correct = answer == trial.ink;
        let rt = since_presented(cx, trial.id, now);
        let points = if correct { stroop_points(rt) } else { 0 };
        cx.log_mut().respond(trial.id, now, correct, points);
        self.running_score += points as u64;
        self.stroop_done += 1;
        debug!(
            trial = trial.id,
            correct,
            rt,
            points,
            "colour word answered"
        );

        if self.stroop_done >= self.config.stroop_trials {
            self.begin_tower(cx);
        } else {
            cx.after(self.config.inter_trial_ms, DualTaskEvent::NextStroop);
        }
    }

    fn begin_tower(&mut self, cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, DualTaskPhase::Tower);
        let now = cx.now();
        let trial = cx.log_mut().open(
            DualTaskStimulus::Tower {
                disks: self.tower.disks(),
                optimal_moves: self.tower.optimal_moves(),
            },
            now,
        );
        self.tower_trial = Some(trial);
        self.tick_timer = Some(cx.every(1_000, DualTaskEvent::TowerTick));
        let limit_ms = self.config.tower_time_limit_ms;
        self.timeout_timer = Some(cx.after(limit_ms, DualTaskEvent::TowerTimeout));
    }

    fn select_peg(&mut self, peg: usize, cx: &mut Cx<Self>) {
        if peg >= PEGS {
            return;
        }
        let Some(from) = self.selected.take() else {
            if self.tower.top(peg).is_some() {
                self.selected = Some(peg);
            }
            return;
        };
        // the selection is cleared whether or not the move was legal
        if from == peg || !self.tower.move_disk(from, peg) {
            trace!(from, to = peg, "move rejected");
            return;
        }
        trace!(from, to = peg, moves = self.tower.moves(), "disk moved");
        if self.tower.is_solved() {
            self.close_tower(true, cx);
        }
    }

    fn close_tower(&mut self, solved: bool, cx: &mut Cx<Self>) {
        cx.cancel(self.tick_timer.take());
        cx.cancel(self.timeout_timer.take());
        let Some(trial) = self.tower_trial else {
            return;
        };
        let now = cx.now();
        if solved {
            let rt = since_presented(cx, trial, now);
            let points = tower_points(self.tower.moves(), self.tower.optimal_moves(), rt);
            cx.log_mut().respond(trial, now, true, points);
            self.running_score += points as u64;
            debug!(moves = self.tower.moves(), rt, points, "tower solved");
        } else {
            cx.log_mut().expire(trial, now, false);
            debug!(moves = self.tower.moves(), "tower time limit reached");
        }
        self.tower_seconds_left = 0;
        self.selected = None;
        advance_phase(&mut self.phase, DualTaskPhase::Result);
        cx.finish();
    }

    fn pad_position(&self, index: usize) -> Position {
        let step = 600.0 / self.config.palette_size as f32;
        Position::new(100.0 + step * (index as f32 + 0.5), 450.0)
    }
}

impl Game for DualTaskGame {
    type Phase = DualTaskPhase;
    type Stimulus = DualTaskStimulus;
    type Input = DualTaskInput;
    type Event = DualTaskEvent;

    const DOMAIN: Domain = Domain::ExecutiveFunction;

    fn phase(&self) -> DualTaskPhase {
        self.phase
    }

    fn start(&mut self, cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, DualTaskPhase::Countdown);
        if self.countdown_left == 0 {
            self.begin_stroop(cx);
        } else {
            self.countdown_timer = Some(cx.every(1_000, DualTaskEvent::CountdownTick));
        }
    }

    fn on_event(&mut self, event: DualTaskEvent, cx: &mut Cx<Self>) {
        match event {
            DualTaskEvent::CountdownTick => {
                self.countdown_left = self.countdown_left.saturating_sub(1);
                if self.countdown_left == 0 {
                    self.begin_stroop(cx);
                }
            }
            DualTaskEvent::NextStroop => self.present_stroop(cx),
            DualTaskEvent::TowerTick => {
                self.tower_seconds_left = self.tower_seconds_left.saturating_sub(1);
            }
            DualTaskEvent::TowerTimeout => self.close_tower(false, cx),
        }
    }

    fn on_input(&mut self, input: DualTaskInput, cx: &mut Cx<Self>) {
        match (self.phase, input) {
            (DualTaskPhase::Stroop, DualTaskInput::ColorTap(answer)) => {
                self.answer_stroop(answer, cx)
            }
            (DualTaskPhase::Tower, DualTaskInput::PegSelect(peg)) => self.select_peg(peg, cx),
            (_, input) => trace!(?input, "input does not match the active task"),
        }
    }

    fn snapshot(&self, cx: &Cx<Self>) -> Snapshot {
        let mut snapshot = Snapshot::new(self.phase.label());
        match self.phase {
            DualTaskPhase::Stroop => {
                if let Some(trial) = self.current {
                    snapshot.stimuli.push(VisibleStimulus {
                        id: WORD_ID,
                        position: Position::new(400.0, 200.0),
                        class: VisualClass::ColorWord {
                            word: trial.word,
                            ink: trial.ink,
                        },
                    });
                }
                for index in 0..self.config.palette_size {
                    snapshot.stimuli.push(VisibleStimulus {
                        id: index as u64,
                        position: self.pad_position(index),
                        class: VisualClass::ColorPad { index, lit: false },
                    });
                }
                snapshot.trial = (self.stroop_done + 1).min(self.config.stroop_trials);
                snapshot.trial_budget = Some(self.config.stroop_trials);
            }
            DualTaskPhase::Tower | DualTaskPhase::Result => {
                snapshot.stimuli = (0..PEGS)
                    .map(|index| {
                        let disks = self.tower.peg(index).map(<[u8]>::to_vec);
                        VisibleStimulus {
                            id: index as u64,
                            position: Position::new(200.0 + 200.0 * index as f32, 400.0),
                            class: VisualClass::Peg {
                                index,
                                disks: disks.unwrap_or_default(),
                                selected: self.selected == Some(index),
                            },
                        }
                    })
                    .collect();
                snapshot.trial = cx.log().len();
                snapshot.time_remaining_ms = Some(self.tower_seconds_left * 1_000);
            }
            DualTaskPhase::Setup | DualTaskPhase::Countdown => {
                snapshot.time_remaining_ms = Some(self.countdown_left as u64 * 1_000);
            }
        }
        snapshot.running_score = self.running_score;
        snapshot
    }

    fn report(&self, log: &TrialLog<DualTaskStimulus>) -> ScoreReport {
        score_session(log, self.tower.moves())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_graph_is_linear() {
        use DualTaskPhase::*;
        assert!(Setup.can_advance_to(Countdown));
        assert!(Countdown.can_advance_to(Stroop));
        assert!(Stroop.can_advance_to(Tower));
        assert!(Tower.can_advance_to(Result));
        assert!(!Stroop.can_advance_to(Result));
        assert!(!Tower.can_advance_to(Stroop));
        assert!(!Countdown.allows_input());
        assert!(Tower.allows_input());
    }

    #[test]
    fn stimulus_serializes_with_task_tag() {
        let json = serde_json::to_string(&DualTaskStimulus::Tower {
            disks: 3,
            optimal_moves: 7,
        })
        .unwrap();
        assert!(json.contains("\"task\":\"tower\""));
    }
}
