//! Colour-sequence recall with an adaptive span.
//!
//! Each round flashes a sequence of palette colours, then waits for the
//! player to tap it back. A wrong tap costs a life and the next round
//! replays the same sequence. Every round played counts against the budget.

mod scoring;

pub use scoring::{round_score, score_session};

use cogni_core::{
    Domain, GameRng, Phase, Position, ScoreReport, Snapshot, TrialId, TrialLog, VisibleStimulus,
    VisualClass,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adaptive::StreakPolicy;
use crate::config::SequenceConfig;
use crate::engine::{Cx, Game, advance_phase};

#[derive(Copy, Debug, Clone, PartialEq, Default)]
pub enum SequencePhase {
    #[default]
    Setup,
    Showing,
    Playing,
    Result,
}

impl Phase for SequencePhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Playing)
    }

    fn can_advance_to(&self, next: Self) -> bool {
        use SequencePhase::*;
        matches!(
            (self, next),
            (Setup, Showing) | (Showing, Playing) | (Playing, Showing) | (Playing, Result)
        )
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Result)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Showing => "showing",
            Self::Playing => "playing",
            Self::Result => "result",
        }
    }
}

/// One round of the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRound {
    /// 0-based index within the round budget.
    pub round: usize,
    pub span: usize,
    pub sequence: Vec<usize>,
    /// Set when the round replays the sequence of a failed one.
    pub replay: bool,
}

#[derive(Debug)]
pub enum SequenceInput {
    ColorTap(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    Flash(usize),
    Dim(usize),
    NextRound,
}

/// Draws `len` colour indices with no immediate repeats once the palette has more than two colours.
pub fn generate_sequence(rng: &mut GameRng, len: usize, palette: usize) -> Vec<usize> {
    let mut seq: Vec<usize> = Vec::with_capacity(len);
    for _ in 0..len {
        let next = match seq.last() {
            Some(&prev) if palette > 2 => {
                let c = rng.index(palette - 1);
                if c >= prev { c + 1 } else { c }
            }
            _ => rng.index(palette),
        };
        seq.push(next);
    }
    seq
}

pub struct SequenceGame {
    config: SequenceConfig,
    phase: SequencePhase,
    policy: StreakPolicy,
    sequence: Vec<usize>,
    regenerate: bool,
    replay: bool,
    lit: Option<usize>,
    input_pos: usize,
    accepting: bool,
    trial: Option<TrialId>,
    rounds_played: usize,
    rounds_completed: usize,
    lives: u8,
    errors: u32,
    max_span: usize,
    running_score: u64,
}

impl SequenceGame {
    pub fn new(config: SequenceConfig) -> Self {
        let config = config.sanitized();
        let policy = StreakPolicy::new(config.initial_span, config.min_span, config.max_span, 2);
        Self {
            phase: SequencePhase::Setup,
            max_span: policy.level(),
            policy,
            sequence: Vec::new(),
            regenerate: true,
            replay: false,
            lit: None,
            input_pos: 0,
            accepting: false,
            trial: None,
            rounds_played: 0,
            rounds_completed: 0,
            lives: config.lives,
            errors: 0,
            running_score: 0,
            config,
        }
    }

    pub fn span(&self) -> usize {
        self.policy.level()
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Rounds answered, right or wrong.
    pub fn rounds_played(&self) -> usize {
        self.rounds_played
    }

    /// Rounds answered correctly.
    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// The sequence currently being shown or replayed.
    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    /// True while the player is expected to tap the sequence back.
    pub fn awaiting_input(&self) -> bool {
        self.accepting
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    fn begin_round(&mut self, cx: &mut Cx<Self>) {
        self.replay = !self.regenerate;
        if self.regenerate {
            self.sequence = generate_sequence(cx.rng(), self.span(), self.config.palette_size);
            self.regenerate = false;
        }
        self.input_pos = 0;
        self.lit = None;
        advance_phase(&mut self.phase, SequencePhase::Showing);
        debug!(
            round = self.rounds_played,
            span = self.span(),
            replay = self.replay,
            "showing sequence"
        );
        cx.after(self.config.lead_in_ms, SequenceEvent::Flash(0));
    }

    fn begin_input(&mut self, cx: &mut Cx<Self>) {
        advance_phase(&mut self.phase, SequencePhase::Playing);
        let stimulus = SequenceRound {
            round: self.rounds_played,
            span: self.sequence.len(),
            sequence: self.sequence.clone(),
            replay: self.replay,
        };
        let now = cx.now();
        self.trial = Some(cx.log_mut().open(stimulus, now));
        self.accepting = true;
    }

    fn close_round(&mut self, correct: bool, cx: &mut Cx<Self>) {
        let Some(id) = self.trial.take() else {
            return;
        };
        self.accepting = false;
        let now = cx.now();
        let presented = cx.log().get(id).map_or(now, |t| t.presented_at);
        let span_before = self.span();
        self.rounds_played += 1;

        if correct {
            let points = round_score(
                self.sequence.len(),
                now.saturating_sub(presented),
                self.errors,
                span_before as i64 - self.config.initial_span as i64,
            );
            cx.log_mut().respond(id, now, true, points);
            self.running_score += points as u64;
            self.rounds_completed += 1;
        } else {
            cx.log_mut().respond(id, now, false, 0);
            self.errors += 1;
            self.lives = self.lives.saturating_sub(1);
        }

        if let Some(adj) = self.policy.record(correct) {
            debug!(?adj, span = self.span(), "span adjusted");
        }
        self.max_span = self.max_span.max(self.span());
        // fresh sequence after a success or a span change; otherwise the same one is replayed
        self.regenerate = correct || self.span() != span_before;

        if self.lives == 0 || self.rounds_played >= self.config.rounds {
            advance_phase(&mut self.phase, SequencePhase::Result);
            cx.finish();
        } else {
            cx.after(self.config.feedback_ms, SequenceEvent::NextRound);
        }
    }

    fn pad_position(&self, index: usize) -> Position {
        let side = (self.config.palette_size as f32).sqrt().ceil() as usize;
        let cols = side.max(2);
        let (col, row) = (index % cols, index / cols);
        Position::new(200.0 + col as f32 * 160.0, 150.0 + row as f32 * 160.0)
    }
}

impl Game for SequenceGame {
    type Phase = SequencePhase;
    type Stimulus = SequenceRound;
    type Input = SequenceInput;
    type Event = SequenceEvent;

    const DOMAIN: Domain = Domain::Memory;

    fn phase(&self) -> SequencePhase {
        self.phase
    }

    fn start(&mut self, cx: &mut Cx<Self>) {
        self.begin_round(cx);
    }

    fn on_event(&mut self, event: SequenceEvent, cx: &mut Cx<Self>) {
        match event {
            SequenceEvent::Flash(i) => {
                self.lit = self.sequence.get(i).copied();
                cx.after(self.config.flash_ms, SequenceEvent::Dim(i));
            }
            SequenceEvent::Dim(i) => {
                self.lit = None;
                if i + 1 < self.sequence.len() {
                    cx.after(self.config.gap_ms, SequenceEvent::Flash(i + 1));
                } else {
                    self.begin_input(cx);
                }
            }
            SequenceEvent::NextRound => self.begin_round(cx),
        }
    }

    fn on_input(&mut self, input: SequenceInput, cx: &mut Cx<Self>) {
        let SequenceInput::ColorTap(color) = input;
        if !self.accepting || color >= self.config.palette_size {
            return;
        }
        if self.sequence.get(self.input_pos) == Some(&color) {
            self.input_pos += 1;
            if self.input_pos == self.sequence.len() {
                self.close_round(true, cx);
            }
        } else {
            self.close_round(false, cx);
        }
    }

    fn snapshot(&self, _cx: &Cx<Self>) -> Snapshot {
        let mut snapshot = Snapshot::new(self.phase.label());
        snapshot.stimuli = (0..self.config.palette_size)
            .map(|index| VisibleStimulus {
                id: index as u64,
                position: self.pad_position(index),
                class: VisualClass::ColorPad {
                    index,
                    lit: self.lit == Some(index),
                },
            })
            .collect();
        snapshot.trial = (self.rounds_played + 1).min(self.config.rounds);
        snapshot.trial_budget = Some(self.config.rounds);
        snapshot.lives = Some(self.lives);
        snapshot.running_score = self.running_score;
        snapshot
    }

    fn report(&self, log: &TrialLog<SequenceRound>) -> ScoreReport {
        score_session(
            log,
            &self.config,
            self.max_span,
            self.lives,
            self.policy.hit_rate(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_never_repeat_adjacent_colours() {
        let mut rng = GameRng::new(9);
        for len in 2..=8 {
            let seq = generate_sequence(&mut rng, len, 4);
            assert_eq!(seq.len(), len);
            assert!(seq.iter().all(|c| *c < 4));
            assert!(seq.windows(2).all(|w| w[0] != w[1]), "{seq:?}");
        }
    }

    #[test]
    fn two_colour_palette_may_repeat() {
        let mut rng = GameRng::new(3);
        let seq = generate_sequence(&mut rng, 64, 2);
        assert!(seq.iter().all(|c| *c < 2));
        assert!(seq.windows(2).any(|w| w[0] == w[1]));
    }

    #[test]
    fn phase_graph() {
        use SequencePhase::*;
        assert!(Setup.can_advance_to(Showing));
        assert!(Playing.can_advance_to(Showing));
        assert!(!Setup.can_advance_to(Playing));
        assert!(!Showing.can_advance_to(Result));
        assert!(!Result.can_advance_to(Showing));
        assert!(Playing.allows_input());
        assert!(!Showing.allows_input());
    }
}
