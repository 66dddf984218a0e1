//! Simulated players. Each one sees only the snapshot a UI would draw and
//! answers with timestamped inputs, so the engines are exercised exactly as
//! a real front end would drive them.

use std::collections::{HashSet, VecDeque};

use cogni_core::{GameRng, ShapeRole, Snapshot, VisualClass};
use cogni_games::dual_task::WORD_ID;
use cogni_games::rotation::{Shape, angular_distance, quarter_turns};
use cogni_games::{DualTaskInput, Game, RotationInput, SequenceInput, VigilanceInput};
use cogni_games::{DualTaskGame, RotationGame, SequenceGame, VigilanceGame};
use tracing::trace;

pub trait Player<G: Game> {
    /// Inputs to send at `now`, given the frame currently on screen.
    fn observe(&mut self, snapshot: &Snapshot, now: u64) -> Vec<G::Input>;
}

/// Linear blend from a weak player's value to a strong one's.
fn by_skill(skill: f64, weak: f64, strong: f64) -> f64 {
    weak + (strong - weak) * skill.clamp(0.0, 1.0)
}

/// Reaction delay with ±20% jitter.
fn jittered(rng: &mut GameRng, base_ms: f64) -> u64 {
    let factor = rng.uniform(0.8, 1.2) as f64;
    (base_ms * factor).max(1.0).round() as u64
}

pub struct SequencePlayer {
    skill: f64,
    rng: GameRng,
    last_phase: &'static str,
    last_lit: Option<usize>,
    palette: usize,
    seen: Vec<usize>,
    queue: VecDeque<usize>,
    next_tap_at: u64,
}

impl SequencePlayer {
    pub fn new(skill: f64, seed: u64) -> Self {
        Self {
            skill,
            rng: GameRng::new(seed),
            last_phase: "",
            last_lit: None,
            palette: 1,
            seen: Vec::new(),
            queue: VecDeque::new(),
            next_tap_at: 0,
        }
    }

    /// Recalls what was shown, forgetting more on longer spans.
    fn recall(&mut self) -> VecDeque<usize> {
        let slip = by_skill(self.skill, 0.25, 0.02) * self.seen.len() as f64 / 4.0;
        let palette = self.palette;
        self.seen
            .iter()
            .map(|&c| {
                if self.rng.chance(slip) {
                    (c + 1) % palette
                } else {
                    c
                }
            })
            .collect()
    }
}

impl Player<SequenceGame> for SequencePlayer {
    fn observe(&mut self, snapshot: &Snapshot, now: u64) -> Vec<SequenceInput> {
        let lit = snapshot.stimuli.iter().find_map(|s| match s.class {
            VisualClass::ColorPad { index, lit: true } => Some(index),
            _ => None,
        });
        let phase = snapshot.phase;
        self.palette = snapshot.stimuli.len().max(1);
        if phase == "showing" && self.last_phase != "showing" {
            self.seen.clear();
            self.queue.clear();
        }
        if phase == "showing" && lit.is_some() && self.last_lit.is_none() {
            self.seen.extend(lit);
        }
        if phase == "playing" && self.last_phase == "showing" {
            self.queue = self.recall();
            self.next_tap_at = now + jittered(&mut self.rng, by_skill(self.skill, 900.0, 400.0));
        }
        self.last_phase = phase;
        self.last_lit = lit;

        if phase != "playing" || now < self.next_tap_at {
            return Vec::new();
        }
        let Some(color) = self.queue.pop_front() else {
            return Vec::new();
        };
        self.next_tap_at = now + jittered(&mut self.rng, by_skill(self.skill, 900.0, 400.0));
        vec![SequenceInput::ColorTap(color)]
    }
}

pub struct VigilancePlayer {
    skill: f64,
    rng: GameRng,
    handled: HashSet<u64>,
    planned: Vec<(u64, u64)>,
}

impl VigilancePlayer {
    pub fn new(skill: f64, seed: u64) -> Self {
        Self {
            skill,
            rng: GameRng::new(seed),
            handled: HashSet::new(),
            planned: Vec::new(),
        }
    }
}

impl Player<VigilanceGame> for VigilancePlayer {
    fn observe(&mut self, snapshot: &Snapshot, now: u64) -> Vec<VigilanceInput> {
        if snapshot.paused {
            return Vec::new();
        }
        for s in &snapshot.stimuli {
            if !self.handled.insert(s.id) {
                continue;
            }
            let tap = match s.class {
                VisualClass::Target => !self.rng.chance(by_skill(self.skill, 0.3, 0.02)),
                VisualClass::Distractor => self.rng.chance(by_skill(self.skill, 0.3, 0.01)),
                _ => false,
            };
            if tap {
                let rt = jittered(&mut self.rng, by_skill(self.skill, 1_200.0, 380.0));
                self.planned.push((now + rt, s.id));
            }
        }
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.planned)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.planned = later;
        due.into_iter()
            .filter(|(_, id)| snapshot.find(*id).is_some())
            .map(|(_, id)| VigilanceInput::Tap(id))
            .collect()
    }
}

/// Moves that solve a fresh three-peg tower, as (from, to).
fn tower_plan(disks: u8, from: usize, to: usize, via: usize, plan: &mut VecDeque<(usize, usize)>) {
    if disks == 0 {
        return;
    }
    tower_plan(disks - 1, from, via, to, plan);
    plan.push_back((from, to));
    tower_plan(disks - 1, via, to, from, plan);
}

pub struct DualTaskPlayer {
    skill: f64,
    rng: GameRng,
    word_pending: Option<(u64, usize)>,
    word_visible: bool,
    taps: VecDeque<usize>,
    planned_tower: bool,
    next_tap_at: u64,
}

impl DualTaskPlayer {
    pub fn new(skill: f64, seed: u64) -> Self {
        Self {
            skill,
            rng: GameRng::new(seed),
            word_pending: None,
            word_visible: false,
            taps: VecDeque::new(),
            planned_tower: false,
            next_tap_at: 0,
        }
    }

    fn plan_tower(&mut self, disks: u8) {
        let mut plan = VecDeque::new();
        tower_plan(disks, 0, 2, 1, &mut plan);
        let detour = by_skill(self.skill, 0.35, 0.0);
        for (from, to) in plan {
            if self.rng.chance(detour) {
                // wander: move there and straight back
                self.taps.extend([from, to, to, from]);
            }
            self.taps.extend([from, to]);
        }
    }

    fn stroop(&mut self, snapshot: &Snapshot, now: u64) -> Vec<DualTaskInput> {
        let word = snapshot.find(WORD_ID).and_then(|s| match s.class {
            VisualClass::ColorWord { word, ink } => Some((word, ink)),
            _ => None,
        });
        let Some((word, ink)) = word else {
            self.word_visible = false;
            self.word_pending = None;
            return Vec::new();
        };
        if !self.word_visible {
            self.word_visible = true;
            let mut rt = by_skill(self.skill, 2_200.0, 700.0);
            if word != ink {
                rt += 150.0;
            }
            let interference = word != ink && self.rng.chance(by_skill(self.skill, 0.35, 0.02));
            let answer = if interference { word } else { ink };
            self.word_pending = Some((now + jittered(&mut self.rng, rt), answer));
        }
        match self.word_pending {
            Some((at, answer)) if at <= now => {
                self.word_pending = None;
                vec![DualTaskInput::ColorTap(answer)]
            }
            _ => Vec::new(),
        }
    }
}

impl Player<DualTaskGame> for DualTaskPlayer {
    fn observe(&mut self, snapshot: &Snapshot, now: u64) -> Vec<DualTaskInput> {
        match snapshot.phase {
            "stroop" => self.stroop(snapshot, now),
            "tower" => {
                if !self.planned_tower {
                    let disks = snapshot
                        .stimuli
                        .iter()
                        .filter_map(|s| match &s.class {
                            VisualClass::Peg { disks, .. } => Some(disks.len() as u8),
                            _ => None,
                        })
                        .sum();
                    self.plan_tower(disks);
                    self.planned_tower = true;
                    let think = by_skill(self.skill, 4_000.0, 1_200.0);
                    self.next_tap_at = now + jittered(&mut self.rng, think);
                    trace!(taps = self.taps.len(), "tower plan ready");
                }
                if now < self.next_tap_at {
                    return Vec::new();
                }
                let Some(peg) = self.taps.pop_front() else {
                    return Vec::new();
                };
                let gap = by_skill(self.skill, 1_500.0, 450.0);
                self.next_tap_at = now + jittered(&mut self.rng, gap);
                vec![DualTaskInput::PegSelect(peg)]
            }
            _ => Vec::new(),
        }
    }
}

pub struct RotationPlayer {
    skill: f64,
    rng: GameRng,
    /// Trial number the current decision belongs to.
    decided: Option<usize>,
    pending: Option<(u64, usize)>,
}

impl RotationPlayer {
    pub fn new(skill: f64, seed: u64) -> Self {
        Self {
            skill,
            rng: GameRng::new(seed),
            decided: None,
            pending: None,
        }
    }

    fn decide(
        &mut self,
        reference: &Shape,
        rotate_by: u16,
        options: &[(usize, Shape)],
    ) -> Option<usize> {
        let target = reference.rotated(quarter_turns(rotate_by));
        let correct = options
            .iter()
            .find(|(_, s)| *s == target)
            .map(|(i, _)| *i)?;
        if !self.rng.chance(by_skill(self.skill, 0.35, 0.05)) {
            return Some(correct);
        }
        // confusions go to the mirror image when one is offered
        let mirror = target.mirrored();
        if let Some((i, _)) = options.iter().find(|(_, s)| *s == mirror) {
            return Some(*i);
        }
        let wrong: Vec<usize> = options
            .iter()
            .map(|(i, _)| *i)
            .filter(|i| *i != correct)
            .collect();
        self.rng.choose(&wrong).copied().or(Some(correct))
    }
}

impl Player<RotationGame> for RotationPlayer {
    fn observe(&mut self, snapshot: &Snapshot, now: u64) -> Vec<RotationInput> {
        let mut reference = None;
        let mut options = Vec::new();
        for s in &snapshot.stimuli {
            if let VisualClass::Shape { cells, role } = &s.class {
                match role {
                    ShapeRole::Reference { rotate_by } => {
                        reference = Some((cells.clone(), *rotate_by))
                    }
                    ShapeRole::Option(i) => options.push((*i, Shape::new(cells.iter().copied()))),
                }
            }
        }
        let Some((cells, rotate_by)) = reference else {
            self.decided = None;
            self.pending = None;
            return Vec::new();
        };
        if self.decided != Some(snapshot.trial) {
            let shape = Shape::new(cells.iter().copied());
            if let Some(choice) = self.decide(&shape, rotate_by, &options) {
                let base = by_skill(self.skill, 5_000.0, 1_400.0);
                let rt = base * (1.0 + angular_distance(rotate_by) as f64 / 180.0);
                self.pending = Some((now + jittered(&mut self.rng, rt), choice));
            }
            self.decided = Some(snapshot.trial);
        }
        match self.pending {
            Some((at, choice)) if at <= now => {
                self.pending = None;
                vec![RotationInput::OptionSelect(choice)]
            }
            _ => Vec::new(),
        }
    }
}
