use serde::{Deserialize, Serialize};

pub type TrialId = usize;

/// Lifecycle of one trial. Everything but `Pending` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    Pending,
    /// The player answered; `correct` says whether the answer was right.
    Responded { correct: bool },
    /// The response window elapsed. Letting a distractor pass is correct,
    /// letting a target pass is a miss.
    Expired { correct: bool },
    /// Closed by the engine itself (budget ran out) without a verdict.
    Withdrawn,
}

/// Recorded result per trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial<S> {
    pub id: TrialId,
    pub stimulus: S,
    pub presented_at: u64,
    pub response_at: Option<u64>,
    pub closed_at: Option<u64>,
    pub outcome: TrialOutcome,
    pub points: u32,
}

impl<S> Trial<S> {
    pub fn is_closed(&self) -> bool {
        self.outcome != TrialOutcome::Pending
    }

    pub fn is_correct(&self) -> bool {
        matches!(
            self.outcome,
            TrialOutcome::Responded { correct: true } | TrialOutcome::Expired { correct: true }
        )
    }

    pub fn responded(&self) -> bool {
        matches!(self.outcome, TrialOutcome::Responded { .. })
    }

    /// Response time minus presentation time; `None` when nothing was answered.
    pub fn reaction_time(&self) -> Option<u64> {
        self.response_at
            .map(|r| r.saturating_sub(self.presented_at))
    }
}

/// Append-only log of every trial an engine presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialLog<S> {
    trials: Vec<Trial<S>>,
}

impl<S> Default for TrialLog<S> {
    fn default() -> Self {
        Self { trials: Vec::new() }
    }
}

impl<S> TrialLog<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, stimulus: S, presented_at: u64) -> TrialId {
        let id = self.trials.len();
        self.trials.push(Trial {
            id,
            stimulus,
            presented_at,
            response_at: None,
            closed_at: None,
            outcome: TrialOutcome::Pending,
            points: 0,
        });
        id
    }

    fn pending_mut(&mut self, id: TrialId) -> Option<&mut Trial<S>> {
        self.trials.get_mut(id).filter(|t| !t.is_closed())
    }

    /// Closes `id` with an answer. Returns `None` if the trial is unknown or already closed.
    pub fn respond(
        &mut self,
        id: TrialId,
        at: u64,
        correct: bool,
        points: u32,
    ) -> Option<&Trial<S>> {
        let trial = self.pending_mut(id)?;
        trial.response_at = Some(at);
        trial.closed_at = Some(at);
        trial.outcome = TrialOutcome::Responded { correct };
        trial.points = points;
        Some(&*trial)
    }

    pub fn expire(&mut self, id: TrialId, at: u64, correct: bool) -> Option<&Trial<S>> {
        let trial = self.pending_mut(id)?;
        trial.closed_at = Some(at);
        trial.outcome = TrialOutcome::Expired { correct };
        Some(&*trial)
    }

    pub fn withdraw(&mut self, id: TrialId, at: u64) -> Option<&Trial<S>> {
        let trial = self.pending_mut(id)?;
        trial.closed_at = Some(at);
        trial.outcome = TrialOutcome::Withdrawn;
        Some(&*trial)
    }

    pub fn get(&self, id: TrialId) -> Option<&Trial<S>> {
        self.trials.get(id)
    }

    pub fn is_open(&self, id: TrialId) -> bool {
        self.get(id).is_some_and(|t| !t.is_closed())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trial<S>> {
        self.trials.iter()
    }

    pub fn closed(&self) -> impl Iterator<Item = &Trial<S>> {
        self.trials.iter().filter(|t| t.is_closed())
    }

    pub fn open_ids(&self) -> Vec<TrialId> {
        self.trials
            .iter()
            .filter(|t| !t.is_closed())
            .map(|t| t.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn as_slice(&self) -> &[Trial<S>] {
        &self.trials
    }

    /// Reaction times of every answered trial, in presentation order.
    pub fn reaction_times(&self) -> Vec<f64> {
        self.trials
            .iter()
            .filter_map(|t| t.reaction_time())
            .map(|rt| rt as f64)
            .collect()
    }

    pub fn total_points(&self) -> u64 {
        self.trials.iter().map(|t| t.points as u64).sum()
    }
}
