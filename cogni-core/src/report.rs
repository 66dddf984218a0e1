use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::score::clamp_score;

/// Cognitive domain a game measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Memory,
    Attention,
    ExecutiveFunction,
    Visuospatial,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Memory => "memory",
            Domain::Attention => "attention",
            Domain::ExecutiveFunction => "executive_function",
            Domain::Visuospatial => "visuospatial",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one finished engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub domain: Domain,
    /// Overall score, always within `0..=100`.
    pub score: u8,
    /// Percentage of trials answered correctly.
    pub accuracy: f64,
    pub mean_reaction_ms: Option<f64>,
    pub label: String,
    pub trials: usize,
    pub metrics: BTreeMap<String, f64>,
}

impl ScoreReport {
    /// `score` and `accuracy` are clamped to `[0, 100]`; the score is rounded.
    pub fn new(
        domain: Domain,
        score: f64,
        accuracy: f64,
        mean_reaction_ms: Option<f64>,
        label: impl Into<String>,
        trials: usize,
    ) -> Self {
        Self {
            domain,
            score: clamp_score(score).round() as u8,
            accuracy: clamp_score(accuracy),
            mean_reaction_ms: mean_reaction_ms.filter(|v| v.is_finite()),
            label: label.into(),
            trials,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}
