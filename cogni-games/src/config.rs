//! Difficulty tables for the four games.
//!
//! Every struct deserializes with per-field defaults, so a config file only
//! needs the values it overrides. Out-of-range values are never an error:
//! [`GamesConfig::sanitized`] clamps them to the nearest usable value.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

fn clamp_field<T: PartialOrd + Copy + std::fmt::Debug>(name: &str, value: T, lo: T, hi: T) -> T {
    let clamped = if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    };
    if clamped != value {
        warn!(field = name, ?value, ?clamped, "config value out of range, clamped");
    }
    clamped
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub palette_size: usize,
    pub rounds: usize,
    pub lives: u8,
    pub initial_span: usize,
    pub min_span: usize,
    pub max_span: usize,
    pub lead_in_ms: u64,
    pub flash_ms: u64,
    pub gap_ms: u64,
    pub feedback_ms: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            palette_size: 4,
            rounds: 15,
            lives: 3,
            initial_span: 3,
            min_span: 2,
            max_span: 8,
            lead_in_ms: 1_000,
            flash_ms: 600,
            gap_ms: 250,
            feedback_ms: 1_000,
        }
    }
}

impl SequenceConfig {
    pub fn sanitized(mut self) -> Self {
        self.palette_size = clamp_field("sequence.palette_size", self.palette_size, 2, 16);
        self.rounds = clamp_field("sequence.rounds", self.rounds, 1, 100);
        self.lives = clamp_field("sequence.lives", self.lives, 1, 10);
        self.min_span = clamp_field("sequence.min_span", self.min_span, 1, 32);
        self.max_span = clamp_field("sequence.max_span", self.max_span, self.min_span, 32);
        self.initial_span = clamp_field(
            "sequence.initial_span",
            self.initial_span,
            self.min_span,
            self.max_span,
        );
        self.flash_ms = clamp_field("sequence.flash_ms", self.flash_ms, 1, 10_000);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilanceConfig {
    pub duration_ms: u64,
    pub countdown_secs: u32,
    /// Range the base spawn interval is drawn from, before accuracy scaling.
    pub spawn_interval_ms: (u64, u64),
    pub target_probability: f64,
    pub stimulus_lifetime_ms: u64,
    pub min_separation: f32,
    pub placement_attempts: u32,
    pub arena: (f32, f32),
    pub margin: f32,
    /// Number of equal time slices used for the vigilance-decrement measure.
    pub decrement_buckets: usize,
}

impl Default for VigilanceConfig {
    fn default() -> Self {
        Self {
            duration_ms: 120_000,
            countdown_secs: 3,
            spawn_interval_ms: (800, 1_600),
            target_probability: 0.25,
            stimulus_lifetime_ms: 2_500,
            min_separation: 80.0,
            placement_attempts: 10,
            arena: (800.0, 600.0),
            margin: 40.0,
            decrement_buckets: 4,
        }
    }
}

impl VigilanceConfig {
    pub fn sanitized(mut self) -> Self {
        self.duration_ms = clamp_field("vigilance.duration_ms", self.duration_ms, 1_000, 3_600_000);
        let (lo, hi) = self.spawn_interval_ms;
        let lo = clamp_field("vigilance.spawn_interval_ms.0", lo, 50, 60_000);
        let hi = clamp_field("vigilance.spawn_interval_ms.1", hi, lo, 60_000);
        self.spawn_interval_ms = (lo, hi);
        self.target_probability = clamp_field(
            "vigilance.target_probability",
            self.target_probability,
            0.0,
            1.0,
        );
        self.stimulus_lifetime_ms = clamp_field(
            "vigilance.stimulus_lifetime_ms",
            self.stimulus_lifetime_ms,
            50,
            60_000,
        );
        self.min_separation = clamp_field(
            "vigilance.min_separation",
            self.min_separation,
            0.0,
            1_000.0,
        );
        self.placement_attempts = clamp_field(
            "vigilance.placement_attempts",
            self.placement_attempts,
            1,
            1_000,
        );
        self.arena.0 = clamp_field("vigilance.arena.0", self.arena.0, 100.0, 10_000.0);
        self.arena.1 = clamp_field("vigilance.arena.1", self.arena.1, 100.0, 10_000.0);
        let max_margin = self.arena.0.min(self.arena.1) / 4.0;
        self.margin = clamp_field("vigilance.margin", self.margin, 0.0, max_margin);
        self.decrement_buckets =
            clamp_field("vigilance.decrement_buckets", self.decrement_buckets, 2, 20);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualTaskConfig {
    pub palette_size: usize,
    pub stroop_trials: usize,
    pub countdown_secs: u32,
    pub inter_trial_ms: u64,
    pub tower_time_limit_ms: u64,
}

impl Default for DualTaskConfig {
    fn default() -> Self {
        Self {
            palette_size: 4,
            stroop_trials: 30,
            countdown_secs: 3,
            inter_trial_ms: 500,
            tower_time_limit_ms: 180_000,
        }
    }
}

impl DualTaskConfig {
    pub fn sanitized(mut self) -> Self {
        self.palette_size = clamp_field("dual_task.palette_size", self.palette_size, 2, 16);
        self.stroop_trials = clamp_field("dual_task.stroop_trials", self.stroop_trials, 1, 500);
        self.tower_time_limit_ms = clamp_field(
            "dual_task.tower_time_limit_ms",
            self.tower_time_limit_ms,
            1_000,
            3_600_000,
        );
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub trials: usize,
    pub countdown_secs: u32,
    /// Rotation angles in degrees. Non-right angles are snapped to the
    /// nearest quarter turn.
    pub angle_pool: Vec<u16>,
    pub mirror_task_probability: f64,
    pub response_window_ms: u64,
    pub feedback_ms: u64,
    pub distractor_attempts: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            trials: 20,
            countdown_secs: 3,
            angle_pool: vec![60, 90, 120, 150, 180, 210, 240, 270, 300],
            mirror_task_probability: 0.3,
            response_window_ms: 15_000,
            feedback_ms: 800,
            distractor_attempts: 20,
        }
    }
}

impl RotationConfig {
    pub fn sanitized(mut self) -> Self {
        self.trials = clamp_field("rotation.trials", self.trials, 1, 500);
        self.angle_pool.retain(|a| *a < 360);
        if self.angle_pool.is_empty() {
            warn!("rotation.angle_pool empty, using defaults");
            self.angle_pool = RotationConfig::default().angle_pool;
        }
        self.mirror_task_probability = clamp_field(
            "rotation.mirror_task_probability",
            self.mirror_task_probability,
            0.0,
            1.0,
        );
        self.response_window_ms = clamp_field(
            "rotation.response_window_ms",
            self.response_window_ms,
            500,
            600_000,
        );
        self.distractor_attempts = clamp_field(
            "rotation.distractor_attempts",
            self.distractor_attempts,
            1,
            1_000,
        );
        self
    }
}

/// One table per game, as loaded by a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub sequence: SequenceConfig,
    pub vigilance: VigilanceConfig,
    pub dual_task: DualTaskConfig,
    pub rotation: RotationConfig,
}

impl GamesConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GamesConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn sanitized(self) -> Self {
        Self {
            sequence: self.sequence.sanitized(),
            vigilance: self.vigilance.sanitized(),
            dual_task: self.dual_task.sanitized(),
            rotation: self.rotation.sanitized(),
        }
    }
}
