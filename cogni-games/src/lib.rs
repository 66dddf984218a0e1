pub mod adaptive;
pub mod config;
pub mod dual_task;
pub mod engine;
pub mod error;
pub mod rotation;
pub mod sequence;
pub mod vigilance;
pub use adaptive::{Adjustment, StreakPolicy};
pub use config::{DualTaskConfig, GamesConfig, RotationConfig, SequenceConfig, VigilanceConfig};
pub use dual_task::{DualTaskGame, DualTaskInput, DualTaskPhase};
pub use engine::{Context, Cx, Engine, Game, Status};
pub use error::ConfigError;
pub use rotation::{RotationGame, RotationInput, RotationPhase};
pub use sequence::{SequenceGame, SequenceInput, SequencePhase};
pub use vigilance::{VigilanceGame, VigilanceInput, VigilancePhase};
