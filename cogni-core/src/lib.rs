pub mod phase;
pub mod report;
pub mod rng;
pub mod score;
pub mod stimulus;
pub mod trial;

pub use phase::Phase;
pub use report::{Domain, ScoreReport};
pub use rng::GameRng;
pub use score::{WeightedScore, clamp_score, coefficient_of_variation, mean, percent, std_dev};
pub use stimulus::{Position, ShapeRole, Snapshot, VisibleStimulus, VisualClass};
pub use trial::{Trial, TrialId, TrialLog, TrialOutcome};
