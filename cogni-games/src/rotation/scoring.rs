use cogni_core::{
    Domain, ScoreReport, Trial, TrialLog, WeightedScore, coefficient_of_variation, mean, percent,
};

use super::RotationStimulus;
use super::shape::angular_distance;

const TIME_BONUS_CAP: f64 = 150.0;
const NON_RIGHT_BONUS: u32 = 30;
const MIRROR_TASK_BONUS: u32 = 20;

fn optimal_ms(complexity: u8) -> f64 {
    2_000.0 + complexity as f64 * 1_000.0
}

/// Points for a correct answer.
pub fn trial_points(complexity: u8, reaction_ms: u64, non_right: bool, mirror_task: bool) -> u32 {
    let late_ms = reaction_ms as f64 - optimal_ms(complexity);
    let over = (late_ms / 50.0).max(0.0);
    let time_bonus = (TIME_BONUS_CAP - over).max(0.0);
    let mut points = 100.0 + complexity as f64 * 25.0 + time_bonus;
    if non_right {
        points += NON_RIGHT_BONUS as f64;
    }
    if mirror_task {
        points += MIRROR_TASK_BONUS as f64;
    }
    points.round() as u32
}

/// Best achievable points for a trial: instant correct answer.
fn max_points(stimulus: &RotationStimulus) -> u32 {
    trial_points(
        stimulus.complexity,
        0,
        stimulus.angle % 90 != 0,
        stimulus.mirror_task,
    )
}

/// Reaction time scaled down by how far the shape had to be turned.
fn angle_normalised_rt(trial: &Trial<RotationStimulus>) -> Option<f64> {
    let rt = trial.reaction_time()? as f64;
    let turn = 1.0 + angular_distance(trial.stimulus.angle) as f64 / 180.0;
    Some(rt / turn)
}

pub fn score_session(log: &TrialLog<RotationStimulus>, mirror_errors: usize) -> ScoreReport {
    let closed: Vec<&Trial<RotationStimulus>> = log.closed().collect();
    let correct: Vec<&Trial<RotationStimulus>> = closed
        .iter()
        .copied()
        .filter(|t| t.is_correct())
        .collect();
    let accuracy = percent(correct.len(), closed.len()).unwrap_or(0.0);

    let mirror_trials = closed
        .iter()
        .filter(|t| t.stimulus.has_mirror_distractor)
        .count();
    let mirror_correct = mirror_trials.saturating_sub(mirror_errors);
    let mirror_discrimination = percent(mirror_correct, mirror_trials).unwrap_or(accuracy);

    let normalised: Vec<f64> = correct
        .iter()
        .copied()
        .filter_map(angle_normalised_rt)
        .collect();
    let speed = mean(&normalised)
        .map(|ms| 100.0 - (ms - 1_000.0) / 50.0)
        .unwrap_or(0.0);

    let total_complexity: usize = closed.iter().map(|t| t.stimulus.complexity as usize).sum();
    let solved_complexity: usize = correct.iter().map(|t| t.stimulus.complexity as usize).sum();
    let capacity = percent(solved_complexity, total_complexity).unwrap_or(0.0);

    let rts: Vec<f64> = correct
        .iter()
        .filter_map(|t| t.reaction_time())
        .map(|rt| rt as f64)
        .collect();
    let consistency = coefficient_of_variation(&rts)
        .map(|cv| 100.0 - cv * 100.0)
        .unwrap_or(0.0);

    let spatial: Vec<f64> = closed
        .iter()
        .map(|t| t.points as f64 / max_points(&t.stimulus).max(1) as f64 * 100.0)
        .collect();
    let spatial_average = mean(&spatial).unwrap_or(0.0);

    let blend = WeightedScore::new()
        .component("accuracy", 0.25, accuracy)
        .component("mirror_discrimination", 0.20, mirror_discrimination)
        .component("rotation_speed", 0.20, speed)
        .component("capacity", 0.15, capacity)
        .component("consistency", 0.10, consistency)
        .component("spatial_average", 0.10, spatial_average);

    let mut report = ScoreReport::new(
        Domain::Visuospatial,
        blend.total(),
        accuracy,
        mean(&rts),
        format!("{}/{} rotations", correct.len(), closed.len()),
        log.len(),
    )
    .with_metric("mirror_errors", mirror_errors as f64)
    .with_metric("mirror_trials", mirror_trials as f64)
    .with_metric("total_points", log.total_points() as f64);
    for (name, value) in blend.components() {
        report = report.with_metric(&format!("{name}_score"), value);
    }
    report
}
