use cogni_core::{Domain, ScoreReport, Trial, TrialLog, clamp_score, mean, percent};

use super::DualTaskStimulus;

/// Points for a correct colour-word answer.
pub fn stroop_points(reaction_ms: u64) -> u32 {
    let time_bonus = (150.0 - reaction_ms as f64 / 20.0).max(0.0);
    (100.0 + time_bonus).round() as u32
}

/// Puzzle points: move efficiency plus a time bonus, each floored at zero.
pub fn tower_points(moves: u32, optimal: u32, reaction_ms: u64) -> u32 {
    let extra = moves as i64 - optimal as i64;
    let efficiency = (100 - extra * 10).max(0) as f64;
    let time_bonus = (500.0 - reaction_ms as f64 / 100.0).max(0.0);
    (efficiency + time_bonus).round() as u32
}

/// Whether a colour-word trial showed a matching word and ink; `None` for the puzzle.
fn congruence(t: &Trial<DualTaskStimulus>) -> Option<bool> {
    match t.stimulus {
        DualTaskStimulus::Stroop { congruent, .. } => Some(congruent),
        DualTaskStimulus::Tower { .. } => None,
    }
}

fn mean_rt<'a>(trials: impl Iterator<Item = &'a Trial<DualTaskStimulus>>) -> Option<f64> {
    let rts: Vec<f64> = trials
        .filter_map(|t| t.reaction_time())
        .map(|rt| rt as f64)
        .collect();
    mean(&rts)
}

pub fn score_session(log: &TrialLog<DualTaskStimulus>, tower_moves: u32) -> ScoreReport {
    let closed = log.closed().count();
    let correct = log.iter().filter(|t| t.is_correct()).count();
    let accuracy = percent(correct, closed).unwrap_or(0.0);

    // stroop answers and the puzzle solve time both count
    let mean_reaction = mean(&log.reaction_times());
    let speed = mean_reaction
        .map(|ms| (100.0 - ms / 40.0).max(0.0))
        .unwrap_or(0.0);
    let score = clamp_score((accuracy * 0.6 + speed * 0.4).round());

    let stroop: Vec<_> = log.iter().filter(|t| congruence(t).is_some()).collect();
    let correct_stroop = || stroop.iter().copied().filter(|t| t.is_correct());
    let stroop_correct = correct_stroop().count();
    let congruent_rt = mean_rt(correct_stroop().filter(|t| congruence(t) == Some(true)));
    let incongruent_rt = mean_rt(correct_stroop().filter(|t| congruence(t) == Some(false)));
    let stroop_accuracy = percent(stroop_correct, stroop.len()).unwrap_or(0.0);
    let stroop_points: f64 = stroop.iter().map(|t| t.points as f64).sum();

    let tower = log
        .iter()
        .find(|t| matches!(t.stimulus, DualTaskStimulus::Tower { .. }));
    let tower_solved = if tower.is_some_and(|t| t.is_correct()) {
        1.0
    } else {
        0.0
    };

    let mut report = ScoreReport::new(
        Domain::ExecutiveFunction,
        score,
        accuracy,
        mean_reaction,
        format!("stroop {} + tower", stroop.len()),
        log.len(),
    )
    .with_metric("speed_score", speed)
    .with_metric("stroop_accuracy", stroop_accuracy)
    .with_metric("stroop_points", stroop_points)
    .with_metric("tower_solved", tower_solved)
    .with_metric("tower_moves", tower_moves as f64)
    .with_metric("tower_points", tower.map_or(0.0, |t| t.points as f64));
    if let (Some(c), Some(i)) = (congruent_rt, incongruent_rt) {
        report = report.with_metric("interference_ms", i - c);
    }
    report
}
