use cogni_core::{
    Domain, ScoreReport, TrialLog, WeightedScore, coefficient_of_variation, mean, percent,
};

use super::SequenceRound;
use crate::config::SequenceConfig;

/// Milliseconds per item a player is expected to need when tapping a sequence back.
const OPTIMAL_MS_PER_ITEM: f64 = 500.0;

/// Points for one fully-correct round.
///
/// `level` is the span relative to the starting span, so the first round
/// is played at multiplier 1.5.
pub fn round_score(len: usize, reaction_ms: u64, errors_so_far: u32, level: i64) -> u32 {
    let optimal = len as f64 * OPTIMAL_MS_PER_ITEM;
    let over = ((reaction_ms as f64 - optimal) / 50.0).max(0.0);
    let time_bonus = (100.0 - over).max(0.0);
    let length_bonus = len as f64 * 20.0;
    let consistency_bonus = (50.0 - errors_so_far as f64 * 10.0).max(0.0);
    let multiplier = 1.0 + (level + 1) as f64 * 0.5;
    let raw = (100.0 + time_bonus + length_bonus + consistency_bonus) * multiplier;
    raw.round().max(0.0) as u32
}

/// Reaction time per sequence item of every correct attempt.
fn per_item_times(log: &TrialLog<SequenceRound>) -> Vec<f64> {
    log.iter()
        .filter(|t| t.is_correct())
        .filter_map(|t| {
            let rt = t.reaction_time()? as f64;
            Some(rt / t.stimulus.span.max(1) as f64)
        })
        .collect()
}

pub fn score_session(
    log: &TrialLog<SequenceRound>,
    config: &SequenceConfig,
    max_span: usize,
    lives_left: u8,
    policy_hit_rate: Option<f64>,
) -> ScoreReport {
    let attempts = log.closed().count();
    let correct = log.iter().filter(|t| t.is_correct()).count();
    let accuracy = percent(correct, attempts).unwrap_or(0.0);

    let span_range = config.max_span.saturating_sub(config.min_span).max(1) as f64;
    let span_score = max_span.saturating_sub(config.min_span) as f64 / span_range * 100.0;

    let per_item = per_item_times(log);
    let speed_score = mean(&per_item)
        .map(|ms| 100.0 - (ms - OPTIMAL_MS_PER_ITEM) / 25.0)
        .unwrap_or(0.0);
    let consistency = coefficient_of_variation(&per_item)
        .map(|cv| 100.0 - cv * 100.0)
        .unwrap_or(0.0);
    let adaptive = policy_hit_rate.unwrap_or(50.0);

    let blend = WeightedScore::new()
        .component("span", 0.30, span_score)
        .component("accuracy", 0.25, accuracy)
        .component("speed", 0.20, speed_score)
        .component("consistency", 0.15, consistency)
        .component("adaptive", 0.10, adaptive);

    let correct_rts: Vec<f64> = log
        .iter()
        .filter(|t| t.is_correct())
        .filter_map(|t| t.reaction_time())
        .map(|rt| rt as f64)
        .collect();

    let mut report = ScoreReport::new(
        Domain::Memory,
        blend.total(),
        accuracy,
        mean(&correct_rts),
        format!("max span {max_span}"),
        attempts,
    )
    .with_metric("max_span", max_span as f64)
    .with_metric("rounds_completed", correct as f64)
    .with_metric("errors", (attempts - correct) as f64)
    .with_metric("lives_left", lives_left as f64)
    .with_metric("total_points", log.total_points() as f64);
    for (name, value) in blend.components() {
        report = report.with_metric(&format!("{name}_score"), value);
    }
    report
}
