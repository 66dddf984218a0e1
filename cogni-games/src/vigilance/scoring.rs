use cogni_core::{
    Domain, ScoreReport, Trial, TrialLog, TrialOutcome, WeightedScore, coefficient_of_variation,
    mean, percent,
};

use super::VigilanceStimulus;
use crate::config::VigilanceConfig;

const MISS_PENALTY: f64 = 8.0;
const FALSE_ALARM_PENALTY: f64 = 5.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub hits: usize,
    pub misses: usize,
    pub false_alarms: usize,
    pub correct_rejections: usize,
}

impl Counts {
    fn add(&mut self, trial: &Trial<VigilanceStimulus>) {
        match (trial.stimulus.is_target, trial.outcome) {
            (true, TrialOutcome::Responded { .. }) => self.hits += 1,
            (true, TrialOutcome::Expired { .. }) => self.misses += 1,
            (false, TrialOutcome::Responded { .. }) => self.false_alarms += 1,
            (false, TrialOutcome::Expired { .. }) => self.correct_rejections += 1,
            // withdrawn or still open: no verdict
            _ => {}
        }
    }

    pub fn from_log(log: &TrialLog<VigilanceStimulus>) -> Self {
        let mut counts = Counts::default();
        for t in log.iter() {
            counts.add(t);
        }
        counts
    }

    pub fn resolved(&self) -> usize {
        self.hits + self.misses + self.false_alarms + self.correct_rejections
    }

    pub fn hit_rate(&self) -> Option<f64> {
        percent(self.hits, self.hits + self.misses)
            .map(|p| p / 100.0)
    }

    pub fn false_alarm_rate(&self) -> Option<f64> {
        let rejected = self.false_alarms + self.correct_rejections;
        percent(self.false_alarms, rejected).map(|p| p / 100.0)
    }
}

/// Drop in hit rate from the first to the last time slice that contained targets, as a fraction.
fn decrement(log: &TrialLog<VigilanceStimulus>, config: &VigilanceConfig) -> Option<f64> {
    let buckets = config.decrement_buckets.max(1);
    let width = (config.duration_ms / buckets as u64).max(1);
    let mut per_bucket = vec![Counts::default(); buckets];
    for t in log.iter().filter(|t| t.stimulus.is_target) {
        let idx = ((t.stimulus.elapsed_ms / width) as usize).min(buckets - 1);
        per_bucket[idx].add(t);
    }
    let rates: Vec<f64> = per_bucket.iter().filter_map(Counts::hit_rate).collect();
    if rates.len() < 2 {
        return None;
    }
    Some(rates[0] - rates[rates.len() - 1])
}

pub fn score_session(
    log: &TrialLog<VigilanceStimulus>,
    config: &VigilanceConfig,
    elapsed_ms: u64,
) -> ScoreReport {
    let counts = Counts::from_log(log);
    let hit_rate = counts.hit_rate().unwrap_or(0.0);
    let fa_rate = counts.false_alarm_rate().unwrap_or(0.0);

    let sensitivity = (hit_rate - fa_rate) * 100.0;
    let correct = counts.hits + counts.correct_rejections;
    let accuracy = percent(correct, counts.resolved()).unwrap_or(0.0);
    let sustained = 100.0
        - counts.misses as f64 * MISS_PENALTY
        - counts.false_alarms as f64 * FALSE_ALARM_PENALTY;
    let decrement = decrement(log, config);
    let vigilance = 100.0 - decrement.unwrap_or(0.0).max(0.0) * 100.0;

    let hit_rts: Vec<f64> = log
        .iter()
        .filter(|t| t.stimulus.is_target)
        .filter_map(|t| t.reaction_time())
        .map(|rt| rt as f64)
        .collect();
    let consistency = coefficient_of_variation(&hit_rts)
        .map(|cv| 100.0 - cv * 100.0)
        .unwrap_or(0.0);
    let inhibition = 100.0 - fa_rate * 100.0;

    let blend = WeightedScore::new()
        .component("sensitivity", 0.25, sensitivity)
        .component("accuracy", 0.20, accuracy)
        .component("sustained_attention", 0.20, sustained)
        .component("vigilance", 0.15, vigilance)
        .component("consistency", 0.10, consistency)
        .component("inhibition", 0.10, inhibition);

    let targets = counts.hits + counts.misses;
    let mut report = ScoreReport::new(
        Domain::Attention,
        blend.total(),
        accuracy,
        mean(&hit_rts),
        format!("{}s vigilance, {} targets", elapsed_ms / 1_000, targets),
        log.len(),
    )
    .with_metric("hits", counts.hits as f64)
    .with_metric("misses", counts.misses as f64)
    .with_metric("false_alarms", counts.false_alarms as f64)
    .with_metric("correct_rejections", counts.correct_rejections as f64)
    .with_metric("elapsed_ms", elapsed_ms as f64)
    .with_metric("decrement", decrement.unwrap_or(0.0));
    for (name, value) in blend.components() {
        report = report.with_metric(&format!("{name}_score"), value);
    }
    report
}
