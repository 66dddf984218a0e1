use cogni_core::{GameRng, TrialLog, TrialOutcome, WeightedScore};
use proptest::prelude::*;

proptest! {
    /// Any mix of weights and raw values blends into the score range.
    #[test]
    fn weighted_total_stays_in_range(
        parts in prop::collection::vec((0.0f64..2.0, -1_000.0f64..1_000.0), 0..8),
    ) {
        let mut blend = WeightedScore::new();
        for (weight, value) in parts {
            blend = blend.component("part", weight, value);
        }
        let total = blend.total();
        prop_assert!((0.0..=100.0).contains(&total));
        for (_, value) in blend.components() {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    /// The same seed replays the same draws.
    #[test]
    fn rng_is_reproducible(seed in any::<u64>()) {
        let mut a = GameRng::new(seed);
        let mut b = GameRng::new(seed);
        for upper in 1..50usize {
            prop_assert_eq!(a.index(upper), b.index(upper));
            prop_assert_eq!(a.chance(0.3), b.chance(0.3));
        }
    }

    /// Closed trials never reopen or change outcome.
    #[test]
    fn closed_trials_are_final(ops in prop::collection::vec((0usize..5, any::<bool>()), 1..30)) {
        let mut log = TrialLog::new();
        for i in 0..5u64 {
            log.open(i, i * 100);
        }
        let mut first: Vec<Option<TrialOutcome>> = vec![None; 5];
        for (step, (id, respond)) in ops.into_iter().enumerate() {
            let at = 1_000 + step as u64;
            if respond {
                log.respond(id, at, true, 10);
            } else {
                log.expire(id, at, false);
            }
            let outcome = log.get(id).unwrap().outcome;
            let seen = *first[id].get_or_insert(outcome);
            prop_assert_eq!(seen, outcome);
        }
        prop_assert_eq!(log.len(), 5);
    }
}
