use cogni_timing::Scheduler;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Ev(usize);

proptest! {
    /// Every one-shot timer fires exactly once, at its due time, however the
    /// host slices time and however many pause/resume cycles interleave.
    #[test]
    fn one_shots_fire_once_with_paused_time_added(
        delays in prop::collection::vec(1u64..5_000, 1..20),
        pauses in prop::collection::vec((0u64..6_000, 1u64..2_000), 0..5),
        step in 1u64..400,
    ) {
        let mut s = Scheduler::new(0);
        for (i, d) in delays.iter().enumerate() {
            s.after(*d, Ev(i));
        }

        let mut pauses = pauses;
        pauses.sort();
        let mut fired = Vec::new();
        let mut now = 0u64;
        let mut pause_iter = pauses.into_iter().peekable();
        let mut resume_at: Option<u64> = None;

        while now < 40_000 {
            now += step;
            if let Some(at) = resume_at {
                if now >= at {
                    fired.extend(s.drain_due(at));
                    s.resume(at);
                    resume_at = None;
                }
            }
            if resume_at.is_none() {
                if let Some(&(start, len)) = pause_iter.peek() {
                    if now >= start {
                        pause_iter.next();
                        let at = now.max(start);
                        fired.extend(s.drain_due(at));
                        s.pause(at);
                        resume_at = Some(at + len);
                    }
                }
            }
            let batch = s.drain_due(now);
            if s.is_paused() {
                prop_assert!(batch.is_empty());
            }
            fired.extend(batch);
        }

        let mut ids: Vec<usize> = fired.iter().map(|f| f.event.0).collect();
        ids.sort_unstable();
        let expected: Vec<usize> = (0..delays.len()).collect();
        prop_assert_eq!(ids, expected);

        // firing order is non-decreasing in time
        for pair in fired.windows(2) {
            prop_assert!(pair[0].at <= pair[1].at);
        }
        prop_assert_eq!(s.pending(), 0);
    }

    #[test]
    fn double_cancel_matches_single_cancel(delays in prop::collection::vec(1u64..1_000, 1..10), victim in 0usize..10) {
        let mut a = Scheduler::new(0);
        let mut b = Scheduler::new(0);
        let mut handles_a = Vec::new();
        let mut handles_b = Vec::new();
        for (i, d) in delays.iter().enumerate() {
            handles_a.push(a.after(*d, Ev(i)));
            handles_b.push(b.after(*d, Ev(i)));
        }
        let victim = victim % delays.len();
        a.cancel(handles_a[victim]);
        b.cancel(handles_b[victim]);
        b.cancel(handles_b[victim]);

        let fa: Vec<_> = a.drain_due(2_000).into_iter().map(|f| (f.at, f.event)).collect();
        let fb: Vec<_> = b.drain_due(2_000).into_iter().map(|f| (f.at, f.event)).collect();
        prop_assert_eq!(fa, fb);
    }
}
