//! Dual-task engine: colour-word block followed by the disk-transfer puzzle.

use cogni_core::{ScoreReport, TrialOutcome, VisualClass};
use cogni_games::dual_task::WORD_ID;
use cogni_games::{DualTaskConfig, DualTaskGame, DualTaskInput, DualTaskPhase, Engine, Status};

fn engine(config: DualTaskConfig) -> Engine<DualTaskGame> {
    Engine::new(DualTaskGame::new(config), 17, 0)
}

/// Ink of the colour word currently on screen, read from the snapshot.
fn shown_ink(engine: &Engine<DualTaskGame>) -> Option<usize> {
    engine.snapshot().find(WORD_ID).and_then(|s| match s.class {
        VisualClass::ColorWord { ink, .. } => Some(ink),
        _ => None,
    })
}

/// Answers every colour word correctly `rt` ms after it appears.
fn finish_stroop(engine: &mut Engine<DualTaskGame>, now: &mut u64, rt: u64) {
    while engine.phase() != DualTaskPhase::Tower {
        *now += 50;
        engine.advance(*now);
        if let Some(ink) = shown_ink(engine) {
            *now += rt;
            engine.input(*now, DualTaskInput::ColorTap(ink));
        }
        assert!(*now < 1_000_000);
    }
}

/// Optimal recursive solution, as (from, to) peg pairs.
fn solution(n: u8, from: usize, to: usize, via: usize, out: &mut Vec<(usize, usize)>) {
    if n == 0 {
        return;
    }
    solution(n - 1, from, via, to, out);
    out.push((from, to));
    solution(n - 1, via, to, from, out);
}

fn play_moves(
    engine: &mut Engine<DualTaskGame>,
    now: &mut u64,
    moves: &[(usize, usize)],
) -> Option<ScoreReport> {
    for &(from, to) in moves {
        *now += 500;
        engine.input(*now, DualTaskInput::PegSelect(from));
        *now += 500;
        if let Some(report) = engine.input(*now, DualTaskInput::PegSelect(to)) {
            return Some(report);
        }
    }
    None
}

// =============================================================================
// Full session
// =============================================================================

#[test]
fn test_perfect_session_solves_in_seven_moves() {
    let mut engine = engine(DualTaskConfig::default());
    let mut now = 0;
    engine.start(now);
    finish_stroop(&mut engine, &mut now, 1_000);
    assert_eq!(engine.game().stroop_completed(), 30);

    let mut moves = Vec::new();
    solution(3, 0, 2, 1, &mut moves);
    assert_eq!(moves.len(), 7);
    let report = play_moves(&mut engine, &mut now, &moves).expect("solving ends the session");

    assert_eq!(report.trials, 31);
    assert_eq!(report.accuracy, 100.0);
    assert_eq!(report.metric("tower_solved"), Some(1.0));
    assert_eq!(report.metric("tower_moves"), Some(7.0));
    assert_eq!(report.metric("stroop_accuracy"), Some(100.0));
    // every stroop answer was worth 100 + (150 - 50)
    assert_eq!(report.metric("stroop_points"), Some(30.0 * 200.0));
    // 7 optimal moves in 7s: 100 + (500 - 70)
    assert_eq!(report.metric("tower_points"), Some(530.0));
    assert_eq!(engine.status(), Status::Finished);
    assert_eq!(engine.phase(), DualTaskPhase::Result);
}

#[test]
fn test_wrong_colour_is_incorrect_and_scores_nothing() {
    let mut engine = engine(DualTaskConfig {
        countdown_secs: 0,
        ..DualTaskConfig::default()
    });
    engine.start(0);
    let ink = shown_ink(&engine).unwrap();
    engine.input(800, DualTaskInput::ColorTap((ink + 1) % 4));
    let trial = engine.trials().get(0).unwrap();
    assert_eq!(trial.outcome, TrialOutcome::Responded { correct: false });
    assert_eq!(trial.points, 0);
    // the next word waits for the inter-trial gap
    assert!(shown_ink(&engine).is_none());
    engine.advance(1_300);
    assert!(shown_ink(&engine).is_some());
}

// =============================================================================
// Puzzle rules
// =============================================================================

#[test]
fn test_illegal_move_clears_selection_without_counting() {
    let mut engine = engine(DualTaskConfig {
        stroop_trials: 1,
        countdown_secs: 0,
        ..DualTaskConfig::default()
    });
    let mut now = 0;
    engine.start(now);
    finish_stroop(&mut engine, &mut now, 500);

    // disk 1 to the last peg
    play_moves(&mut engine, &mut now, &[(0, 2)]);
    assert_eq!(engine.game().tower().moves(), 1);

    // disk 2 onto disk 1 is refused
    engine.input(now + 100, DualTaskInput::PegSelect(0));
    assert_eq!(engine.game().selected_peg(), Some(0));
    engine.input(now + 200, DualTaskInput::PegSelect(2));
    assert_eq!(engine.game().selected_peg(), None);
    assert_eq!(engine.game().tower().moves(), 1);
    assert_eq!(engine.game().tower().peg(0), Some(&[3, 2][..]));
    assert_eq!(engine.game().tower().peg(2), Some(&[1][..]));

    // an empty peg cannot be selected
    engine.input(now + 300, DualTaskInput::PegSelect(1));
    assert_eq!(engine.game().selected_peg(), None);

    let pegs: Vec<Vec<u8>> = engine
        .snapshot()
        .stimuli
        .iter()
        .filter_map(|s| match &s.class {
            VisualClass::Peg { disks, .. } => Some(disks.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(pegs, vec![vec![3, 2], vec![], vec![1]]);
}

#[test]
fn test_colour_taps_are_ignored_during_the_puzzle() {
    let mut engine = engine(DualTaskConfig {
        stroop_trials: 1,
        countdown_secs: 0,
        ..DualTaskConfig::default()
    });
    let mut now = 0;
    engine.start(now);
    finish_stroop(&mut engine, &mut now, 500);
    engine.input(now + 10, DualTaskInput::ColorTap(0));
    assert_eq!(engine.trials().len(), 2);
    assert!(engine.trials().is_open(1));
}

#[test]
fn test_time_limit_closes_puzzle_unsolved() {
    let mut engine = engine(DualTaskConfig {
        stroop_trials: 1,
        countdown_secs: 0,
        tower_time_limit_ms: 5_000,
        ..DualTaskConfig::default()
    });
    let mut now = 0;
    engine.start(now);
    finish_stroop(&mut engine, &mut now, 500);
    let tower_opened = now;

    assert!(engine.advance(tower_opened + 2_000).is_none());
    assert_eq!(engine.snapshot().time_remaining_ms, Some(3_000));
    let report = engine
        .advance(tower_opened + 5_000)
        .expect("time limit ends the session");

    let tower = engine.trials().get(1).unwrap();
    assert_eq!(tower.outcome, TrialOutcome::Expired { correct: false });
    assert_eq!(tower.reaction_time(), None);
    assert_eq!(report.metric("tower_solved"), Some(0.0));
    assert_eq!(report.metric("tower_points"), Some(0.0));
    assert_eq!(report.accuracy, 50.0);
}
