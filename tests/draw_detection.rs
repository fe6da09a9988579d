//! Draw recognition at the search root: repetition, the fifty-move rule,
//! and dead material.

use ferz::time::SearchLimits;
use ferz::Engine;

#[test]
fn threefold_repetition_scores_zero() {
    let mut engine = Engine::new();
    // two knight-shuffle cycles: the initial position stands for the third
    // time once both knights are home again
    for uci in [
        "g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8",
    ] {
        engine.apply_move(uci).expect(uci);
    }
    let report = engine.think(&SearchLimits::FixedDepth(4));
    assert_eq!(report.score, 0);
    assert_ne!(report.best_move, 0, "a move is still produced");
}

#[test]
fn two_occurrences_are_not_yet_a_draw() {
    let mut engine = Engine::new();
    for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        engine.apply_move(uci).expect(uci);
    }
    // only the second occurrence: the root must search normally
    let report = engine.think(&SearchLimits::FixedDepth(3));
    assert!(report.depth >= 3, "no early draw exit at depth {}", report.depth);
}

#[test]
fn fifty_move_rule_scores_zero() {
    let mut engine = Engine::new();
    engine
        .set_position("4k3/8/8/8/8/8/4R3/4K3 w - - 100 80")
        .unwrap();
    let report = engine.think(&SearchLimits::FixedDepth(5));
    assert_eq!(report.score, 0);
    assert_ne!(report.best_move, 0);
}

#[test]
fn fifty_move_counter_below_limit_still_searches() {
    let mut engine = Engine::new();
    engine
        .set_position("4k3/8/8/8/8/8/4R3/4K3 w - - 20 80")
        .unwrap();
    let report = engine.think(&SearchLimits::FixedDepth(4));
    assert!(report.score > 0, "a rook up is winning, not drawn");
}

#[test]
fn insufficient_material_scores_zero() {
    for fen in [
        "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
        "4k3/8/8/8/8/8/8/3NK3 w - - 0 1",
        "4k3/8/8/2b5/8/8/8/4K3 b - - 0 1",
    ] {
        let mut engine = Engine::new();
        engine.set_position(fen).unwrap();
        let report = engine.think(&SearchLimits::FixedDepth(5));
        assert_eq!(report.score, 0, "{}", fen);
    }
}
