//! End-to-end search behavior through the engine façade.

use ferz::board::move_to_uci;
use ferz::search::CHECKMATE;
use ferz::time::SearchLimits;
use ferz::Engine;

fn engine_at(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.set_position(fen).expect(fen);
    engine
}

#[test]
fn mate_in_one_at_depth_one() {
    // each position is white to move and mate in one
    let cases = [
        // back rank
        ("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", "a1a8"),
        // smothered
        ("6rk/6pp/8/6N1/8/8/8/6K1 w - - 0 1", "g5f7"),
    ];
    for (fen, expected) in cases {
        let mut engine = engine_at(fen);
        let report = engine.think(&SearchLimits::FixedDepth(1));
        assert!(
            report.score >= CHECKMATE - 1,
            "{}: score {} for {}",
            fen,
            report.score,
            move_to_uci(report.best_move)
        );
        assert_eq!(move_to_uci(report.best_move), expected, "{}", fen);
    }
}

#[test]
fn mate_for_black_is_symmetric() {
    let mut engine = engine_at("r5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1");
    let report = engine.think(&SearchLimits::FixedDepth(1));
    assert_eq!(move_to_uci(report.best_move), "a8a1");
    assert!(report.score >= CHECKMATE - 1);
}

#[test]
fn avoids_stalemate_when_winning() {
    // queen up: any sensible search keeps mating material and makes progress
    let mut engine = engine_at("7k/8/8/8/8/8/5Q2/K7 w - - 0 1");
    let report = engine.think(&SearchLimits::FixedDepth(6));
    assert_ne!(report.best_move, 0);
    assert!(report.score > 0);
    // the chosen move must not stalemate the defender
    engine.apply_move(&move_to_uci(report.best_move)).unwrap();
    let probe = engine.think(&SearchLimits::FixedDepth(2));
    assert_ne!(probe.best_move, 0, "opponent still has a move");
}

#[test]
fn grabs_a_hanging_queen() {
    // 1.e4 e5 2.Nf3 Qg5?? leaves the queen en prise
    let mut engine =
        engine_at("rnb1kbnr/pppp1ppp/8/4p1q1/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
    let report = engine.think(&SearchLimits::FixedDepth(4));
    assert_eq!(move_to_uci(report.best_move), "f3g5");
    assert!(report.score > 400, "queen odds score {}", report.score);
}

#[test]
fn fixed_nodes_limit_holds() {
    let mut engine = Engine::new();
    let report = engine.think(&SearchLimits::FixedNodes(20_000));
    assert!(report.stats.total_nodes() < 400_000);
    assert_ne!(report.best_move, 0);
}

#[test]
fn fixed_time_returns_promptly() {
    let mut engine = Engine::new();
    let start = std::time::Instant::now();
    let report = engine.think(&SearchLimits::FixedTime(150));
    // generous envelope: polling granularity plus scheduling slack
    assert!(start.elapsed().as_millis() < 5_000);
    assert_ne!(report.best_move, 0);
}

#[test]
fn reported_pv_is_playable() {
    let mut engine = Engine::new();
    let report = engine.think(&SearchLimits::FixedDepth(5));
    for mv in &report.pv {
        engine
            .apply_move(&move_to_uci(*mv))
            .expect("every PV move is legal in sequence");
    }
}

#[test]
fn deeper_search_never_worsens_a_forced_mate() {
    let mut engine = engine_at("7k/8/8/8/8/8/8/RR4K1 w - - 0 1");
    let shallow = engine.think(&SearchLimits::FixedDepth(4));
    let deep = engine.think(&SearchLimits::FixedDepth(6));
    assert_eq!(shallow.score, CHECKMATE - 3);
    assert_eq!(deep.score, CHECKMATE - 3, "the mate distance is stable");
}
