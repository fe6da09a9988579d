//! Move generator validation: exhaustive node counts against tabulated
//! values and against shakmaty as an independent reference.
//!
//! The deep runs are ignored by default; run them with
//! `cargo test --release -- --ignored`.

use ferz::board::{Board, START_FEN};
use shakmaty::fen::Fen;
use shakmaty::{Chess, Position};

fn perft_reference(pos: &Chess, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0u64;
    for m in pos.legal_moves() {
        let mut next = pos.clone();
        next.play_unchecked(&m);
        nodes += perft_reference(&next, depth - 1);
    }
    nodes
}

fn board_from(fen: &str) -> Board {
    ferz::init();
    let mut board = Board::new();
    board.set_from_fen(fen).expect(fen);
    board
}

fn cross_check(fen: &str, max_depth: u32) {
    let mut board = board_from(fen);
    let pos: Chess = fen
        .parse::<Fen>()
        .expect(fen)
        .into_position(shakmaty::CastlingMode::Standard)
        .expect(fen);
    for depth in 1..=max_depth {
        let ours = board.perft(depth);
        let reference = perft_reference(&pos, depth);
        assert_eq!(ours, reference, "{} at depth {}", fen, depth);
    }
}

#[test]
fn perft_startpos() {
    let mut board = board_from(START_FEN);
    assert_eq!(board.perft(1), 20);
    assert_eq!(board.perft(2), 400);
    assert_eq!(board.perft(3), 8_902);
    assert_eq!(board.perft(4), 197_281);
}

#[test]
fn perft_kiwipete_shallow() {
    let mut board =
        board_from("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -");
    assert_eq!(board.perft(1), 48);
    assert_eq!(board.perft(2), 2_039);
    assert_eq!(board.perft(3), 97_862);
}

#[test]
fn perft_pinned_ep_position() {
    // pawn endgame where the en-passant capture is sometimes pinned
    let mut board = board_from("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
    assert_eq!(board.perft(1), 14);
    assert_eq!(board.perft(2), 191);
    assert_eq!(board.perft(3), 2_812);
    assert_eq!(board.perft(4), 43_238);
}

#[test]
fn perft_promotion_position() {
    let mut board = board_from("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1");
    assert_eq!(board.perft(1), 24);
    assert_eq!(board.perft(2), 496);
    assert_eq!(board.perft(3), 9_483);
}

#[test]
fn perft_cross_checks_shallow() {
    // castling through and out of attacks, promotions, mixed ep rights
    cross_check("r3k2r/8/8/8/3pPp2/8/8/R3K1RR b KQkq e3 0 1", 3);
    cross_check("8/7p/p5pb/4k3/P1pPn3/8/P5PP/1rB2RK1 b - d3 0 28", 3);
    cross_check("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 2);
    cross_check("4k3/8/8/8/8/8/8/4K2R w K - 0 1", 4);
    cross_check("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 2);
}

#[test]
#[ignore = "minutes-long exhaustive runs, use --release"]
fn perft_kiwipete_deep() {
    let mut board =
        board_from("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -");
    assert_eq!(board.perft(4), 4_085_603);
    assert_eq!(board.perft(5), 193_690_690);
}

#[test]
#[ignore = "minutes-long exhaustive runs, use --release"]
fn perft_castling_ep_deep() {
    let mut board = board_from("r3k2r/8/8/8/3pPp2/8/8/R3K1RR b KQkq e3 0 1");
    assert_eq!(board.perft(6), 485_647_607);
}

#[test]
#[ignore = "minutes-long exhaustive runs, use --release"]
fn perft_endgame_deep() {
    let mut board = board_from("8/7p/p5pb/4k3/P1pPn3/8/P5PP/1rB2RK1 b - d3 0 28");
    assert_eq!(board.perft(6), 38_633_283);
}
