//! Search benchmark: fixed-depth runs over a small position set, reporting
//! nodes and NPS.

use clap::Parser;
use ferz::board::move_to_uci;
use ferz::time::SearchLimits;
use ferz::Engine;

#[derive(Parser, Debug)]
#[command(author, version, about = "search speed benchmark")]
struct Args {
    /// Depth searched on every position.
    #[arg(short, long, default_value_t = 8)]
    depth: i32,

    /// Transposition table size in MB.
    #[arg(long, default_value_t = 64)]
    hash: usize,
}

const POSITIONS: [&str; 6] = [
    // start position
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    // sharp middlegame
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    // closed center
    "r1bq1rk1/pp2ppbp/2np1np1/8/3PP3/2N1BP2/PP1QN1PP/R3KB1R w KQ - 4 9",
    // queenless grind
    "2r2rk1/pb2bppp/1pn1pn2/8/2PP4/1PN2NP1/PB2PPBP/2RR2K1 w - - 2 14",
    // pawn endgame
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    // rook endgame
    "8/8/4kpp1/3p4/p2P1P2/4K1P1/P7/8 w - - 0 40",
];

fn main() {
    ferz::init();
    let args = Args::parse();

    let params = ferz::search::SearchParams::default().tt_size_mb(args.hash);
    let limits = SearchLimits::FixedDepth(args.depth);
    let mut total_nodes = 0u64;
    let mut total_ms = 0u64;

    for fen in POSITIONS {
        let mut engine = Engine::with_params(params.clone());
        engine.set_position(fen).expect(fen);
        let report = engine.think(&limits);
        let nodes = report.stats.total_nodes();
        total_nodes += nodes;
        total_ms += report.elapsed_ms;
        println!(
            "depth {:2} move {:5} score {:6} nodes {:9} time {:5} ms  {}",
            report.depth,
            move_to_uci(report.best_move),
            report.score,
            nodes,
            report.elapsed_ms,
            fen
        );
    }

    let nps = if total_ms > 0 {
        total_nodes * 1000 / total_ms
    } else {
        0
    };
    println!("total: {} nodes in {} ms ({} nps)", total_nodes, total_ms, nps);
}
