//! Perft CLI: counts leaf nodes and cross-checks the move generator
//! against shakmaty.

use clap::Parser;
use ferz::board::{Board, START_FEN};
use shakmaty::fen::Fen;
use shakmaty::{Chess, Position};

#[derive(Parser, Debug)]
#[command(author, version, about = "movegen validation via exhaustive node counts")]
struct Args {
    /// Position to count from.
    #[arg(short, long, default_value_t = String::from(START_FEN))]
    fen: String,

    /// Leaf depth.
    #[arg(short, long, default_value_t = 5)]
    depth: u32,

    /// Print per-root-move counts.
    #[arg(long)]
    divide: bool,

    /// Skip the shakmaty reference run.
    #[arg(long)]
    no_check: bool,
}

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

fn main() {
    ferz::init();
    let args = Args::parse();

    let mut board = Board::new();
    if let Err(e) = board.set_from_fen(&args.fen) {
        eprintln!("bad FEN '{}': {}", args.fen, e);
        std::process::exit(1);
    }

    println!("perft({}) on '{}'", args.depth, args.fen);

    if args.divide {
        let mut total = 0u64;
        for (mv, nodes) in board.perft_divide(args.depth) {
            println!("  {}: {}", ferz::board::move_to_uci(mv), nodes);
            total += nodes;
        }
        println!("total: {}", total);
        return;
    }

    let start = std::time::Instant::now();
    let nodes = board.perft(args.depth);
    let elapsed = start.elapsed();
    println!(
        "ferz:     {} nodes in {} ms ({:.2} Mnps)",
        nodes,
        elapsed.as_millis(),
        nodes as f64 / elapsed.as_micros().max(1) as f64
    );

    if args.no_check {
        return;
    }

    let pos: Chess = args
        .fen
        .parse::<Fen>()
        .expect("shakmaty rejects this FEN")
        .into_position(shakmaty::CastlingMode::Standard)
        .expect("shakmaty rejects this position");
    let start = std::time::Instant::now();
    let reference = perft_reference(&pos, args.depth);
    let elapsed = start.elapsed();
    println!(
        "shakmaty: {} nodes in {} ms",
        reference,
        elapsed.as_millis()
    );

    if nodes == reference {
        println!("counts match");
    } else {
        println!("MISMATCH: difference {}", nodes as i64 - reference as i64);
        std::process::exit(2);
    }
}
