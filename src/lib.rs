pub mod attacks;
pub mod board;
pub mod engine;
pub mod eval;
pub mod magic;
pub mod search;
pub mod time;
pub mod uci;
pub mod zobrist;

pub use board::{
    move_captured, move_flag, move_from_sq, move_piece, move_promotion, move_to_sq, move_to_uci,
    Board, Color, Move, MoveList, PieceKind, START_FEN,
};
pub use engine::Engine;

/// One-time table setup. Must run before any move generation or search.
pub fn init() {
    attacks::init();
    magic::init();
    zobrist::init();
    search::init_reductions();
}
