//! Zobrist signature keys.
//!
//! One 64-bit key per (piece, color, square), one for the side to move,
//! sixteen for the castling-rights nibble and eight for the en-passant file.
//! Keys are expanded from a fixed seed with splitmix64, so signatures are
//! stable across runs.

use std::sync::OnceLock;

use crate::attacks::iter_bits;
use crate::board::{Board, Color, PieceKind};

pub struct ZobristKeys {
    // indexed [color * 6 + kind][square]
    pub piece: [[u64; 64]; 12],
    pub side: u64,
    pub castling: [u64; 16],
    pub ep_file: [u64; 8],
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

fn split_mix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn build_keys() -> ZobristKeys {
    let mut state = 0xD6E8_FEB8_6659_FD93u64;
    let mut piece = [[0u64; 64]; 12];
    for row in piece.iter_mut() {
        for key in row.iter_mut() {
            *key = split_mix64(&mut state);
        }
    }
    let side = split_mix64(&mut state);
    let mut castling = [0u64; 16];
    for key in castling.iter_mut() {
        *key = split_mix64(&mut state);
    }
    let mut ep_file = [0u64; 8];
    for key in ep_file.iter_mut() {
        *key = split_mix64(&mut state);
    }
    ZobristKeys {
        piece,
        side,
        castling,
        ep_file,
    }
}

#[inline(always)]
pub fn init() {
    KEYS.get_or_init(build_keys);
}

#[inline]
pub fn keys() -> &'static ZobristKeys {
    KEYS.get().expect("zobrist keys not initialized, call zobrist::init() first")
}

#[inline]
pub fn piece_key(kind: PieceKind, color: Color, sq: usize) -> u64 {
    keys().piece[(color as usize) * 6 + kind as usize][sq]
}

/// Recompute the signature from scratch. The incremental value maintained by
/// make/unmake must always equal this.
pub fn recompute(board: &Board) -> u64 {
    let keys = keys();
    let mut h = 0u64;
    for color in [Color::White, Color::Black] {
        for kind in PieceKind::ALL {
            for sq in iter_bits(board.pieces(kind, color)) {
                h ^= keys.piece[(color as usize) * 6 + kind as usize][sq];
            }
        }
    }
    if board.side == Color::Black {
        h ^= keys.side;
    }
    h ^= keys.castling[board.castling as usize];
    if let Some(pawn_sq) = board.ep_pawn {
        h ^= keys.ep_file[(pawn_sq % 8) as usize];
    }
    h
}
