//! Search: iterative deepening driver, alpha-beta with quiescence, caches
//! and ordering heuristics.
//!
//! - `search`: the `Search` context and the algorithms
//! - `tt`: transposition table and evaluation cache
//! - `see`: static exchange evaluation
//! - `params`: tunables and feature toggles
//! - `stats`: node counts and timing

pub mod params;
pub mod search;
pub mod see;
pub mod stats;
pub mod tt;

pub use self::params::SearchParams;
pub use self::search::{Search, SearchReport};
pub use self::stats::SearchStats;
pub use self::tt::{EvalCache, TranspositionTable};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

pub const MAX_DEPTH: i32 = 128;
pub const MAX_EXT_DEPTH: i32 = 10;
pub const MAX_QS_DEPTH: i32 = 128;

pub const INFINITY: i32 = 0x8000;
pub const CHECKMATE: i32 = 0x7FFF;
pub const MATE_THRESHOLD: i32 = CHECKMATE / 2;

// ---------------------------------------------------------------------------
// Late-move reduction table, filled once at startup
// ---------------------------------------------------------------------------

static LMR_REDUCTIONS: OnceLock<[[i32; 32]; 32]> = OnceLock::new();

fn build_reductions() -> [[i32; 32]; 32] {
    let mut table = [[0i32; 32]; 32];
    for (depth, row) in table.iter_mut().enumerate().skip(1) {
        for (index, slot) in row.iter_mut().enumerate().skip(1) {
            let red = (0.32 + (depth as f64).ln() * (index as f64).ln() / 2.24) as i32;
            *slot = red.min(depth as i32);
        }
    }
    table
}

#[inline(always)]
pub fn init_reductions() {
    LMR_REDUCTIONS.get_or_init(build_reductions);
}

/// Reduction in plies for a move at `index` with `depth` remaining.
#[inline]
pub fn lmr_reduction(depth: i32, index: usize) -> i32 {
    let table = LMR_REDUCTIONS.get().expect("reduction table not initialized");
    table[depth.clamp(0, 31) as usize][index.min(31)]
}

// ---------------------------------------------------------------------------
// Cooperative cancellation
// ---------------------------------------------------------------------------

/// Broadcast command observed by the search at its polling points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCommand {
    /// Keep searching.
    Run,
    /// Unwind and play the last fully completed iteration's move.
    EndThinking,
    /// Unwind as fast as possible; no move is emitted and search state is
    /// undefined until the next think call.
    StopThinking,
}

pub struct SearchControl {
    command: AtomicU8,
}

impl SearchControl {
    pub fn new() -> Self {
        SearchControl {
            command: AtomicU8::new(0),
        }
    }

    pub fn reset(&self) {
        self.command.store(0, Ordering::Relaxed);
    }

    pub fn end_thinking(&self) {
        self.command.store(1, Ordering::Relaxed);
    }

    pub fn stop_thinking(&self) {
        self.command.store(2, Ordering::Relaxed);
    }

    #[inline]
    pub fn command(&self) -> SearchCommand {
        match self.command.load(Ordering::Relaxed) {
            1 => SearchCommand::EndThinking,
            2 => SearchCommand::StopThinking,
            _ => SearchCommand::Run,
        }
    }
}

impl Default for SearchControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_table_shape() {
        init_reductions();
        // early moves at shallow depth are never reduced
        assert_eq!(lmr_reduction(1, 1), 0);
        assert_eq!(lmr_reduction(2, 2), 0);
        // late moves at real depth are
        assert!(lmr_reduction(8, 20) >= 2);
        // monotone in both axes
        assert!(lmr_reduction(12, 30) >= lmr_reduction(12, 6));
        assert!(lmr_reduction(20, 10) >= lmr_reduction(4, 10));
        // never deeper than the remaining depth
        for depth in 1..32 {
            for index in 1..32 {
                assert!(lmr_reduction(depth, index) <= depth);
            }
        }
    }

    #[test]
    fn control_commands() {
        let control = SearchControl::new();
        assert_eq!(control.command(), SearchCommand::Run);
        control.end_thinking();
        assert_eq!(control.command(), SearchCommand::EndThinking);
        control.stop_thinking();
        assert_eq!(control.command(), SearchCommand::StopThinking);
        control.reset();
        assert_eq!(control.command(), SearchCommand::Run);
    }
}
