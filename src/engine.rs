//! Engine façade: the operations a command dispatcher drives.
//!
//! Owns the game position, the signature history for repetition detection,
//! and the process-wide caches. Each `think` call builds a fresh `Search`
//! context over snapshots of the position and history, so a dispatcher can
//! run the search on a worker thread while keeping the engine state here.

use std::sync::Arc;

use crate::board::{move_to_uci, parse_uci_move, Board, Move, Undo};
use crate::search::search::IterationInfo;
use crate::search::{
    EvalCache, Search, SearchControl, SearchParams, SearchReport, TranspositionTable,
};
use crate::time::SearchLimits;

pub struct Engine {
    board: Board,
    /// Signatures of every position since game start, current one last.
    history: Vec<u64>,
    undo_stack: Vec<Undo>,
    tt: Arc<TranspositionTable>,
    eval_cache: Arc<EvalCache>,
    control: Arc<SearchControl>,
    params: SearchParams,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_params(SearchParams::default())
    }

    pub fn with_params(params: SearchParams) -> Self {
        crate::init();
        let board = Board::startpos();
        let history = vec![board.signature];
        Engine {
            board,
            history,
            undo_stack: Vec::new(),
            tt: Arc::new(TranspositionTable::with_mb(params.tt_size_mb)),
            eval_cache: Arc::new(EvalCache::with_mb(params.eval_cache_mb)),
            control: Arc::new(SearchControl::new()),
            params,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Reset to the initial position and forget everything learned: caches,
    /// history, undo trail.
    pub fn new_game(&mut self) {
        self.board = Board::startpos();
        self.history = vec![self.board.signature];
        self.undo_stack.clear();
        self.tt.clear();
        self.eval_cache.clear();
        self.control.reset();
    }

    /// Install a position from FEN. On failure the current position is
    /// unchanged.
    pub fn set_position(&mut self, fen: &str) -> Result<(), &'static str> {
        let mut board = Board::new();
        board.set_from_fen(fen)?;
        self.board = board;
        self.history = vec![self.board.signature];
        self.undo_stack.clear();
        Ok(())
    }

    /// Advance the root position by one move in coordinate notation. An
    /// illegal move leaves the position unchanged.
    pub fn apply_move(&mut self, uci: &str) -> Result<Move, &'static str> {
        let mv = parse_uci_move(&mut self.board, uci)?;
        let undo = self.board.make_move(mv);
        self.undo_stack.push(undo);
        self.history.push(self.board.signature);
        Ok(mv)
    }

    /// Retract the last applied move, if any.
    pub fn undo_move(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(undo) => {
                self.board.unmake_move(undo);
                self.history.pop();
                true
            }
            None => false,
        }
    }

    /// Search the current position within the given limits. Blocks until
    /// the search finishes or is told to stop.
    pub fn think(&mut self, limits: &SearchLimits) -> SearchReport {
        self.think_with_info(limits, &mut |_| {})
    }

    pub fn think_with_info(
        &mut self,
        limits: &SearchLimits,
        on_iteration: &mut dyn FnMut(&IterationInfo),
    ) -> SearchReport {
        self.control.reset();
        let mut search = Search::new(
            self.board.clone(),
            self.history.clone(),
            &self.tt,
            &self.eval_cache,
            &self.params,
            &self.control,
        );
        search.think_with_info(limits, on_iteration)
    }

    /// Ask a running search to wind down and play its best move.
    pub fn stop(&self) {
        self.control.end_thinking();
    }

    /// Kill a running search outright; its result must be discarded.
    pub fn abort(&self) {
        self.control.stop_thinking();
    }

    /// Exhaustive legal-move count to `depth`, for movegen validation.
    pub fn perft(&mut self, depth: u32) -> u64 {
        self.board.perft(depth)
    }

    /// Per-move breakdown of `perft(depth)`.
    pub fn perft_divide(&mut self, depth: u32) -> Vec<(String, u64)> {
        self.board
            .perft_divide(depth)
            .into_iter()
            .map(|(mv, nodes)| (move_to_uci(mv), nodes))
            .collect()
    }

    /// Everything a worker thread needs to run a search detached from the
    /// engine: position snapshot, history snapshot, and shared handles.
    pub fn search_handles(
        &self,
    ) -> (
        Board,
        Vec<u64>,
        Arc<TranspositionTable>,
        Arc<EvalCache>,
        Arc<SearchControl>,
        SearchParams,
    ) {
        (
            self.board.clone(),
            self.history.clone(),
            Arc::clone(&self.tt),
            Arc::clone(&self.eval_cache),
            Arc::clone(&self.control),
            self.params.clone(),
        )
    }

    pub fn control(&self) -> Arc<SearchControl> {
        Arc::clone(&self.control)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
