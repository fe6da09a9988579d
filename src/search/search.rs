//! Iterative-deepening alpha-beta search with quiescence.
//!
//! A `Search` owns everything one `think` call needs: a snapshot of the
//! root position, the signature history for repetition detection, the
//! killer and history tables, and references to the shared caches. The
//! recursion threads through `&mut self`; there is no global search state.

use std::time::Instant;

use crate::board::{
    move_captured, move_flag, move_from_sq, move_is_quiet, move_promotion, move_to_sq,
    piece_value, Board, Move, MoveList, PieceKind, FLAG_CAPTURE, FLAG_CASTLE_KING,
    FLAG_CASTLE_QUEEN, FLAG_CHECK, FLAG_PROMOTION, HASH_SORT_VAL, KILLER_1_SORT_VAL,
    KILLER_2_SORT_VAL, MAX_HISTORY_VAL, PV_SORT_VAL,
};
use crate::eval;
use crate::search::see;
use crate::search::tt::{self, Bound, EvalCache, TTEntry, TranspositionTable};
use crate::search::{
    lmr_reduction, SearchCommand, SearchControl, SearchParams, SearchStats, CHECKMATE, INFINITY,
    MATE_THRESHOLD, MAX_DEPTH, MAX_EXT_DEPTH, MAX_QS_DEPTH,
};
use crate::time::SearchLimits;

const MAX_KILLERS: usize = 2;

/// A principal variation: the line the search expects from this node.
#[derive(Clone, Copy)]
pub struct PvLine {
    pub len: usize,
    pub moves: [Move; MAX_DEPTH as usize],
}

impl PvLine {
    pub fn new() -> Self {
        PvLine {
            len: 0,
            moves: [0; MAX_DEPTH as usize],
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// This node's PV is `first` followed by the child's line.
    #[inline]
    pub fn load(&mut self, first: Move, rest: &PvLine) {
        self.moves[0] = first;
        let tail = rest.len.min(MAX_DEPTH as usize - 1);
        self.moves[1..=tail].copy_from_slice(&rest.moves[..tail]);
        self.len = tail + 1;
    }

    pub fn line(&self) -> &[Move] {
        &self.moves[..self.len]
    }
}

impl Default for PvLine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    /// Unwind, keep the last completed iteration.
    End,
    /// Unwind, discard everything.
    Stop,
}

#[derive(Debug, Clone, Copy, Default)]
struct Killer {
    mv: Move,
    eval: i32,
}

/// Result of one `think` call.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best_move: Move,
    pub score: i32,
    pub depth: i32,
    pub pv: Vec<Move>,
    pub elapsed_ms: u64,
    pub stats: SearchStats,
    /// True when the search was killed by a stop command; the move must not
    /// be played.
    pub aborted: bool,
}

/// Progress snapshot handed to the caller after each completed depth.
pub struct IterationInfo<'a> {
    pub depth: i32,
    pub score: i32,
    pub nodes: u64,
    pub nps: u64,
    pub elapsed_ms: u64,
    pub hashfull: u32,
    pub pv: &'a [Move],
}

pub struct Search<'a> {
    board: Board,
    /// Signature of every position since game start, current one last.
    /// Pushed and popped in lock-step with make/unmake.
    history: Vec<u64>,
    tt: &'a TranspositionTable,
    eval_cache: &'a EvalCache,
    params: &'a SearchParams,
    control: &'a SearchControl,
    pub stats: SearchStats,

    killers: [[Killer; MAX_KILLERS]; (MAX_DEPTH + 2) as usize],
    history_table: Box<[[i32; 64]; 64]>,

    ply: i32,
    ext_depth: i32,
    qs_depth: i32,
    abort: Option<Abort>,

    // time control
    start: Instant,
    soft: Option<std::time::Duration>,
    hard: Option<std::time::Duration>,
    exact_time: bool,
    node_limit: Option<u64>,
    node_mask: u64,

    // root feedback driving the time extension tiers
    prev_eval: Option<i32>,
    cur_eval: Option<i32>,
    keep_thinking: bool,
    think_until_safe: bool,
    has_completed_iteration: bool,
}

impl<'a> Search<'a> {
    pub fn new(
        board: Board,
        game_history: Vec<u64>,
        tt: &'a TranspositionTable,
        eval_cache: &'a EvalCache,
        params: &'a SearchParams,
        control: &'a SearchControl,
    ) -> Self {
        let mut history = game_history;
        if history.last() != Some(&board.signature) {
            history.push(board.signature);
        }
        Search {
            board,
            history,
            tt,
            eval_cache,
            params,
            control,
            stats: SearchStats::new(),
            killers: [[Killer::default(); MAX_KILLERS]; (MAX_DEPTH + 2) as usize],
            history_table: Box::new([[0; 64]; 64]),
            ply: 0,
            ext_depth: 0,
            qs_depth: 0,
            abort: None,
            start: Instant::now(),
            soft: None,
            hard: None,
            exact_time: false,
            node_limit: None,
            node_mask: 0x3FFF,
            prev_eval: None,
            cur_eval: None,
            keep_thinking: false,
            think_until_safe: false,
            has_completed_iteration: false,
        }
    }

    pub fn think(&mut self, limits: &SearchLimits) -> SearchReport {
        self.think_with_info(limits, &mut |_| {})
    }

    /// Iterative deepening driver. `on_iteration` fires after every fully
    /// completed depth.
    pub fn think_with_info(
        &mut self,
        limits: &SearchLimits,
        on_iteration: &mut dyn FnMut(&IterationInfo),
    ) -> SearchReport {
        let alloc = limits.allocate();
        self.soft = alloc.soft;
        self.hard = alloc.hard;
        self.exact_time = alloc.exact_time;
        self.node_limit = alloc.node_limit;
        self.node_mask = alloc.node_mask;
        self.start = Instant::now();
        self.stats.reset();
        self.stats.start_timing();
        self.abort = None;
        self.prev_eval = None;
        self.has_completed_iteration = false;
        self.clear_killers();

        let mut root_moves = MoveList::new();
        let num_root = self.board.generate_all(&mut root_moves);
        if num_root == 0 {
            let score = if self.board.in_check { -CHECKMATE } else { 0 };
            return self.report(0, score, 0, Vec::new(), false);
        }

        // claimable draws and dead material at the root score zero; a legal
        // move is still produced from a one-ply search
        let root_sig = self.board.signature;
        let repeats = self.history.iter().filter(|&&s| s == root_sig).count();
        if repeats >= 3 || self.board.halfmove >= 100 || eval::is_material_draw(&self.board) {
            let mut pv = PvLine::new();
            self.ply = 0;
            self.alpha_beta(1, -INFINITY, INFINITY, &mut pv, false);
            let best = if pv.len > 0 { pv.moves[0] } else { root_moves.items[0].mv };
            return self.report(best, 0, 1, vec![best], false);
        }

        let mut best_move = root_moves.items[0].mv;
        let mut best_score = 0;
        let mut best_pv: Vec<Move> = vec![best_move];
        let mut completed_depth = 0;
        let mut mate_streak = 0;

        for depth in 1..=alloc.max_depth {
            self.ply = 0;
            self.ext_depth = 0;
            self.qs_depth = 0;
            self.cur_eval = None;
            self.keep_thinking = false;
            self.think_until_safe = false;

            let mut pv = PvLine::new();
            let mut score;

            if depth == 1 || self.prev_eval.is_none() {
                score = self.alpha_beta(depth, -INFINITY, INFINITY, &mut pv, false);
            } else {
                // aspiration: a narrow window around the previous score,
                // widened on the failing side by retry-count multiples
                let prev = self.prev_eval.unwrap();
                let window = self.params.aspiration_window;
                let mut low = (prev - window).max(-INFINITY);
                let mut high = (prev + window).min(INFINITY);
                let mut retries = 0u32;
                loop {
                    retries += 1;
                    if retries >= self.params.max_aspiration_retries {
                        low = -INFINITY;
                        high = INFINITY;
                    }
                    pv.clear();
                    score = self.alpha_beta(depth, low, high, &mut pv, false);
                    if self.abort.is_some() {
                        break;
                    }
                    if score <= low && low > -INFINITY {
                        low = (low - retries as i32 * window).max(-INFINITY);
                        continue;
                    }
                    if score >= high && high < INFINITY {
                        high = (high + retries as i32 * window).min(INFINITY);
                        continue;
                    }
                    break;
                }
            }

            if self.abort.is_some() || pv.len == 0 {
                // aborted iteration: revert to the last completed one
                break;
            }

            best_move = pv.moves[0];
            best_score = score;
            best_pv = pv.line().to_vec();
            completed_depth = depth;
            self.prev_eval = Some(score);
            self.has_completed_iteration = true;

            on_iteration(&IterationInfo {
                depth,
                score,
                nodes: self.stats.total_nodes(),
                nps: self.stats.nps(),
                elapsed_ms: self.stats.elapsed_now().as_millis() as u64,
                hashfull: self.tt.fill_permille(),
                pv: pv.line(),
            });

            // a mate confirmed at two consecutive depths will not improve
            if best_score.abs() >= MATE_THRESHOLD {
                mate_streak += 1;
                if mate_streak >= 2 {
                    break;
                }
            } else {
                mate_streak = 0;
            }
            // a forced move needs no deep analysis
            if num_root == 1 && depth >= 2 {
                break;
            }
            if let Some(limit) = self.node_limit {
                if self.stats.total_nodes() >= limit {
                    break;
                }
            }
            if self.time_is_up() {
                break;
            }
        }

        let aborted = self.abort == Some(Abort::Stop);
        self.report(best_move, best_score, completed_depth, best_pv, aborted)
    }

    fn report(
        &mut self,
        best_move: Move,
        score: i32,
        depth: i32,
        pv: Vec<Move>,
        aborted: bool,
    ) -> SearchReport {
        self.stats.stop_timing();
        SearchReport {
            best_move,
            score,
            depth,
            pv,
            elapsed_ms: self.stats.elapsed.as_millis() as u64,
            stats: self.stats.clone(),
            aborted,
        }
    }

    // -----------------------------------------------------------------------
    // Alpha-beta
    // -----------------------------------------------------------------------

    fn alpha_beta(
        &mut self,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        pv: &mut PvLine,
        null_mode: bool,
    ) -> i32 {
        self.stats.nodes += 1;
        self.poll();
        if self.abort.is_some() {
            return 0;
        }
        pv.clear();

        let signature = self.board.signature;

        // repetitions and the fifty-move rule are draws anywhere below the
        // root; fifty-move first confirms a legal move exists so a mating
        // position is not misread as a draw
        if self.ply > 0 {
            if self.is_repetition() {
                return draw_score(alpha, beta);
            }
            if self.board.halfmove >= 100 {
                let mut list = MoveList::new();
                if self.board.generate_all(&mut list) > 0 {
                    return draw_score(alpha, beta);
                }
            }
        }

        let mut tt_hint = None;
        let mut tt_mate_threat = false;
        if let Some(entry) = self.tt.probe(signature) {
            self.stats.tt_hits += 1;
            tt_hint = entry.best_move;
            tt_mate_threat = entry.mate_threat;
            if self.ply >= 2 && entry.depth >= depth {
                let score = tt::score_from_tt(entry.score, self.ply);
                match entry.bound {
                    Bound::Exact => {
                        self.stats.tt_cutoffs += 1;
                        return score.clamp(alpha, beta);
                    }
                    Bound::Lower if score >= beta => {
                        self.stats.tt_cutoffs += 1;
                        return beta;
                    }
                    Bound::Upper if score <= alpha => {
                        self.stats.tt_cutoffs += 1;
                        return alpha;
                    }
                    _ => {}
                }
            }
        }

        if self.ply >= MAX_DEPTH {
            return self.evaluate(alpha, beta);
        }

        // mate-distance pruning: no line from here can beat an already
        // proven faster mate
        let mate_value = CHECKMATE - self.ply;
        if mate_value < beta {
            beta = mate_value;
            if alpha >= mate_value {
                return alpha;
            }
        }
        let mated_value = -CHECKMATE + self.ply;
        if mated_value > alpha {
            alpha = mated_value;
            if beta <= mated_value {
                return beta;
            }
        }

        if depth <= 0 {
            self.qs_depth = 0;
            return self.quiesce(alpha, beta, pv);
        }

        let pv_node = beta - alpha > 1;
        let in_check = self.board.in_check;

        // razoring below alpha and reverse futility above beta, shallow
        // non-PV nodes only
        if self.params.use_razoring && !null_mode && !pv_node && !in_check && depth < 4 {
            let static_eval = self.evaluate(-INFINITY, INFINITY);
            let alpha_margin = self.params.razor_alpha_margins[depth as usize];
            if static_eval <= alpha - alpha_margin {
                self.qs_depth = 0;
                let mut scratch = PvLine::new();
                let score = self.quiesce(alpha - alpha_margin, beta - alpha_margin, &mut scratch);
                if self.abort.is_some() {
                    return 0;
                }
                if score <= alpha - alpha_margin {
                    self.stats.razor_prunes += 1;
                    return alpha;
                }
            }
            if static_eval >= beta + self.params.razor_beta_margins[depth as usize] {
                self.stats.razor_prunes += 1;
                return beta;
            }
        }

        // null move: hand the opponent a free shot with a reduced zero-width
        // search; a fail high proves this node is at least beta. Forbidden
        // in check, with bare pawns, under a known mate threat, and twice in
        // a row.
        let mut null_mate_threat = false;
        if self.params.use_null_move
            && !pv_node
            && self.ply > 0
            && depth > 1
            && !in_check
            && !null_mode
            && !tt_mate_threat
            && self.board.has_non_pawn_material(self.board.side)
        {
            let r = 3 + depth / 6;
            let undo = self.board.make_null_move();
            self.history.push(self.board.signature);
            self.ply += 1;
            let mut scratch = PvLine::new();
            let null_eval = -self.alpha_beta(depth - 1 - r, -beta, -beta + 1, &mut scratch, true);
            self.ply -= 1;
            self.history.pop();
            self.board.unmake_null_move(undo);
            if self.abort.is_some() {
                return 0;
            }
            if null_eval >= beta {
                self.stats.null_cutoffs += 1;
                self.tt.store(
                    signature,
                    TTEntry {
                        score: tt::score_to_tt(beta, self.ply),
                        depth,
                        bound: Bound::Lower,
                        mate_threat: false,
                        best_move: None,
                    },
                );
                return beta;
            }
            // standing pat walks into a mate: remember the threat
            if null_eval <= -MATE_THRESHOLD {
                null_mate_threat = true;
            }
        }

        let mut list = MoveList::new();
        let num_moves = self.board.generate_all(&mut list);
        if num_moves == 0 {
            let score = if in_check { -CHECKMATE + self.ply } else { 0 };
            return score.clamp(alpha, beta);
        }

        let mut have_hint = false;
        if let Some(hint) = tt_hint {
            have_hint = bias_matching(&mut list, hint, HASH_SORT_VAL);
        }

        // internal iterative deepening: with no hash move to lead the
        // ordering, a shallow search finds a likely best move first
        if self.params.use_iid && !have_hint && !pv_node && depth > 5 {
            let mut iid_pv = PvLine::new();
            self.alpha_beta(depth - 3, alpha, beta, &mut iid_pv, false);
            if self.abort.is_some() {
                return 0;
            }
            if iid_pv.len > 0 {
                let mv = iid_pv.moves[0];
                bias_matching(
                    &mut list,
                    (move_from_sq(mv), move_to_sq(mv), move_promotion(mv)),
                    PV_SORT_VAL,
                );
            }
        }

        self.apply_history_and_killers(&mut list);

        let mut best_move: Option<Move> = None;
        let mut bound = Bound::Upper;

        for i in 0..num_moves {
            list.pick_best(i);
            let entry = list.items[i];
            let mv = entry.mv;

            let is_capture = move_flag(mv, FLAG_CAPTURE);
            let is_quiet = move_is_quiet(mv);
            let gives_check = move_flag(mv, FLAG_CHECK);
            let is_killer =
                entry.score == KILLER_1_SORT_VAL || entry.score == KILLER_2_SORT_VAL;

            // late-move pruning: very late quiet moves at shallow depth are
            // simply skipped outside PV and check, with mating material left
            if self.params.use_lmp
                && !pv_node
                && !in_check
                && !gives_check
                && is_quiet
                && depth <= 3
                && i as i32 > 12 + 2 * depth
                && self.board.has_non_pawn_material(self.board.side)
            {
                self.stats.lmp_prunes += 1;
                continue;
            }

            let see_value = if is_capture {
                self.stats.see_calls += 1;
                see::see_move(&mut self.board, mv)
            } else {
                0
            };

            let mut reduction = 0;
            if self.params.use_lmr
                && i > 1
                && !pv_node
                && self.ply > 1
                && !in_check
                && depth > 3
                && !move_flag(mv, FLAG_PROMOTION | FLAG_CASTLE_KING | FLAG_CASTLE_QUEEN | FLAG_CHECK)
                && (!is_capture || see_value < 0)
                && !is_killer
            {
                reduction = lmr_reduction(depth, i);
                if reduction > 0 {
                    self.stats.lmr_reductions += 1;
                }
            }

            // extensions are bounded; a reduction of -1 searches one ply
            // deeper
            let mut extended = false;
            if self.params.use_extensions && self.ext_depth < MAX_EXT_DEPTH {
                if gives_check || num_moves == 1 {
                    reduction -= 1;
                    self.ext_depth += 1;
                    extended = true;
                }
            }

            let undo = self.make(mv);
            let mut child_pv = PvLine::new();

            let mut score = if i == 0 {
                -self.alpha_beta(depth - 1 - reduction, -beta, -alpha, &mut child_pv, false)
            } else {
                let probe =
                    -self.alpha_beta(depth - 1 - reduction, -alpha - 1, -alpha, &mut child_pv, false);
                if self.abort.is_none() && probe > alpha {
                    -self.alpha_beta(depth - 1 - reduction, -beta, -alpha, &mut child_pv, false)
                } else {
                    probe
                }
            };

            // a reduced move that improves alpha earns a full-depth re-search
            if reduction > 0 && self.abort.is_none() && score > alpha {
                self.stats.lmr_researches += 1;
                score = -self.alpha_beta(depth - 1, -beta, -alpha, &mut child_pv, false);
            }

            if extended {
                self.ext_depth -= 1;
            }

            self.unmake(undo);

            if self.abort.is_some() {
                return 0;
            }

            // the first root move is always accepted so an aborted iteration
            // still leaves a playable PV
            if score > alpha || (self.ply == 0 && i == 0) {
                if is_quiet && depth > 1 {
                    self.bump_history(mv, depth);
                }
                best_move = Some(mv);
                pv.load(mv, &child_pv);

                if self.ply == 0 {
                    self.keep_thinking = false;
                    if score <= alpha {
                        // root fail low: things look worse, insist on time
                        self.think_until_safe = true;
                    } else if score >= beta && score < 300 {
                        // root fail high: confirm before playing it
                        self.keep_thinking = true;
                    }
                }

                if score > alpha {
                    bound = Bound::Exact;
                    alpha = score;
                }

                if score >= beta {
                    self.stats.beta_cutoffs += 1;
                    if is_quiet {
                        self.update_killers(mv, score);
                    }
                    self.tt.store(
                        signature,
                        TTEntry {
                            score: tt::score_to_tt(beta, self.ply),
                            depth,
                            bound: Bound::Lower,
                            mate_threat: null_mate_threat,
                            best_move: move_hint(best_move),
                        },
                    );
                    return beta;
                }

                if self.ply == 0 {
                    self.cur_eval = Some(score);
                }
            }
        }

        self.tt.store(
            signature,
            TTEntry {
                score: tt::score_to_tt(alpha, self.ply),
                depth,
                bound,
                mate_threat: null_mate_threat,
                best_move: move_hint(best_move),
            },
        );
        alpha
    }

    // -----------------------------------------------------------------------
    // Quiescence
    // -----------------------------------------------------------------------

    fn quiesce(&mut self, mut alpha: i32, mut beta: i32, pv: &mut PvLine) -> i32 {
        if self.qs_depth > 0 {
            self.stats.qnodes += 1;
        }
        self.poll();
        if self.abort.is_some() {
            return 0;
        }
        pv.clear();

        let mate_value = CHECKMATE - self.ply;
        if mate_value < beta {
            beta = mate_value;
            if alpha >= mate_value {
                return alpha;
            }
        }
        let mated_value = -CHECKMATE + self.ply;
        if mated_value > alpha {
            alpha = mated_value;
            if beta <= mated_value {
                return beta;
            }
        }

        let stand_pat = self.evaluate(alpha, beta);
        if self.qs_depth >= MAX_QS_DEPTH || self.ply >= MAX_DEPTH {
            return stand_pat;
        }

        let in_check = self.board.in_check;
        if !in_check {
            if stand_pat >= beta {
                return beta;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
        }

        let mut list = MoveList::new();
        let num_moves = self.board.generate_captures(&mut list);
        if num_moves == 0 {
            // in check this was an exhaustive generation, so it is mate
            if in_check {
                return (-CHECKMATE + self.ply).clamp(alpha, beta);
            }
            return stand_pat;
        }

        for i in 0..num_moves {
            list.pick_best(i);
            let mv = list.items[i].mv;
            let is_capture = move_flag(mv, FLAG_CAPTURE);
            let promo = move_promotion(mv);

            // minor promotions almost never beat the queen; skip them
            if promo.is_some() && promo != Some(PieceKind::Queen) {
                continue;
            }

            if !in_check {
                if move_is_quiet(mv) {
                    continue;
                }

                // delta futility: even banking the victim plus a pawn of
                // positional slack cannot reach alpha
                let mut margin = piece_value(PieceKind::Pawn);
                if promo.is_some() {
                    margin += piece_value(PieceKind::Queen) - piece_value(PieceKind::Pawn);
                }
                if let Some(victim) = move_captured(mv) {
                    margin += piece_value(victim);
                }
                if stand_pat + margin < alpha {
                    self.stats.qs_prunes += 1;
                    continue;
                }

                if is_capture && promo.is_none() {
                    self.stats.see_calls += 1;
                    if see::see_move(&mut self.board, mv) < 0 {
                        self.stats.qs_prunes += 1;
                        continue;
                    }
                }
            }

            let undo = self.make(mv);
            self.qs_depth += 1;
            let mut child_pv = PvLine::new();
            let score = -self.quiesce(-beta, -alpha, &mut child_pv);
            self.qs_depth -= 1;
            self.unmake(undo);

            if self.abort.is_some() {
                return 0;
            }

            if score > alpha {
                alpha = score;
                pv.load(mv, &child_pv);
                if score >= beta {
                    return beta;
                }
            }
        }

        alpha
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    #[inline]
    fn make(&mut self, mv: Move) -> crate::board::Undo {
        let undo = self.board.make_move(mv);
        self.history.push(self.board.signature);
        self.ply += 1;
        undo
    }

    #[inline]
    fn unmake(&mut self, undo: crate::board::Undo) {
        self.ply -= 1;
        self.history.pop();
        self.board.unmake_move(undo);
    }

    /// Cached static evaluation.
    fn evaluate(&mut self, alpha: i32, beta: i32) -> i32 {
        let signature = self.board.signature;
        if let Some(score) = self.eval_cache.probe(signature) {
            return score;
        }
        let score = eval::evaluate(&self.board, alpha, beta);
        self.eval_cache.store(signature, score);
        score
    }

    /// One earlier occurrence of the current signature counts as a draw
    /// inside the search; the scan walks same-parity predecessors back to
    /// the game start.
    fn is_repetition(&self) -> bool {
        let signature = self.board.signature;
        let len = self.history.len() as i32;
        let mut idx = len - 3;
        while idx >= 0 {
            if self.history[idx as usize] == signature {
                return true;
            }
            idx -= 2;
        }
        false
    }

    fn poll(&mut self) {
        if self.abort.is_some() {
            return;
        }
        let visited = self.stats.total_nodes();
        if visited & self.node_mask != 0 {
            return;
        }
        match self.control.command() {
            SearchCommand::StopThinking => self.abort = Some(Abort::Stop),
            SearchCommand::EndThinking => self.abort = Some(Abort::End),
            SearchCommand::Run => {
                if let Some(limit) = self.node_limit {
                    if visited >= limit {
                        self.abort = Some(Abort::End);
                        return;
                    }
                }
                if self.time_is_up() {
                    self.abort = Some(Abort::End);
                }
            }
        }
    }

    /// Soft-deadline policy. Past the base budget the search still gets
    /// extra time in tiers keyed to how far the score dropped against the
    /// previous iteration; the hard deadline always wins.
    fn time_is_up(&self) -> bool {
        let Some(soft) = self.soft else {
            return false;
        };
        let elapsed = self.start.elapsed();
        if let Some(hard) = self.hard {
            if elapsed >= hard {
                return true;
            }
        }
        if self.exact_time {
            return elapsed >= soft;
        }
        if elapsed < soft {
            return false;
        }
        if self.keep_thinking || self.think_until_safe {
            return false;
        }

        let cur = match self.cur_eval {
            // no root score yet this iteration: end only if an earlier
            // iteration already produced a move
            None => return self.has_completed_iteration,
            Some(c) => c,
        };
        let prev = match self.prev_eval {
            None => return true,
            Some(p) => p,
        };
        if cur >= prev || cur > 200 {
            return true;
        }
        let dip = prev - cur;
        if dip <= 10 {
            return true;
        }
        if dip <= 50 && cur >= 150 {
            return true;
        }
        // halves of the soft budget: 3 = 1.5x, 4 = 2x, 8 = 4x
        let halves = if dip <= 25 {
            if cur <= 50 {
                3
            } else {
                return true;
            }
        } else if dip <= 50 {
            if cur <= 100 {
                4
            } else {
                3
            }
        } else if dip <= 100 {
            if cur <= 100 {
                8
            } else {
                4
            }
        } else {
            // dropped more than a pawn while not clearly winning: only the
            // hard deadline stops us
            if cur <= 100 {
                return false;
            }
            8
        };
        elapsed >= soft * halves / 2
    }

    fn apply_history_and_killers(&mut self, list: &mut MoveList) {
        let ply = self.ply.clamp(0, MAX_DEPTH + 1) as usize;
        for entry in list.items[..list.len].iter_mut() {
            let from = move_from_sq(entry.mv);
            let to = move_to_sq(entry.mv);
            entry.score += self.history_table[from][to];
            if entry.score >= KILLER_1_SORT_VAL {
                continue;
            }
            let killers = &self.killers[ply];
            if killers[0].mv != 0 && same_squares(killers[0].mv, entry.mv) {
                entry.score = KILLER_1_SORT_VAL;
            } else if killers[1].mv != 0 && same_squares(killers[1].mv, entry.mv) {
                entry.score = KILLER_2_SORT_VAL;
            }
        }
    }

    /// Quiet beta cutoffs feed the killer slots; a higher refutation score
    /// displaces the weaker slot.
    fn update_killers(&mut self, mv: Move, score: i32) {
        if move_flag(mv, FLAG_CAPTURE | FLAG_PROMOTION) {
            return;
        }
        let ply = self.ply.clamp(0, MAX_DEPTH + 1) as usize;
        let killers = &mut self.killers[ply];
        if same_squares(killers[0].mv, mv) || same_squares(killers[1].mv, mv) {
            return;
        }
        if score > killers[0].eval {
            killers[1] = killers[0];
            killers[0] = Killer { mv, eval: score };
        } else if score > killers[1].eval {
            killers[1] = Killer { mv, eval: score };
        }
    }

    fn clear_killers(&mut self) {
        for slots in self.killers.iter_mut() {
            for killer in slots.iter_mut() {
                *killer = Killer {
                    mv: 0,
                    eval: -INFINITY,
                };
            }
        }
    }

    fn bump_history(&mut self, mv: Move, depth: i32) {
        let from = move_from_sq(mv);
        let to = move_to_sq(mv);
        self.history_table[from][to] += depth * depth;
        // rescale everything rather than saturating one cell
        if self.history_table[from][to] > MAX_HISTORY_VAL {
            for row in self.history_table.iter_mut() {
                for cell in row.iter_mut() {
                    *cell /= 2;
                }
            }
        }
    }
}

/// Repetition and fifty-move draws return zero clipped into the window.
#[inline]
fn draw_score(alpha: i32, beta: i32) -> i32 {
    if alpha > 0 {
        alpha
    } else if beta < 0 {
        beta
    } else {
        0
    }
}

#[inline]
fn same_squares(a: Move, b: Move) -> bool {
    move_from_sq(a) == move_from_sq(b) && move_to_sq(a) == move_to_sq(b)
}

#[inline]
fn move_hint(mv: Option<Move>) -> Option<(usize, usize, Option<PieceKind>)> {
    mv.map(|m| (move_from_sq(m), move_to_sq(m), move_promotion(m)))
}

/// Add an ordering bias to the move matching a from/to/promotion hint.
fn bias_matching(
    list: &mut MoveList,
    hint: (usize, usize, Option<PieceKind>),
    bias: i32,
) -> bool {
    for entry in list.items[..list.len].iter_mut() {
        if move_from_sq(entry.mv) == hint.0
            && move_to_sq(entry.mv) == hint.1
            && move_promotion(entry.mv) == hint.2
        {
            entry.score += bias;
            return true;
        }
    }
    false
}
