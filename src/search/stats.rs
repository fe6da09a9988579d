//! Search statistics: node counts, cutoff tallies and timing.

use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    /// Interior nodes visited.
    pub nodes: u64,

    /// Quiescence nodes visited.
    pub qnodes: u64,

    /// Transposition probes that matched the signature.
    pub tt_hits: u64,

    /// Probes answered directly from a stored bound.
    pub tt_cutoffs: u64,

    /// Beta cutoffs in the main search.
    pub beta_cutoffs: u64,

    /// Null-move refutations.
    pub null_cutoffs: u64,

    /// Moves searched with a late-move reduction.
    pub lmr_reductions: u64,

    /// Reduced moves that had to be re-searched at full depth.
    pub lmr_researches: u64,

    /// Nodes razored away or pruned by reverse futility.
    pub razor_prunes: u64,

    /// Quiet moves dropped by late-move pruning.
    pub lmp_prunes: u64,

    /// Captures skipped in quiescence on futility or negative exchange.
    pub qs_prunes: u64,

    /// Static exchange evaluations run.
    pub see_calls: u64,

    start: Option<Instant>,
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn start_timing(&mut self) {
        self.start = Some(Instant::now());
    }

    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start {
            self.elapsed = start.elapsed();
        }
    }

    pub fn elapsed_now(&self) -> Duration {
        self.start.map(|s| s.elapsed()).unwrap_or(self.elapsed)
    }

    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.qnodes
    }

    /// Nodes per second over the measured interval.
    pub fn nps(&self) -> u64 {
        let ms = self.elapsed_now().as_millis() as u64;
        if ms == 0 {
            0
        } else {
            self.total_nodes() * 1000 / ms
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "nodes {} qnodes {} tt_hits {} tt_cutoffs {} beta {} null {} lmr {}/{} razor {} lmp {} qs_prunes {} see {} time {}ms nps {}",
            self.nodes,
            self.qnodes,
            self.tt_hits,
            self.tt_cutoffs,
            self.beta_cutoffs,
            self.null_cutoffs,
            self.lmr_reductions,
            self.lmr_researches,
            self.razor_prunes,
            self.lmp_prunes,
            self.qs_prunes,
            self.see_calls,
            self.elapsed_now().as_millis(),
            self.nps(),
        )
    }
}
