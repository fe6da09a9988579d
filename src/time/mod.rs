//! Time policy: how a `go` request turns into deadlines for one search.

use std::time::Duration;

use crate::search::MAX_DEPTH;

/// Divide the remaining clock by this to get the base thinking time.
const CLOCK_DIVISOR: u64 = 40;

/// Polling masks: how many nodes between stop/time checks. The shorter the
/// budget, the tighter the polling.
const NODE_MASK_LONG: u64 = 0xFFFF;
const NODE_MASK_SHORT: u64 = 0x3FFF;

/// What bounds the current search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchLimits {
    /// Think for exactly this long.
    FixedTime(u64),
    /// Search to exactly this depth.
    FixedDepth(i32),
    /// Stop after this many nodes.
    FixedNodes(u64),
    /// Allocate from a game clock.
    Adaptive {
        base_ms: u64,
        fischer_inc_ms: u64,
        clock_remaining_ms: u64,
        moves_to_go: Option<u32>,
    },
    /// Analyze until told to stop.
    Infinite,
}

/// Concrete budget derived from the limits.
#[derive(Debug, Clone)]
pub struct TimeAllocation {
    /// Normal thinking budget; the search may stretch past it when the eval
    /// is dropping.
    pub soft: Option<Duration>,
    /// Absolute ceiling, never exceeded.
    pub hard: Option<Duration>,
    pub max_depth: i32,
    pub node_limit: Option<u64>,
    pub node_mask: u64,
    /// Exact-time mode: no extensions, no early exit on a stable score.
    pub exact_time: bool,
}

impl SearchLimits {
    pub fn allocate(&self) -> TimeAllocation {
        match *self {
            SearchLimits::FixedTime(ms) => {
                let budget = Duration::from_millis(ms.max(1));
                TimeAllocation {
                    soft: Some(budget),
                    hard: Some(budget),
                    max_depth: MAX_DEPTH,
                    node_limit: None,
                    node_mask: mask_for(ms),
                    exact_time: true,
                }
            }
            SearchLimits::FixedDepth(depth) => TimeAllocation {
                soft: None,
                hard: None,
                max_depth: depth.clamp(1, MAX_DEPTH),
                node_limit: None,
                node_mask: NODE_MASK_LONG,
                exact_time: false,
            },
            SearchLimits::FixedNodes(nodes) => TimeAllocation {
                soft: None,
                hard: None,
                max_depth: MAX_DEPTH,
                node_limit: Some(nodes.max(1)),
                node_mask: NODE_MASK_SHORT,
                exact_time: false,
            },
            SearchLimits::Adaptive {
                base_ms,
                fischer_inc_ms,
                clock_remaining_ms,
                moves_to_go,
            } => {
                let divisor = moves_to_go.map(|m| m.max(1) as u64).unwrap_or(CLOCK_DIVISOR);
                let mut soft_ms = clock_remaining_ms / divisor + fischer_inc_ms;
                if soft_ms == 0 {
                    soft_ms = base_ms.max(1);
                }
                // never commit more than half the remaining clock, even to a
                // panic extension
                let hard_ms = ((clock_remaining_ms + fischer_inc_ms) / 2).max(soft_ms.min(50));
                let soft_ms = soft_ms.min(hard_ms).max(1);
                TimeAllocation {
                    soft: Some(Duration::from_millis(soft_ms)),
                    hard: Some(Duration::from_millis(hard_ms.max(1))),
                    max_depth: MAX_DEPTH,
                    node_limit: None,
                    node_mask: mask_for(soft_ms),
                    exact_time: false,
                }
            }
            SearchLimits::Infinite => TimeAllocation {
                soft: None,
                hard: None,
                max_depth: MAX_DEPTH,
                node_limit: None,
                node_mask: NODE_MASK_SHORT,
                exact_time: false,
            },
        }
    }
}

fn mask_for(budget_ms: u64) -> u64 {
    if budget_ms > 10_000 {
        NODE_MASK_LONG
    } else {
        NODE_MASK_SHORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_depth_has_no_deadline() {
        let alloc = SearchLimits::FixedDepth(6).allocate();
        assert!(alloc.soft.is_none() && alloc.hard.is_none());
        assert_eq!(alloc.max_depth, 6);
    }

    #[test]
    fn fixed_time_is_exact() {
        let alloc = SearchLimits::FixedTime(250).allocate();
        assert_eq!(alloc.soft, alloc.hard);
        assert!(alloc.exact_time);
    }

    #[test]
    fn adaptive_uses_a_clock_fraction() {
        let alloc = SearchLimits::Adaptive {
            base_ms: 0,
            fischer_inc_ms: 0,
            clock_remaining_ms: 60_000,
            moves_to_go: None,
        }
        .allocate();
        assert_eq!(alloc.soft, Some(Duration::from_millis(1500)));
        assert_eq!(alloc.hard, Some(Duration::from_millis(30_000)));
        assert!(!alloc.exact_time);
    }

    #[test]
    fn adaptive_respects_moves_to_go() {
        let alloc = SearchLimits::Adaptive {
            base_ms: 0,
            fischer_inc_ms: 0,
            clock_remaining_ms: 10_000,
            moves_to_go: Some(5),
        }
        .allocate();
        assert_eq!(alloc.soft, Some(Duration::from_millis(2000)));
    }

    #[test]
    fn short_budgets_poll_tighter() {
        let short = SearchLimits::FixedTime(500).allocate();
        let long = SearchLimits::FixedTime(60_000).allocate();
        assert!(short.node_mask < long.node_mask);
    }
}
