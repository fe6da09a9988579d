//! Transposition table and evaluation cache.
//!
//! Both tables are open-addressed and direct-mapped: the slot is the low
//! bits of the Zobrist signature, capacity a power of two, no chains.
//! Replacement is always-replace on store; a depth-preferred scheme would
//! also satisfy the probe contract but is deliberately not used here.
//!
//! Entries are a pair of relaxed atomics holding `signature ^ payload` and
//! `payload`. A reader xors the two words back together and compares with
//! its own signature, so a torn read (mixed halves of two stores) fails
//! validation instead of returning a wrong entry. That makes the tables
//! safe to share with a search worker thread without locks.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::PieceKind;
use crate::search::MATE_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Upper = 1,
    Lower = 2,
    Exact = 3,
}

/// Decoded transposition entry.
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub score: i32,
    pub depth: i32,
    pub bound: Bound,
    pub mate_threat: bool,
    /// Ordering hint: from square, to square, promotion kind.
    pub best_move: Option<(usize, usize, Option<PieceKind>)>,
}

// Payload layout:
//   bits  0-15  score (i16)
//   bits 16-21  from square
//   bits 22-27  to square
//   bits 28-31  promotion kind (0xF = none)
//   bits 32-39  depth
//   bits 40-41  bound (0 = empty slot)
//   bit  42     mate threat
//   bit  43     best-move present
fn pack(entry: &TTEntry) -> u64 {
    let mut payload = (entry.score as i16 as u16) as u64;
    if let Some((from, to, promo)) = entry.best_move {
        payload |= (from as u64 & 0x3F) << 16;
        payload |= (to as u64 & 0x3F) << 22;
        payload |= (promo.map(|p| p as u64).unwrap_or(0xF) & 0xF) << 28;
        payload |= 1 << 43;
    } else {
        payload |= 0xF << 28;
    }
    payload |= (entry.depth as u64 & 0xFF) << 32;
    payload |= (entry.bound as u64 & 0x3) << 40;
    if entry.mate_threat {
        payload |= 1 << 42;
    }
    payload
}

fn unpack(payload: u64) -> Option<TTEntry> {
    let bound = match (payload >> 40) & 0x3 {
        1 => Bound::Upper,
        2 => Bound::Lower,
        3 => Bound::Exact,
        _ => return None, // empty slot
    };
    let best_move = if payload & (1 << 43) != 0 {
        let from = ((payload >> 16) & 0x3F) as usize;
        let to = ((payload >> 22) & 0x3F) as usize;
        let promo = match (payload >> 28) & 0xF {
            0xF => None,
            1 => Some(PieceKind::Queen),
            2 => Some(PieceKind::Rook),
            3 => Some(PieceKind::Bishop),
            4 => Some(PieceKind::Knight),
            _ => None,
        };
        Some((from, to, promo))
    } else {
        None
    };
    Some(TTEntry {
        score: (payload as u16) as i16 as i32,
        depth: ((payload >> 32) & 0xFF) as i32,
        bound,
        mate_threat: payload & (1 << 42) != 0,
        best_move,
    })
}

struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

pub struct TranspositionTable {
    slots: Vec<Slot>,
    mask: u64,
}

impl TranspositionTable {
    /// Allocate roughly `size_mb` megabytes, rounded down to a power of two
    /// slot count. Allocation happens once; running out of memory here is
    /// fatal by design.
    pub fn with_mb(size_mb: usize) -> Self {
        let slot_bytes = std::mem::size_of::<Slot>();
        let requested = (size_mb.max(1) * 1024 * 1024) / slot_bytes;
        let count = requested.next_power_of_two().max(1024);
        let count = if count > requested { count >> 1 } else { count };
        let count = count.max(1024);

        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(Slot {
                key: AtomicU64::new(0),
                data: AtomicU64::new(0),
            });
        }
        TranspositionTable {
            slots,
            mask: (count - 1) as u64,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Valid only on full signature equality; the slot index matching is
    /// never enough on its own.
    pub fn probe(&self, signature: u64) -> Option<TTEntry> {
        let slot = &self.slots[(signature & self.mask) as usize];
        let data = slot.data.load(Ordering::Relaxed);
        let key = slot.key.load(Ordering::Relaxed);
        if key ^ data != signature {
            return None;
        }
        unpack(data)
    }

    pub fn store(&self, signature: u64, entry: TTEntry) {
        let payload = pack(&entry);
        let slot = &self.slots[(signature & self.mask) as usize];
        slot.key.store(signature ^ payload, Ordering::Relaxed);
        slot.data.store(payload, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
    }

    /// Permille of used slots, for `info hashfull` reporting.
    pub fn fill_permille(&self) -> u32 {
        let sample = self.slots.len().min(1000);
        let used = self.slots[..sample]
            .iter()
            .filter(|s| s.data.load(Ordering::Relaxed) != 0)
            .count();
        (used * 1000 / sample.max(1)) as u32
    }
}

/// Mate scores are stored relative to the root: push the ply distance in on
/// store so a reused entry still means "mate in N from here".
#[inline]
pub fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

#[inline]
pub fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

// ---------------------------------------------------------------------------
// Evaluation cache: same addressing and validation, payload is one static
// score.
// ---------------------------------------------------------------------------

pub struct EvalCache {
    slots: Vec<Slot>,
    mask: u64,
}

impl EvalCache {
    pub fn with_mb(size_mb: usize) -> Self {
        let slot_bytes = std::mem::size_of::<Slot>();
        let count = ((size_mb.max(1) * 1024 * 1024) / slot_bytes)
            .next_power_of_two()
            .max(1024);
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(Slot {
                key: AtomicU64::new(0),
                data: AtomicU64::new(0),
            });
        }
        EvalCache {
            slots,
            mask: (count - 1) as u64,
        }
    }

    pub fn probe(&self, signature: u64) -> Option<i32> {
        let slot = &self.slots[(signature & self.mask) as usize];
        let data = slot.data.load(Ordering::Relaxed);
        let key = slot.key.load(Ordering::Relaxed);
        if key ^ data != signature || data & (1 << 16) == 0 {
            return None;
        }
        Some((data as u16) as i16 as i32)
    }

    pub fn store(&self, signature: u64, score: i32) {
        let payload = ((score as i16 as u16) as u64) | (1 << 16);
        let slot = &self.slots[(signature & self.mask) as usize];
        slot.key.store(signature ^ payload, Ordering::Relaxed);
        slot.data.store(payload, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
    }
}
