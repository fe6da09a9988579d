//! Magic bitboards for O(1) sliding-piece attack lookups.
//!
//! A masked blocker pattern is hashed by a per-square magic multiplier into
//! an index of a precomputed attack table. The magic numbers themselves are
//! derived at startup by a deterministic seeded search, so the resulting
//! attack values are reproducible from run to run.

use std::sync::OnceLock;

/// Magic entry for a single square.
#[derive(Clone, Copy)]
struct MagicEntry {
    mask: u64,
    magic: u64,
    shift: u8,
    offset: usize,
}

struct MagicTables {
    rook_entries: [MagicEntry; 64],
    bishop_entries: [MagicEntry; 64],
    rook_attacks: Vec<u64>,
    bishop_attacks: Vec<u64>,
}

static MAGIC_TABLES: OnceLock<MagicTables> = OnceLock::new();

const MAGIC_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

// ---------------------------------------------------------------------------
// Relevant-occupancy masks (edges excluded: an edge blocker never changes the
// attack set)
// ---------------------------------------------------------------------------

fn rook_mask(sq: usize) -> u64 {
    let mut mask = 0u64;
    let rank = sq / 8;
    let file = sq % 8;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }

    mask
}

fn bishop_mask(sq: usize) -> u64 {
    let mut mask = 0u64;
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;

    for &(dr, df) in &[(1i32, 1i32), (1, -1), (-1, 1), (-1, -1)] {
        let (mut r, mut f) = (rank + dr, file + df);
        while (1..7).contains(&r) && (1..7).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }

    mask
}

// ---------------------------------------------------------------------------
// Slow ray walkers, used only while building the tables
// ---------------------------------------------------------------------------

fn rook_attacks_slow(sq: usize, occ: u64) -> u64 {
    let mut attacks = 0u64;
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;

    for &(dr, df) in &[(1i32, 0i32), (-1, 0), (0, 1), (0, -1)] {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let b = 1u64 << (r * 8 + f);
            attacks |= b;
            if occ & b != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }

    attacks
}

fn bishop_attacks_slow(sq: usize, occ: u64) -> u64 {
    let mut attacks = 0u64;
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;

    for &(dr, df) in &[(1i32, 1i32), (1, -1), (-1, 1), (-1, -1)] {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let b = 1u64 << (r * 8 + f);
            attacks |= b;
            if occ & b != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }

    attacks
}

/// Enumerate every subset of `mask` (Carry-Rippler loop).
fn enumerate_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn split_mix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Search for a perfect-hash multiplier for one square. Sparse candidates
/// (AND of three draws) converge within a few thousand tries.
fn find_magic(
    mask: u64,
    shift: u8,
    subsets: &[u64],
    reference: &[u64],
    rng: &mut u64,
) -> (u64, Vec<u64>) {
    let size = 1usize << (64 - shift);
    let mut table = vec![0u64; size];
    let mut used = vec![false; size];

    'candidates: loop {
        let magic = split_mix64(rng) & split_mix64(rng) & split_mix64(rng);
        // cheap rejection: the top bits of the hashed mask must be dense
        if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }

        for slot in used.iter_mut() {
            *slot = false;
        }

        for (i, &occ) in subsets.iter().enumerate() {
            let index = (occ.wrapping_mul(magic) >> shift) as usize;
            if used[index] && table[index] != reference[i] {
                continue 'candidates; // destructive collision, try another magic
            }
            used[index] = true;
            table[index] = reference[i];
        }

        return (magic, table);
    }
}

fn init_magic_tables() -> MagicTables {
    let empty = MagicEntry {
        mask: 0,
        magic: 0,
        shift: 0,
        offset: 0,
    };
    let mut rook_entries = [empty; 64];
    let mut bishop_entries = [empty; 64];
    let mut rook_attacks = Vec::new();
    let mut bishop_attacks = Vec::new();

    let mut rng = MAGIC_SEED;

    for sq in 0..64 {
        let mask = rook_mask(sq);
        let shift = 64 - mask.count_ones() as u8;
        let subsets = enumerate_subsets(mask);
        let reference: Vec<u64> = subsets.iter().map(|&occ| rook_attacks_slow(sq, occ)).collect();
        let (magic, table) = find_magic(mask, shift, &subsets, &reference, &mut rng);
        rook_entries[sq] = MagicEntry {
            mask,
            magic,
            shift,
            offset: rook_attacks.len(),
        };
        rook_attacks.extend_from_slice(&table);

        let mask = bishop_mask(sq);
        let shift = 64 - mask.count_ones() as u8;
        let subsets = enumerate_subsets(mask);
        let reference: Vec<u64> =
            subsets.iter().map(|&occ| bishop_attacks_slow(sq, occ)).collect();
        let (magic, table) = find_magic(mask, shift, &subsets, &reference, &mut rng);
        bishop_entries[sq] = MagicEntry {
            mask,
            magic,
            shift,
            offset: bishop_attacks.len(),
        };
        bishop_attacks.extend_from_slice(&table);
    }

    MagicTables {
        rook_entries,
        bishop_entries,
        rook_attacks,
        bishop_attacks,
    }
}

/// Build the tables. Thread-safe, runs once.
#[inline(always)]
pub fn init() {
    MAGIC_TABLES.get_or_init(init_magic_tables);
}

#[inline]
fn tables() -> &'static MagicTables {
    MAGIC_TABLES.get().expect("magic tables not initialized, call magic::init() first")
}

/// Rook attacks from `sq` given board occupancy.
#[inline]
pub fn rook_attacks(sq: usize, occ: u64) -> u64 {
    let entry = &tables().rook_entries[sq];
    let index = ((occ & entry.mask).wrapping_mul(entry.magic) >> entry.shift) as usize;
    tables().rook_attacks[entry.offset + index]
}

/// Bishop attacks from `sq` given board occupancy.
#[inline]
pub fn bishop_attacks(sq: usize, occ: u64) -> u64 {
    let entry = &tables().bishop_entries[sq];
    let index = ((occ & entry.mask).wrapping_mul(entry.magic) >> entry.shift) as usize;
    tables().bishop_attacks[entry.offset + index]
}

/// Queen attacks are the rook/bishop union.
#[inline]
pub fn queen_attacks(sq: usize, occ: u64) -> u64 {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_empty_board() {
        init();
        // any square sees its full rank and file: 14 squares
        for sq in [0usize, 7, 27, 36, 56, 63] {
            assert_eq!(rook_attacks(sq, 0).count_ones(), 14, "square {}", sq);
        }
    }

    #[test]
    fn rook_blocker_stops_ray() {
        init();
        // rook a8 (sq 0), blocker a5 (sq 24): a7,a6,a5 plus the eighth rank
        let blocker = 1u64 << 24;
        let attacks = rook_attacks(0, blocker);
        assert_eq!(attacks.count_ones(), 10);
        assert!(attacks & blocker != 0, "blocker square itself is attacked");
        assert_eq!(attacks & (1u64 << 32), 0, "ray must stop at the blocker");
    }

    #[test]
    fn bishop_center_and_corner() {
        init();
        assert_eq!(bishop_attacks(27, 0).count_ones(), 13); // central square
        assert_eq!(bishop_attacks(0, 0).count_ones(), 7); // corner diagonal
    }

    #[test]
    fn magic_matches_slow_walker() {
        init();
        // spot-check hashed lookups against the ray walker on mixed occupancies
        let occs = [
            0u64,
            0x0000_0010_0800_4200,
            0xFFFF_0000_0000_FFFF,
            0x0102_0408_1020_4080,
        ];
        for sq in 0..64 {
            for &occ in &occs {
                assert_eq!(rook_attacks(sq, occ), rook_attacks_slow(sq, occ), "rook sq {}", sq);
                assert_eq!(
                    bishop_attacks(sq, occ),
                    bishop_attacks_slow(sq, occ),
                    "bishop sq {}",
                    sq
                );
            }
        }
    }

    #[test]
    fn queen_is_union() {
        init();
        let occ = 0x0000_1200_0040_0000u64;
        assert_eq!(queen_attacks(27, occ), rook_attacks(27, occ) | bishop_attacks(27, occ));
    }
}
