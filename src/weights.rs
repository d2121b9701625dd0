//! Triplet-weight table builder (`spec.md` §4.3) — the largest component.
//!
//! Builds the dense table `W[A,B]` from the sparse observed-bipartition
//! multiset `M`, addressed through a base-3 packing that halves the naive
//! `(A,B) -> A*2^n+B` table and keeps the whole thing cache-resident up to
//! n ~ 20.
//!
//! Grounded on `examples/original_source/tests/test_triplet_omp.py`'s
//! `create_two2three` test vectors (pinning the exact base-3 digit
//! convention) and `median_tree_reconstruction.py`'s `get_subset_biparts`/
//! `get_weights_parallel` (group-by-support structure, strict-equality
//! choice — see `DESIGN.md` for the Open Question resolution).

use std::collections::HashMap;

use rayon::prelude::*;

use crate::bipartition::Bipartition;
use crate::bitset::{popcount, proper_nonempty_subsets, ternary_digits, SubsetCode};

/// Length of the flat `W` table for a universe of `n` labels:
/// `2 * 3^(n-1)`, per `spec.md` §4.3/§6.
pub fn table_len(n: u32) -> usize {
    if n == 0 {
        return 0;
    }
    2 * 3usize.pow(n - 1)
}

/// Packs a canonical bipartition `(A, B)` (`A < B`, `A & B == 0`) into a
/// dense index in `[0, 2*3^(n-1))`.
///
/// # Derivation
/// `two2three(x) = Σ over set bits i of x of 3^i` reinterprets each bit of
/// `x` as a base-3 digit of value 1. Since `A` and `B` are disjoint,
/// `raw(A,B) = two2three(A) + 2*two2three(B)` has, at every bit position i,
/// ternary digit 1 (in A), 2 (in B), or 0 (in neither) — no carries occur.
/// For a *canonical* pair (A<B numeric), the highest set bit of A∪B is
/// always owned by B: two disjoint integers are ordered by whichever one
/// owns their highest differing (here, highest set) bit, so the larger
/// one, B, must own it. That means digit n-1 of `raw` is never exactly 1
/// for a canonical pair, i.e. `raw` never lands in the "digit n-1 == 1"
/// middle third `[3^(n-1), 2*3^(n-1))`. Folding the upper third down by
/// `3^(n-1)` therefore gives a total, invertible injection into
/// `[0, 2*3^(n-1))`.
pub fn pack_index(a: SubsetCode, b: SubsetCode, n: u32) -> usize {
    debug_assert!(a < b, "pack_index requires a canonical (a<b) pair");
    debug_assert_eq!(a & b, 0, "pack_index requires disjoint a,b");
    let half = 3u64.pow(n - 1);
    let raw = ternary_digits(a) + 2 * ternary_digits(b);
    let idx = if raw < half { raw } else { raw - half };
    idx as usize
}

/// Inverse of [`pack_index`]: recovers the canonical `(A, B)` pair packed
/// at `index`.
pub fn unpack_index(index: usize, n: u32) -> (SubsetCode, SubsetCode) {
    let half = 3u64.pow(n - 1);
    let idx = index as u64;
    // pack_index's two branches have disjoint images ([0,half) vs
    // [half,2*half)), so which branch produced `idx` is recoverable from
    // `idx` alone.
    let raw = if idx < half { idx } else { idx + half };
    let mut a: SubsetCode = 0;
    let mut b: SubsetCode = 0;
    let mut rem = raw;
    for i in 0..n {
        match rem % 3 {
            1 => a |= 1 << i,
            2 => b |= 1 << i,
            _ => {}
        }
        rem /= 3;
    }
    (a, b)
}

fn choose_2(m: u32) -> u64 {
    if m == 0 {
        0
    } else {
        (m as u64) * (m as u64 - 1) / 2
    }
}

/// Number of rooted triplets resolved identically by query split `(a,b)`
/// and observed split `(ap,bp)` (`spec.md` §4.3's contribution formula).
fn contribution(a: SubsetCode, b: SubsetCode, ap: SubsetCode, bp: SubsetCode) -> u64 {
    let aa = popcount(a & ap);
    let bb = popcount(b & bp);
    let ab = popcount(a & bp);
    let ba = popcount(b & ap);
    choose_2(aa) * bb as u64 + choose_2(ab) * ba as u64 + choose_2(ba) * ab as u64 + choose_2(bb) * aa as u64
}

/// Builds the dense triplet-weight table from the observed-bipartition
/// multiset `M`, for a universe of `n` labels.
///
/// Uses the **strict** subset-indexing variant (`spec.md` §9 Open Question
/// (a)): an observed bipartition `(A',B')` only contributes to query
/// splits `(A,B)` whose combined support `A∪B` equals `A'∪B'` exactly.
/// Work is partitioned across distinct observed supports — each support
/// writes only to the `W` indices of the query splits of that one support,
/// which never overlap the indices written for a different support, so no
/// atomics are needed. As in `dp.rs`, the parallel region is a safe
/// collect-then-scatter rather than unsafe disjoint-slice writes.
pub fn build(m: &HashMap<Bipartition, u64>, n: u32) -> Vec<i64> {
    let mut table = vec![0i64; table_len(n)];
    if n == 0 {
        return table;
    }

    let mut by_support: HashMap<SubsetCode, Vec<(SubsetCode, SubsetCode, u64)>> = HashMap::new();
    for (&(a, b), &count) in m.iter() {
        by_support.entry(a | b).or_default().push((a, b, count));
    }

    let updates: Vec<(usize, i64)> = by_support
        .par_iter()
        .flat_map_iter(|(&support, observed)| {
            proper_nonempty_subsets(support).filter_map(move |s| {
                let complement = support & !s;
                if s >= complement {
                    return None;
                }
                let total: i64 = observed
                    .iter()
                    .map(|&(oa, ob, count)| (contribution(s, complement, oa, ob) * count) as i64)
                    .sum();
                if total == 0 {
                    None
                } else {
                    Some((pack_index(s, complement, n), total))
                }
            })
        })
        .collect();

    for (idx, val) in updates {
        table[idx] += val;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two2three_vectors_match_reference() {
        assert_eq!((0u32..4).map(ternary_digits).collect::<Vec<_>>(), vec![0, 1, 3, 4]);
    }

    #[test]
    fn pack_index_round_trips() {
        let n = 5;
        for a in 0u32..(1 << n) {
            for b in 0u32..(1 << n) {
                if a & b != 0 || a == 0 || b == 0 {
                    continue;
                }
                let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                let idx = pack_index(lo, hi, n);
                assert!(idx < table_len(n));
                assert_eq!(unpack_index(idx, n), (lo, hi));
            }
        }
    }

    #[test]
    fn pack_index_n3_six_pairs_are_distinct() {
        // Scenario 4 from spec.md §8.
        let n = 3;
        let pairs = [
            (0b001, 0b010),
            (0b001, 0b100),
            (0b010, 0b100),
            (0b011, 0b100),
            (0b001, 0b110),
            (0b010, 0b101),
        ];
        let mut seen = std::collections::HashSet::new();
        for &(a, b) in &pairs {
            let idx = pack_index(a, b, n);
            assert!(idx < table_len(n));
            assert!(seen.insert(idx), "duplicate index for ({a},{b})");
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn table_len_matches_spec_formula() {
        for n in 1..=10u32 {
            assert_eq!(table_len(n), 2 * 3usize.pow(n - 1));
        }
    }

    #[test]
    fn identical_splits_contribute_maximal_triplets() {
        // A split (A,B) compared against itself should count every
        // triplet it resolves: C(|A|,2)*|B| + C(|B|,2)*|A|.
        let a = 0b0011;
        let b = 0b1100;
        let expected = choose_2(popcount(a)) * popcount(b) as u64 + choose_2(popcount(b)) * popcount(a) as u64;
        assert_eq!(contribution(a, b, a, b), expected);
    }

    #[test]
    fn disjoint_splits_contribute_nothing() {
        assert_eq!(contribution(1, 2, 4, 8), 0);
    }

    #[test]
    fn build_matches_hand_worked_cherry_example() {
        // Inputs ((A,B),C) and ((A,C),B) over {A,B,C}: two splits with
        // support 0b111, each observed once.
        let mut m = HashMap::new();
        m.insert(crate::bipartition::canonical(0b011, 0b100), 1u64); // (A,B)|C
        m.insert(crate::bipartition::canonical(0b101, 0b010), 1u64); // (A,C)|B
        let table = build(&m, 3);

        // W[(A,B),C] should count: itself (contribution 1) plus overlap
        // with (A,C)|B.
        let self_contribution = contribution(0b011, 0b100, 0b011, 0b100);
        let cross_contribution = contribution(0b011, 0b100, 0b101, 0b010);
        let idx = pack_index(0b011, 0b100, 3);
        assert_eq!(table[idx] as u64, self_contribution + cross_contribution);
    }
}
