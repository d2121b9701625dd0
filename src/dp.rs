//! Dynamic-programming engine: fills `stack` and `best` by increasing
//! cardinality layer.
//!
//! Tie-break logic: a strictly higher score clears and restarts the tied-
//! split list; an equal score appends to it. Parallelism is a safe
//! "collect-then-scatter" per layer (`rayon`'s `par_iter().map().collect()`
//! as the fork-join barrier between layers) rather than unsafe
//! disjoint-slice writes — no `unsafe` appears anywhere in this crate.

use rayon::prelude::*;

use crate::bitset::{proper_nonempty_subsets, subsets_of_cardinality, SubsetCode};
use crate::weights::pack_index;

/// All splits of a subset achieving its maximum triplet score, keyed by
/// subset code (dense `Vec`, index == subset code, matching `stack`'s
/// layout). Empty for every `C` with `popcount(C) < 3` (no admissible
/// split — leaves and cherries contribute no internal split).
pub type BestTable = Vec<Vec<(SubsetCode, SubsetCode)>>;

/// Fills `stack[C]` (max triplet score of any binary tree on `C`) and
/// `best[C]` (every split achieving that maximum) for every `C` with
/// `0 <= C <= 2^n - 1`, in increasing-cardinality order.
///
/// `w` must be the triplet-weight table built by [`crate::weights::build`]
/// for the same `n`.
pub fn fill(w: &[i64], n: u32) -> (Vec<i64>, BestTable) {
    let size = 1usize << n;
    let mut stack = vec![0i64; size];
    let mut best: BestTable = vec![Vec::new(); size];

    if n < 3 {
        return (stack, best);
    }

    let universe: SubsetCode = (1u32 << n) - 1;

    for k in 3..=n {
        let layer: Vec<SubsetCode> = subsets_of_cardinality(universe, k).collect();
        let results: Vec<(SubsetCode, i64, Vec<(SubsetCode, SubsetCode)>)> = layer
            .par_iter()
            .map(|&c| {
                let mut max_score = i64::MIN;
                let mut ties: Vec<(SubsetCode, SubsetCode)> = Vec::new();
                for a in proper_nonempty_subsets(c) {
                    let b = c & !a;
                    if a >= b {
                        continue;
                    }
                    let score = w[pack_index(a, b, n)] + stack[a as usize] + stack[b as usize];
                    if score > max_score {
                        max_score = score;
                        ties.clear();
                        ties.push((a, b));
                    } else if score == max_score {
                        ties.push((a, b));
                    }
                }
                (c, max_score, ties)
            })
            .collect();

        for (c, score, ties) in results {
            stack[c as usize] = score;
            best[c as usize] = ties;
        }
    }

    (stack, best)
}
