//! Suboptimal-tree utility (`spec.md` §6, `SPEC_FULL.md` §6.5), backing
//! the `mtrip-suboptimal` binary.
//!
//! Ported from `examples/original_source/src/mtrip/cli/mtrip_suboptimal_cmd.py`'s
//! `get_candidates`/`get_nwk` (algorithm, not Python idiom): a layered,
//! threshold-pruned split-search down from the universe, burn-in capped,
//! then completed by a seeded random walk over the remaining splits of
//! each surviving candidate.

use std::collections::HashMap;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bitset::{popcount, proper_nonempty_subsets, SubsetCode};
use crate::weights::pack_index;

/// `τ = max(minscore, ⌈fraction · max_score⌉)` (`spec.md` §6's
/// `τ = max(−m, ⌈f·stack[U]⌉)`; `minscore` here already carries its own
/// sign, matching the CLI's `-m/--minscore` flag directly rather than the
/// Python prototype's `-1`-as-unset sentinel baked into the formula).
pub fn threshold(max_score: i64, minscore: i64, fraction: f64) -> i64 {
    let frac_score = (fraction * max_score as f64).ceil() as i64;
    minscore.max(frac_score)
}

#[derive(Clone)]
struct Candidate {
    score: i64,
    biparts: HashMap<SubsetCode, (SubsetCode, SubsetCode)>,
    active: Vec<SubsetCode>,
}

fn canonical_splits(x: SubsetCode) -> impl Iterator<Item = (SubsetCode, SubsetCode)> {
    proper_nonempty_subsets(x).filter_map(move |a| {
        let b = x & !a;
        (a < b).then_some((a, b))
    })
}

fn potential(weights: &[i64], stack: &[i64], n: u32, a: SubsetCode, b: SubsetCode) -> i64 {
    weights[pack_index(a, b, n)] + stack[a as usize] + stack[b as usize]
}

fn split_active(candidate: &mut Candidate, combo: &[(SubsetCode, SubsetCode)], weights: &[i64], n: u32) {
    candidate.active.clear();
    for &(a, b) in combo {
        candidate.score += weights[pack_index(a, b, n)];
        candidate.biparts.insert(a | b, (a, b));
        for x in [a, b] {
            if popcount(x) > 2 {
                candidate.active.push(x);
            }
        }
    }
}

/// Finds up to `count` distinct trees over a universe of `n` labels whose
/// triplet score is `>= min_score`, returned sorted by descending score.
///
/// `burnin` bounds how many partially-split candidates are gathered before
/// a uniform random subsample of size `count` is drawn and each is fully
/// refined by a seeded random walk over its remaining active subsets.
pub fn find_suboptimal_trees(
    weights: &[i64],
    stack: &[i64],
    n: u32,
    labels: &[String],
    min_score: i64,
    count: usize,
    burnin: usize,
    seed: u64,
) -> Vec<(i64, String)> {
    if n == 0 || count == 0 {
        return Vec::new();
    }
    let universe: SubsetCode = (1u32 << n) - 1;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut finished: Vec<Candidate> = Vec::new();

    for (a, b) in canonical_splits(universe) {
        if potential(weights, stack, n, a, b) < min_score {
            continue;
        }
        let mut candidate = Candidate {
            score: weights[pack_index(a, b, n)],
            biparts: HashMap::new(),
            active: Vec::new(),
        };
        candidate.biparts.insert(universe, (a, b));
        for x in [a, b] {
            if popcount(x) > 2 {
                candidate.active.push(x);
            }
        }
        if candidate.active.is_empty() {
            finished.push(candidate);
        } else {
            candidates.push(candidate);
        }
    }

    // Burn-in: keep refining active candidates until we have `burnin`
    // finished-or-active candidates, or nothing more can be split.
    while !candidates.is_empty() && candidates.len() + finished.len() < burnin {
        let mut new_candidates = Vec::new();
        let mut reached_cap = false;

        'candidates: for candidate in &candidates {
            let per_subset: Vec<Vec<(SubsetCode, SubsetCode)>> =
                candidate.active.iter().map(|&x| canonical_splits(x).collect()).collect();

            for combo in per_subset.into_iter().multi_cartesian_product() {
                let total_potential: i64 = combo.iter().map(|&(a, b)| potential(weights, stack, n, a, b)).sum();
                if total_potential < min_score - candidate.score {
                    continue;
                }
                let mut next = candidate.clone();
                split_active(&mut next, &combo, weights, n);
                if next.active.is_empty() {
                    finished.push(next);
                } else {
                    new_candidates.push(next);
                }
                if new_candidates.len() + finished.len() >= burnin {
                    reached_cap = true;
                    break 'candidates;
                }
            }
        }

        candidates = new_candidates;
        if reached_cap {
            break;
        }
    }

    let pool: Vec<Candidate> = candidates.into_iter().chain(finished).collect();
    let mut chosen: Vec<Candidate> = if pool.len() <= count {
        pool
    } else {
        (0..count).map(|_| pool[rng.random_range(0..pool.len())].clone()).collect()
    };

    // Fully refine each chosen candidate via a seeded random walk over its
    // remaining active subsets.
    for candidate in chosen.iter_mut() {
        while !candidate.active.is_empty() {
            let per_subset: Vec<Vec<(SubsetCode, SubsetCode)>> =
                candidate.active.iter().map(|&x| canonical_splits(x).collect()).collect();
            let possible: Vec<Vec<(SubsetCode, SubsetCode)>> = per_subset
                .into_iter()
                .multi_cartesian_product()
                .filter(|combo| {
                    let total_potential: i64 = combo.iter().map(|&(a, b)| potential(weights, stack, n, a, b)).sum();
                    total_potential >= min_score - candidate.score
                })
                .collect();
            if possible.is_empty() {
                break;
            }
            let combo = possible[rng.random_range(0..possible.len())].clone();
            split_active(candidate, &combo, weights, n);
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<(i64, String)> = Vec::new();
    for candidate in &chosen {
        let nwk = render_nwk(universe, labels, &candidate.biparts);
        if seen.insert(nwk.clone()) {
            out.push((candidate.score, nwk));
        }
    }
    out.sort_by(|a, b| b.0.cmp(&a.0));
    out
}

/// Renders a fully-resolved candidate's bipartition map into a Newick
/// string, terminated by `;`. `biparts` must cover every internal subset
/// on the path from `universe` down to the leaves.
pub fn render_nwk(universe: SubsetCode, labels: &[String], biparts: &HashMap<SubsetCode, (SubsetCode, SubsetCode)>) -> String {
    format!("{};", render(universe, labels, biparts))
}

fn render(x: SubsetCode, labels: &[String], biparts: &HashMap<SubsetCode, (SubsetCode, SubsetCode)>) -> String {
    match x.count_ones() {
        1 => labels[x.trailing_zeros() as usize].clone(),
        2 => {
            let lo = x.trailing_zeros() as usize;
            let hi = (x & !(1 << lo)).trailing_zeros() as usize;
            format!("({},{})", labels[lo], labels[hi])
        }
        _ => {
            let &(a, b) = biparts.get(&x).expect("candidate biparts must cover every internal subset");
            format!("({},{})", render(a, labels, biparts), render(b, labels, biparts))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bipartition::tally;
    use crate::dp::fill;
    use crate::labels::LabelMap;
    use crate::newick::parse_line;
    use crate::weights::build;

    fn setup(trees: &[&str]) -> (Vec<i64>, Vec<i64>, u32, Vec<String>) {
        let mut labels = LabelMap::new();
        let parsed: Vec<_> = trees
            .iter()
            .enumerate()
            .map(|(i, t)| parse_line(t, i + 1, &mut labels).unwrap())
            .collect();
        let n = labels.n() as u32;
        let m = tally(&parsed);
        let w = build(&m, n);
        let (stack, _best) = fill(&w, n);
        (w, stack, n, labels.reverse_labels().to_vec())
    }

    #[test]
    fn threshold_takes_the_larger_of_floor_and_fraction() {
        assert_eq!(threshold(100, -1, 0.5), 50);
        assert_eq!(threshold(100, 80, 0.5), 80);
        assert_eq!(threshold(10, -1, 0.99), 10);
    }

    #[test]
    fn finds_at_least_the_known_optimum() {
        let (w, stack, n, labels) = setup(&["((A,B),(C,D));", "((A,B),(C,D));", "((A,B),(C,D));"]);
        let universe = (1u32 << n) - 1;
        let max_score = stack[universe as usize];
        let trees = find_suboptimal_trees(&w, &stack, n, &labels, max_score, 10, 40, 0);
        assert!(!trees.is_empty());
        assert!(trees.iter().all(|(score, _)| *score >= max_score));
        assert!(trees.iter().any(|(_, nwk)| nwk == "((A,B),(C,D));"));
    }

    #[test]
    fn every_result_is_distinct() {
        let (w, stack, n, labels) = setup(&["((A,B),(C,D));", "(A,(B,(C,D)));", "((A,C),(B,D));"]);
        let universe = (1u32 << n) - 1;
        let max_score = stack[universe as usize];
        let trees = find_suboptimal_trees(&w, &stack, n, &labels, (max_score as f64 * 0.0) as i64, 50, 100, 7);
        let unique: std::collections::HashSet<_> = trees.iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(unique.len(), trees.len());
    }

    #[test]
    fn results_are_sorted_descending_by_score() {
        let (w, stack, n, labels) = setup(&["((A,B),(C,D));", "(A,(B,(C,D)));", "((A,C),(B,D));"]);
        let trees = find_suboptimal_trees(&w, &stack, n, &labels, 0, 50, 100, 3);
        let scores: Vec<i64> = trees.iter().map(|(s, _)| *s).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(scores, sorted);
    }
}
