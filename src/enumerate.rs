//! Tree enumerator (`spec.md` §4.5): recursively materializes every binary
//! tree achieving `stack[U]` from the maximizing-split table `best`.
//!
//! Grounded on `examples/original_source/median_tree_reconstruction.py`'s
//! `_get_all_trees`/`get_all_trees` — identical recursive shape: base
//! cases for `|C| ∈ {1,2}`, cross product over `best[C]`'s children
//! recursion otherwise. Per-subset results are memoized behind an `Rc` so
//! that a subset reached through multiple parents is recursed into once;
//! `itertools::iproduct!` drives the cross product inside that recursion.
//! The top-level call across the universe's own tied splits is streamed —
//! it never materializes the combined list of every optimal tree, only the
//! (already-memoized, reference-counted) per-child subtree lists.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use itertools::iproduct;

use crate::bitset::SubsetCode;
use crate::dp::BestTable;

/// Lazily enumerates the optimal-tree set for a fixed `best` table.
pub struct Enumerator<'a> {
    best: &'a BestTable,
    labels: &'a [String],
    memo: RefCell<HashMap<SubsetCode, Rc<Vec<String>>>>,
}

impl<'a> Enumerator<'a> {
    pub fn new(best: &'a BestTable, labels: &'a [String]) -> Self {
        Self {
            best,
            labels,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// All parenthesized (unterminated) expressions for subset `c`,
    /// memoized and shared by reference count across every parent split
    /// that needs them.
    fn trees_for(&self, c: SubsetCode) -> Rc<Vec<String>> {
        if let Some(cached) = self.memo.borrow().get(&c) {
            return Rc::clone(cached);
        }
        let result = match c.count_ones() {
            1 => {
                let bit = c.trailing_zeros() as usize;
                Rc::new(vec![self.labels[bit].clone()])
            }
            2 => {
                let lo = c.trailing_zeros() as usize;
                let hi = (c & !(1 << lo)).trailing_zeros() as usize;
                Rc::new(vec![format!("({},{})", self.labels[lo], self.labels[hi])])
            }
            _ => {
                let mut trees = Vec::new();
                for &(a, b) in &self.best[c as usize] {
                    let a_trees = self.trees_for(a);
                    let b_trees = self.trees_for(b);
                    for (ta, tb) in iproduct!(a_trees.iter(), b_trees.iter()) {
                        trees.push(format!("({ta},{tb})"));
                    }
                }
                Rc::new(trees)
            }
        };
        self.memo.borrow_mut().insert(c, Rc::clone(&result));
        result
    }

    /// Streams every optimal full binary tree over `universe`, each
    /// terminated by `;` (`spec.md` §4.5's "a terminal semicolon is
    /// appended by the top-level caller").
    pub fn enumerate(&self, universe: SubsetCode) -> Box<dyn Iterator<Item = String> + 'a> {
        match universe.count_ones() {
            0 => Box::new(std::iter::empty()),
            1 | 2 => {
                let trees = self.trees_for(universe);
                Box::new((0..trees.len()).map(move |i| format!("{};", trees[i])))
            }
            _ => {
                let splits = self.best[universe as usize].clone();
                Box::new(splits.into_iter().flat_map(move |(a, b)| {
                    let a_trees = self.trees_for(a);
                    let b_trees = self.trees_for(b);
                    let n_b = b_trees.len();
                    (0..a_trees.len() * n_b).map(move |k| {
                        let ta = &a_trees[k / n_b];
                        let tb = &b_trees[k % n_b];
                        format!("({ta},{tb});")
                    })
                }))
            }
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

    fn optimal_trees(trees: &[&str]) -> (Vec<String>, i64) {
        let mut labels = LabelMap::new();
        let parsed: Vec<_> = trees
            .iter()
            .enumerate()
            .map(|(i, t)| parse_line(t, i + 1, &mut labels).unwrap())
            .collect();
        let n = labels.n() as u32;
        let m = tally(&parsed);
        let w = build(&m, n);
        let (stack, best) = fill(&w, n);
        let universe = (1u32 << n) - 1;
        let enumerator = Enumerator::new(&best, labels.reverse_labels());
        let all: Vec<String> = enumerator.enumerate(universe).collect();
        (all, stack[universe as usize])
    }

    #[test]
    fn single_input_tree_is_in_its_own_optimal_set() {
        let (trees, score) = optimal_trees(&["((A,B),(C,D));"]);
        assert!(trees.contains(&"((A,B),(C,D));".to_string()));
        assert_eq!(score, 4); // C(4,3) = 4 triplets, all resolved by the one input tree
    }

    #[test]
    fn scenario_three_taxa_yields_exactly_two_optimal_trees() {
        let (mut trees, score) = optimal_trees(&["((A,B),C);", "((A,C),B);"]);
        trees.sort();
        assert_eq!(score, 1);
        let mut expected = vec!["((A,B),C);".to_string(), "((A,C),B);".to_string()];
        expected.sort();
        assert_eq!(trees, expected);
    }

    #[test]
    fn every_emitted_tree_is_unique() {
        let (trees, _score) = optimal_trees(&["((A,B),(C,D));", "(A,(B,(C,D)));", "((A,C),(B,D));"]);
        let unique: std::collections::HashSet<_> = trees.iter().collect();
        assert_eq!(unique.len(), trees.len());
    }

    #[test]
    fn every_tree_ends_with_semicolon() {
        let (trees, _score) = optimal_trees(&["((A,B),(C,D));"]);
        assert!(trees.iter().all(|t| t.ends_with(';')));
    }

    #[test]
    fn empty_input_enumerates_all_unrooted_topologies_for_four_taxa() {
        // n=4: (2n-3)!! = 5!! = 15 rooted binary topologies.
        let mut labels = LabelMap::new();
        for name in ["A", "B", "C", "D"] {
            labels.assign(name);
        }
        let n = labels.n() as u32;
        let m: std::collections::HashMap<_, _> = std::collections::HashMap::new();
        let w = build(&m, n);
        let (_stack, best) = fill(&w, n);
        let universe = (1u32 << n) - 1;
        let enumerator = Enumerator::new(&best, labels.reverse_labels());
        let all: Vec<String> = enumerator.enumerate(universe).collect();
        assert_eq!(all.len(), 15);
    }
}
