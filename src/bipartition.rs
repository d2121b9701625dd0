//! Bipartition tally.
//!
//! Walks each parsed tree's split set and accumulates the observed-
//! bipartition multiset `M`, using a DFS/bottom-up-bitset-caching walk over
//! each tree.
//!
//! Two resolved design decisions, recorded in full in `DESIGN.md`:
//! - The root's own split IS recorded: `((A,B),(C,D));` tallies `AB|CD` like
//!   any other internal split.
//! - A k>2 polytomy contributes one split per child: `(subtree(child),
//!   subtree(parent) - subtree(child))`. Every such split is realized by
//!   every binary resolution of the star, so this is sound, and it is a
//!   no-op on strictly binary input.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::bitset::SubsetCode;
use crate::newick::ParsedNode;

/// Canonical bipartition key: `(A, B)` with `A < B` (numeric), `A & B == 0`.
pub type Bipartition = (SubsetCode, SubsetCode);

/// Canonicalizes a disjoint pair into `(min, max)` order. Every store and
/// query of a bipartition funnels through this helper so the `A < B`
/// invariant can never drift.
#[inline]
pub fn canonical(a: SubsetCode, b: SubsetCode) -> Bipartition {
    if a < b { (a, b) } else { (b, a) }
}

/// Computes the subset code of every node in `tree` (post-order) and
/// accumulates each internal node's induced splits into `out`.
///
/// Returns the subset code of `tree` itself (the union of all its leaves),
/// needed by the caller to recurse.
fn walk(tree: &ParsedNode, out: &mut HashMap<Bipartition, u64>) -> SubsetCode {
    match tree {
        ParsedNode::Leaf(bit) => 1u32 << bit,
        ParsedNode::Internal(children) => {
            let child_codes: Vec<SubsetCode> = children.iter().map(|c| walk(c, out)).collect();
            let total = child_codes.iter().fold(0, |acc, &c| acc | c);
            if child_codes.len() == 2 {
                // A genuine binary split: the two children induce the same
                // bipartition, so record it exactly once.
                let (c1, c2) = (child_codes[0], child_codes[1]);
                if c1 != 0 && c2 != 0 {
                    *out.entry(canonical(c1, c2)).or_insert(0) += 1;
                }
            } else {
                // A polytomy contributes one child|rest split per child.
                for &child_code in &child_codes {
                    let complement = total & !child_code;
                    if child_code != 0 && complement != 0 {
                        *out.entry(canonical(child_code, complement)).or_insert(0) += 1;
                    }
                }
            }
            total
        }
    }
}

/// Builds the observed-bipartition multiset `M` from a list of already-
/// parsed input trees. Trees are tallied independently and in parallel,
/// with each worker's local shard merged into the final map at the end —
/// no atomics needed.
pub fn tally(trees: &[ParsedNode]) -> HashMap<Bipartition, u64> {
    trees
        .par_iter()
        .map(|tree| {
            let mut local = HashMap::new();
            walk(tree, &mut local);
            local
        })
        .reduce(HashMap::new, |mut acc, shard| {
            for (key, count) in shard {
                *acc.entry(key).or_insert(0) += count;
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelMap;
    use crate::newick::parse_line;

    fn parse(line: &str, labels: &mut LabelMap) -> ParsedNode {
        parse_line(line, 1, labels).unwrap()
    }

    #[test]
    fn cherry_tree_tallies_root_and_both_cherries() {
        let mut labels = LabelMap::new();
        let tree = parse("((A,B),(C,D));", &mut labels);
        let m = tally(std::slice::from_ref(&tree));

        // A=0b0001 B=0b0010 C=0b0100 D=0b1000
        assert_eq!(m.get(&canonical(0b0001, 0b0010)), Some(&1)); // (A,B)
        assert_eq!(m.get(&canonical(0b0100, 0b1000)), Some(&1)); // (C,D)
        assert_eq!(m.get(&canonical(0b0011, 0b1100)), Some(&1)); // root AB|CD
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn every_entry_is_canonical() {
        let mut labels = LabelMap::new();
        let tree = parse("((A,B),(C,D));", &mut labels);
        let m = tally(std::slice::from_ref(&tree));
        for (a, b) in m.keys() {
            assert!(a < b);
            assert_eq!(a & b, 0);
        }
    }

    #[test]
    fn polytomy_contributes_one_split_per_child() {
        let mut labels = LabelMap::new();
        let tree = parse("(A,B,C);", &mut labels);
        let m = tally(std::slice::from_ref(&tree));
        // A=1 B=2 C=4; splits: A|(B,C)=1|6, B|(A,C)=2|5, C|(A,B)=4|3
        assert_eq!(m.get(&canonical(1, 6)), Some(&1));
        assert_eq!(m.get(&canonical(2, 5)), Some(&1));
        assert_eq!(m.get(&canonical(4, 3)), Some(&1));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn repeated_trees_accumulate_counts() {
        let mut labels = LabelMap::new();
        let t1 = parse("((A,B),(C,D));", &mut labels);
        let t2 = parse("((A,B),(C,D));", &mut labels);
        let t3 = parse("((A,B),(C,D));", &mut labels);
        let m = tally(&[t1, t2, t3]);
        assert_eq!(m.get(&canonical(0b0001, 0b0010)), Some(&3));
        assert_eq!(m.get(&canonical(0b0011, 0b1100)), Some(&3));
    }

    #[test]
    fn single_leaf_tree_has_no_splits() {
        let m = tally(&[ParsedNode::Leaf(0)]);
        assert!(m.is_empty());
    }
}
