//! Core entry point (`spec.md` §6): wires the five core components —
//! bitset utilities, bipartition tally, triplet-weight table, DP engine,
//! tree enumerator — plus the Newick reader and label map into a single
//! `run()` call.
//!
//! The only process-wide state is the `rayon` thread pool, scoped to the
//! lifetime of this call (`spec.md` §5/§9's "the spec forbids long-lived
//! global state in the core"), matching the teacher's own scoped use of
//! `rayon` (no global thread-pool singleton anywhere in `main.rs`/`api.rs`).

use std::collections::HashMap;

use crate::bipartition::{tally, Bipartition};
use crate::bitset::SubsetCode;
use crate::dp::{self, BestTable};
use crate::error::MtripError;
use crate::labels::LabelMap;
use crate::newick::{self, ParsedNode};
use crate::weights;

/// Everything downstream consumers (the CLI, `mtrip-combine`,
/// `mtrip-suboptimal`, the artifact writer, the Python bindings) need.
pub struct RunResult {
    pub labels: LabelMap,
    pub input_trees: Vec<String>,
    pub weights: Vec<i64>,
    pub stack: Vec<i64>,
    pub best: BestTable,
}

impl RunResult {
    pub fn n(&self) -> u32 {
        self.labels.n() as u32
    }

    pub fn universe(&self) -> SubsetCode {
        self.labels.universe()
    }

    /// `best`, reshaped into the sparse `HashMap` form `spec.md` §3/§6
    /// describes (entries with `popcount(C) < 3` are never populated and
    /// are dropped here rather than serialized as empty lists).
    pub fn best_sparse(&self) -> HashMap<SubsetCode, Vec<(SubsetCode, SubsetCode)>> {
        self.best
            .iter()
            .enumerate()
            .filter(|(_, splits)| !splits.is_empty())
            .map(|(c, splits)| (c as SubsetCode, splits.clone()))
            .collect()
    }
}

/// Parses every non-comment, non-blank line of `lines` (file-level `#`
/// comments per `spec.md` §6), building the shared label map as it goes.
///
/// When `validate` is `false` (the CLI's `--no-validate`), a malformed
/// line is skipped with a warning on stderr instead of aborting the whole
/// run — `spec.md` §7 puts all recovery policy on the CLI, not the core.
pub fn parse_all(lines: &[String], validate: bool) -> Result<(Vec<ParsedNode>, Vec<String>, LabelMap), MtripError> {
    let mut labels = LabelMap::new();
    let mut trees = Vec::new();
    let mut kept_lines = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match newick::parse_line(trimmed, i + 1, &mut labels) {
            Ok(node) => {
                trees.push(node);
                kept_lines.push(trimmed.to_string());
            }
            Err(e) if !validate => {
                eprintln!("warning: skipping line {}: {e}", i + 1);
            }
            Err(e) => return Err(e),
        }
    }

    labels.check_scale()?;
    Ok((trees, kept_lines, labels))
}

/// Runs the full pipeline — bipartition tally, triplet-weight table, DP
/// fill — over `lines` using a thread pool of `n_threads` workers (0 means
/// let `rayon` pick, i.e. `std::thread::available_parallelism()`).
pub fn run(lines: &[String], n_threads: usize, validate: bool) -> Result<RunResult, MtripError> {
    let (trees, input_trees, labels) = parse_all(lines, validate)?;
    let n = labels.n() as u32;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if n_threads > 0 {
        builder = builder.num_threads(n_threads);
    }
    let pool = builder.build().map_err(|e| MtripError::ThreadPool(e.to_string()))?;

    let (weights, stack, best) = pool.install(|| {
        let m: HashMap<Bipartition, u64> = tally(&trees);
        let weights = weights::build(&m, n);
        let (stack, best) = dp::fill(&weights, n);
        (weights, stack, best)
    });

    Ok(RunResult {
        labels,
        input_trees,
        weights,
        stack,
        best,
    })
}
