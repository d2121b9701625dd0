//! Combine utility (`SPEC_FULL.md` §6.4, binary name `mtrip-combine`).
//!
//! Ported from `examples/original_source/src/mtrip/cli/mtrip_combine_cmd.py`:
//! loads two or more saved artifacts, requires identical label universes,
//! sums their triplet-weight tables element-wise, concatenates their input
//! tree lists, re-runs the DP engine and enumerator over the combined
//! weights, and writes a fresh combined artifact plus its optimal-tree list.

use std::path::{Path, PathBuf};

use clap::Parser;

use mtrip::artifact::Artifact;
use mtrip::dp;
use mtrip::enumerate::Enumerator;

/// Combine two or more `mtrip` weight artifacts into one.
#[derive(Parser, Debug)]
#[command(name = "mtrip-combine", version, about = "Combine mtrip weight artifacts")]
struct Args {
    /// Artifacts to combine (at least two required)
    #[arg(required = true, num_args = 2..)]
    artifacts: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut artifacts = Vec::with_capacity(args.artifacts.len());
    for path in &args.artifacts {
        match Artifact::load(path) {
            Ok(a) => artifacts.push(a),
            Err(e) => {
                eprintln!("failed to load {path:?}: {e}");
                std::process::exit(1);
            }
        }
    }

    let (first, rest) = artifacts.split_first().expect("clap enforces >= 2 artifacts");
    let reverse_labels = first.reverse_labels.clone();
    let n = first.n();
    let mut weights = first.weights.clone();
    let mut input_trees = first.input_trees.clone();

    for other in rest {
        if other.reverse_labels != reverse_labels {
            eprintln!("artifacts do not share the same label universe; aborting");
            std::process::exit(1);
        }
        for (w, ow) in weights.iter_mut().zip(&other.weights) {
            *w += ow;
        }
        input_trees.extend(other.input_trees.iter().cloned());
    }

    eprintln!("Computing stack");
    let (stack, best) = dp::fill(&weights, n);
    eprintln!("Finding the median trees");
    let universe = (1u32 << n) - 1;
    let enumerator = Enumerator::new(&best, &reverse_labels);
    let optimal_trees: Vec<String> = enumerator.enumerate(universe).collect();

    let best_sparse = best
        .into_iter()
        .enumerate()
        .filter(|(_, splits)| !splits.is_empty())
        .map(|(c, splits)| (c as u32, splits))
        .collect();

    let combined = Artifact::new(input_trees, optimal_trees, reverse_labels, weights, stack, best_sparse);

    let output_path = pick_output_path();
    if let Err(e) = combined.save(&output_path) {
        eprintln!("failed to write combined artifact to {output_path:?}: {e}");
        std::process::exit(1);
    }
    eprintln!("Wrote combined weights artifact to {output_path:?}.");
}

/// Never clobbers an existing `combined_weights` artifact: suffixes with
/// `_1`, `_2`, ... until a free name is found, matching the Python
/// original's behavior.
fn pick_output_path() -> PathBuf {
    let base = "combined_weights";
    let candidate = PathBuf::from(format!("{base}.bin"));
    if !Path::new(&candidate).exists() {
        return candidate;
    }
    let mut suffix = 1;
    loop {
        let candidate = PathBuf::from(format!("{base}_{suffix}.bin"));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}
