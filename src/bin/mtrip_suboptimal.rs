//! Suboptimal-tree utility (`SPEC_FULL.md` §6.5, binary name
//! `mtrip-suboptimal`).
//!
//! Loads a saved artifact and prints trees scoring at or above a threshold
//! derived from `-m/--minscore` and `-f/--fraction`, each preceded by a
//! `#score` comment line, matching
//! `examples/original_source/src/mtrip/cli/mtrip_suboptimal_cmd.py`'s output
//! format.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use mtrip::artifact::Artifact;
use mtrip::io::open_output;
use mtrip::suboptimal::{find_suboptimal_trees, threshold};

/// Sample trees with suboptimal (but still high) triplet scores from a
/// saved `mtrip` artifact.
#[derive(Parser, Debug)]
#[command(name = "mtrip-suboptimal", version, about = "Sample suboptimal median triplet trees")]
struct Args {
    /// Input artifact produced by `mtrip -s`
    input: PathBuf,

    /// Output path (default: stdout)
    output: Option<PathBuf>,

    /// Each tree must score at least this (absolute floor, -1 disables)
    #[arg(short = 'm', long = "minscore", default_value_t = -1)]
    minscore: i64,

    /// Each tree must score at least this fraction of the maximal score
    #[arg(short = 'f', long = "fraction", default_value_t = 0.99)]
    fraction: f64,

    /// Output at most this many trees
    #[arg(short = 'n', long = "ntrees", default_value_t = 100)]
    ntrees: usize,

    /// Candidate pool size gathered before random sampling (default: 4x ntrees)
    #[arg(short = 'b', long = "burnin")]
    burnin: Option<usize>,

    /// RNG seed for the random walk over remaining splits
    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,
}

fn main() {
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.fraction) || args.fraction == 0.0 {
        eprintln!("invalid fraction {}: must be in (0, 1]", args.fraction);
        std::process::exit(1);
    }
    if args.ntrees == 0 {
        eprintln!("invalid ntrees: must be positive");
        std::process::exit(1);
    }
    let burnin = args.burnin.unwrap_or(4 * args.ntrees);
    if burnin < args.ntrees {
        eprintln!("burnin ({burnin}) must be at least ntrees ({})", args.ntrees);
        std::process::exit(1);
    }

    let artifact = match Artifact::load(&args.input) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("failed to load {:?}: {e}", args.input);
            std::process::exit(1);
        }
    };

    let n = artifact.n();
    let universe = (1u32 << n) - 1;
    let max_score = artifact.stack[universe as usize];
    eprintln!("Data for {n} species and maximum triplet score {max_score}.");

    let min_score = threshold(max_score, args.minscore, args.fraction);
    eprintln!("Setting minimum viable tree score to {min_score} (max of -m and -f flags)");

    let trees = find_suboptimal_trees(
        &artifact.weights,
        &artifact.stack,
        n,
        &artifact.reverse_labels,
        min_score,
        args.ntrees,
        burnin,
        args.seed,
    );
    eprintln!("Found {} trees satisfying the given constraints.", trees.len());

    let mut lines = Vec::with_capacity(trees.len() * 2);
    for (score, nwk) in &trees {
        lines.push(format!("#{score}"));
        lines.push(nwk.clone());
    }

    let write_result = match &args.output {
        Some(path) => open_output(path).and_then(|mut w| write_lines(&mut w, &lines)),
        None => write_lines(&mut io::stdout(), &lines),
    };
    if let Err(e) = write_result {
        eprintln!("failed to write output: {e}");
        std::process::exit(1);
    }
}

fn write_lines<W: Write>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}
