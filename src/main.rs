use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use mtrip::artifact::Artifact;
use mtrip::enumerate::Enumerator;
use mtrip::io::{open_output, read_lines, write_trees};
use mtrip::pipeline;

/// Reconstruct the exact median triplet tree(s) for a multiset of rooted
/// gene trees (`spec.md` §1).
#[derive(Parser, Debug)]
#[command(name = "mtrip", version, about = "Exact median triplet tree reconstruction")]
struct Args {
    /// Input file: one Newick string per line, `#`-prefixed lines are comments
    input: PathBuf,

    /// Output path for the optimal-tree list (default: stdout); a `.gz`
    /// suffix gzip-compresses the output
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Worker thread count (default: all hardware threads)
    #[arg(short = 't', long = "threads", default_value_t = 0)]
    threads: usize,

    /// Skip Newick validation; malformed lines are skipped with a warning
    #[arg(long = "no-validate", default_value_t = false)]
    no_validate: bool,

    /// Suppress progress messages on stderr
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,

    /// Serialize the full run artifact to this path alongside the tree output
    #[arg(short = 's', long = "save")]
    save: Option<PathBuf>,

    /// Skip the confirmation prompt before overwriting an existing save file
    #[arg(short = 'y', long = "yes", default_value_t = false)]
    yes: bool,
}

fn main() {
    let args = Args::parse();

    let t0 = Instant::now();
    let lines = match read_lines(&args.input) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    let read_s = t0.elapsed().as_secs_f64();
    log_if(!args.quiet, format!("Reading input {read_s:.3}s"));

    let t1 = Instant::now();
    let result = match pipeline::run(&lines, args.threads, !args.no_validate) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let run_s = t1.elapsed().as_secs_f64();
    log_if(
        !args.quiet,
        format!(
            "Computed triplet weights and DP fill for {} taxa, {} input trees in {run_s:.3}s",
            result.n(),
            result.input_trees.len()
        ),
    );

    let t2 = Instant::now();
    let enumerator = Enumerator::new(&result.best, result.labels.reverse_labels());
    let optimal_trees: Vec<String> = enumerator.enumerate(result.universe()).collect();
    let enum_s = t2.elapsed().as_secs_f64();
    log_if(!args.quiet, format!("Enumerated {} optimal trees in {enum_s:.3}s", optimal_trees.len()));

    let t3 = Instant::now();
    let write_result = match &args.output {
        Some(path) => open_output(path).and_then(|mut w| write_trees(&mut w, &optimal_trees)),
        None => write_trees(&mut io::stdout(), &optimal_trees),
    };
    if let Err(e) = write_result {
        eprintln!("failed to write output: {e}");
        std::process::exit(2);
    }
    let write_s = t3.elapsed().as_secs_f64();
    log_write_done(!args.quiet, args.output.as_ref(), write_s);

    if let Some(save_path) = &args.save {
        if save_path.exists() && !args.yes && !confirm_overwrite(save_path) {
            log_if(!args.quiet, "Skipping save.".to_string());
            return;
        }
        let artifact = Artifact::new(
            result.input_trees.clone(),
            optimal_trees.clone(),
            result.labels.reverse_labels().to_vec(),
            result.weights.clone(),
            result.stack.clone(),
            result.best_sparse(),
        );
        if let Err(e) = artifact.save(save_path) {
            eprintln!("failed to save artifact to {save_path:?}: {e}");
            std::process::exit(3);
        }
        log_if(!args.quiet, format!("Saved artifact to {save_path:?}"));
    }
}

fn log_if(show: bool, msg: String) {
    if show {
        eprintln!("{msg}");
    }
}

fn log_write_done(show: bool, output: Option<&PathBuf>, secs: f64) {
    if !show {
        return;
    }
    match output {
        Some(path) => eprintln!("Writing to {path:?} {secs:.3}s"),
        None => eprintln!("Writing to stdout {secs:.3}s"),
    }
}

fn confirm_overwrite(path: &PathBuf) -> bool {
    eprint!("{path:?} already exists; overwrite? [y/N] ");
    io::stderr().flush().ok();
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
