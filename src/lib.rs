//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `error`: the crate-wide error enum.
//! - `bitset`: subset-code bitset utilities (popcount, snoob enumeration).
//! - `labels`: taxon label <-> subset-code bijection and scale guard.
//! - `newick`: recursive-descent Newick reader.
//! - `bipartition`: per-tree bipartition tally.
//! - `weights`: dense triplet-weight table.
//! - `dp`: the bitset DP engine (`stack`/`best`).
//! - `enumerate`: optimal-tree enumerator over `best`.
//! - `artifact`: serialized run artifact (`serde` + `bincode`, optionally gzipped).
//! - `pipeline`: wires the above into a single `run()` entry point.
//! - `suboptimal`: threshold-pruned suboptimal-tree search.
//! - `api`: Python bindings via `pyo3` (gated behind the "python" feature).

pub mod error;
pub mod bitset;
pub mod labels;
pub mod newick;
pub mod bipartition;
pub mod weights;
pub mod dp;
pub mod enumerate;
pub mod artifact;
pub mod io;
pub mod pipeline;
pub mod suboptimal;

#[cfg(feature = "python")]
pub mod api;

pub use error::MtripError;
pub use pipeline::{run, RunResult};
