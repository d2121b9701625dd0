//! Error taxonomy for the median-triplet-tree core and its CLI shell.
//!
//! Kinds are listed in rising severity, matching `spec.md` §7. The core
//! itself never retries or recovers; `InputSyntax`/`IOFailure` are surfaced
//! to the CLI layer, which decides whether to reprompt, fall back to
//! stdout, or abort with a non-zero exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MtripError {
    #[error("malformed input at line {line}: {message}")]
    InputSyntax { line: usize, message: String },

    #[error("label universe too large: {n} labels (soft limit {soft}, hard ceiling {hard})", soft = crate::labels::SOFT_LABEL_LIMIT, hard = crate::labels::HARD_LABEL_LIMIT)]
    InputScale { n: usize },

    #[error("failed to allocate {bytes} bytes for {what}")]
    AllocationFailure { what: &'static str, bytes: usize },

    #[error("arithmetic overflow while accumulating {what}")]
    ArithmeticOverflow { what: &'static str },

    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("bincode encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("bincode decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(String),
}
