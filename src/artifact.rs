//! Serialized run artifact.
//!
//! Bundles everything `mtrip-combine`/`mtrip-suboptimal` need to resume
//! work without re-reading the original Newick input: the label map, the
//! triplet-weight table, the DP `stack`/`best` tables, and both the
//! original and optimal tree lists. Serialized with `serde` + `bincode`
//! (2.x API), optionally gzip-wrapped when the destination path ends in
//! `.gz`, matching `io.rs`'s output writer.
//!
//! The magic token is validated on load, never on save, and exists purely
//! to reject obviously-unrelated files early with a clear message.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::config;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::bitset::SubsetCode;
use crate::error::MtripError;

const MAGIC: &[u8; 8] = b"MTRIPv01";
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize, Deserialize)]
pub struct Artifact {
    magic: [u8; 8],
    pub version: String,
    pub input_trees: Vec<String>,
    pub optimal_trees: Vec<String>,
    pub reverse_labels: Vec<String>,
    pub weights: Vec<i64>,
    pub stack: Vec<i64>,
    pub best: HashMap<SubsetCode, Vec<(SubsetCode, SubsetCode)>>,
}

impl Artifact {
    pub fn new(
        input_trees: Vec<String>,
        optimal_trees: Vec<String>,
        reverse_labels: Vec<String>,
        weights: Vec<i64>,
        stack: Vec<i64>,
        best: HashMap<SubsetCode, Vec<(SubsetCode, SubsetCode)>>,
    ) -> Self {
        Self {
            magic: *MAGIC,
            version: FORMAT_VERSION.to_string(),
            input_trees,
            optimal_trees,
            reverse_labels,
            weights,
            stack,
            best,
        }
    }

    pub fn n(&self) -> u32 {
        self.reverse_labels.len() as u32
    }

    /// Writes the artifact to `path`, gzip-compressing when the path ends
    /// in `.gz`.
    pub fn save(&self, path: &Path) -> Result<(), MtripError> {
        let bytes = bincode::serde::encode_to_vec(self, config::standard())?;
        let file = File::create(path)?;
        if path.to_string_lossy().ends_with(".gz") {
            let mut enc = GzEncoder::new(BufWriter::new(file), Compression::default());
            enc.write_all(&bytes)?;
            enc.finish()?;
        } else {
            let mut out = BufWriter::new(file);
            out.write_all(&bytes)?;
            out.flush()?;
        }
        Ok(())
    }

    /// Loads an artifact from `path`, validating the magic token. Gzip
    /// input is detected by the `.gz` suffix, matching [`Artifact::save`].
    pub fn load(path: &Path) -> Result<Self, MtripError> {
        let file = File::open(path)?;
        let mut bytes = Vec::new();
        if path.to_string_lossy().ends_with(".gz") {
            GzDecoder::new(BufReader::new(file)).read_to_end(&mut bytes)?;
        } else {
            BufReader::new(file).read_to_end(&mut bytes)?;
        }
        let (artifact, _): (Artifact, usize) = bincode::serde::decode_from_slice(&bytes, config::standard())?;
        if &artifact.magic != MAGIC {
            return Err(MtripError::InvalidArtifact(
                "magic token mismatch: not an mtrip artifact".to_string(),
            ));
        }
        Ok(artifact)
    }
}
