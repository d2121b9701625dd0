//! File I/O for the CLI layer: reading the one-Newick-string-per-line
//! input format and writing the optimal-tree list.
//!
//! Keeps the teacher's extension-sniffing gzip convention from
//! `write_matrix_tsv` (a `.gz` suffix on the output path triggers
//! compression via `flate2`), generalized here from a fixed TSV matrix
//! shape to a plain line-oriented tree list.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Reads every line of `path` verbatim (comment/blank-line handling is
/// `pipeline::parse_all`'s job, per `spec.md` §6's "lines beginning with
/// '#' are comments").
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    BufReader::new(file).lines().collect()
}

/// Opens `path` for writing, gzip-wrapping when it ends in `.gz`.
pub fn open_output(path: &Path) -> io::Result<Box<dyn Write>> {
    let file = File::create(path)?;
    if path.to_string_lossy().ends_with(".gz") {
        Ok(Box::new(GzEncoder::new(BufWriter::new(file), Compression::default())))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Writes one tree per line to `writer`.
pub fn write_trees<W: Write>(writer: &mut W, trees: &[String]) -> io::Result<()> {
    for tree in trees {
        writeln!(writer, "{tree}")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_lines_preserves_comments_and_blanks() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mtrip-io-test-{}.nwk", std::process::id()));
        std::fs::write(&path, "# comment\n\n((A,B),(C,D));\n").unwrap();
        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec!["# comment".to_string(), "".to_string(), "((A,B),(C,D));".to_string()]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn write_trees_writes_one_per_line() {
        let mut buf = Vec::new();
        write_trees(&mut buf, &["((A,B),C);".to_string(), "((A,C),B);".to_string()]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "((A,B),C);\n((A,C),B);\n");
    }
}
