//! Hand-written recursive-descent Newick reader.
//!
//! Grounded on `examples/original_source/median_tree_reconstruction.py`'s
//! `splitter`/`get_biparts` — a hand-rolled recursive splitter, not a
//! general-purpose Newick library. A full library (the teacher's
//! `phylotree`) was dropped: it carries a branch-length-aware, mutable tree
//! model that this crate never needs, since only the split set of each tree
//! matters downstream (`spec.md` Non-goals exclude branch lengths).
//!
//! Branch lengths, internal node labels, and BEAST-style `[&...]`
//! annotations are parsed and discarded rather than rejected — they are a
//! Non-goal, not a syntax error. Only unlabeled tips, unbalanced
//! parentheses, and a missing trailing `;` are rejected.

use crate::error::MtripError;
use crate::labels::LabelMap;

/// A parsed input tree, reduced to its topology. Leaves already carry the
/// bit position assigned by the shared [`LabelMap`]; internal nodes keep
/// their full child list so that polytomies survive into the bipartition
/// tally (`bipartition.rs`), where they are resolved into the binary splits
/// they induce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNode {
    Leaf(u32),
    Internal(Vec<ParsedNode>),
}

/// Parses one Newick line (without its trailing comment/blank handling,
/// which is the caller's job — see `pipeline::read_input_file`) into a
/// [`ParsedNode`], assigning any new taxon names to `labels` in the order
/// they are first encountered.
pub fn parse_line(line: &str, line_no: usize, labels: &mut LabelMap) -> Result<ParsedNode, MtripError> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let body = compact.strip_suffix(';').ok_or_else(|| MtripError::InputSyntax {
        line: line_no,
        message: "missing trailing ';'".to_string(),
    })?;
    if body.is_empty() {
        return Err(MtripError::InputSyntax {
            line: line_no,
            message: "empty tree".to_string(),
        });
    }

    let mut parser = Parser {
        bytes: body.as_bytes(),
        pos: 0,
        line_no,
    };
    let node = parser.parse_node(labels)?;
    if parser.pos != parser.bytes.len() {
        return Err(MtripError::InputSyntax {
            line: line_no,
            message: format!("unexpected trailing characters at byte {}", parser.pos),
        });
    }
    Ok(node)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    line_no: usize,
}

const DELIMS: &[u8] = b",():;[";

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn err(&self, message: impl Into<String>) -> MtripError {
        MtripError::InputSyntax {
            line: self.line_no,
            message: message.into(),
        }
    }

    fn parse_node(&mut self, labels: &mut LabelMap) -> Result<ParsedNode, MtripError> {
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let mut children = vec![self.parse_node(labels)?];
            loop {
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        children.push(self.parse_node(labels)?);
                    }
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => return Err(self.err("expected ',' or ')' inside subtree")),
                    None => return Err(self.err("unbalanced parentheses: unterminated subtree")),
                }
            }
            if children.len() < 2 {
                return Err(self.err("internal node with fewer than two children"));
            }
            // Internal node label, if any, is discarded.
            self.skip_token();
            self.skip_branch_length()?;
            Ok(ParsedNode::Internal(children))
        } else {
            let token = self.read_token();
            if token.is_empty() {
                return Err(self.err("unlabeled tip"));
            }
            self.skip_branch_length()?;
            let bit = labels.assign(token);
            Ok(ParsedNode::Leaf(bit))
        }
    }

    /// Reads a bare token (taxon name or discarded internal label) up to
    /// the next structural delimiter, discarding any BEAST-style `[&...]`
    /// annotation that directly follows it.
    fn read_token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if DELIMS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        let token = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("");
        self.skip_annotation();
        token
    }

    fn skip_token(&mut self) {
        let _ = self.read_token();
    }

    fn skip_annotation(&mut self) {
        if self.peek() == Some(b'[') {
            self.pos += 1;
            while let Some(b) = self.peek() {
                self.pos += 1;
                if b == b']' {
                    break;
                }
            }
        }
    }

    fn skip_branch_length(&mut self) -> Result<(), MtripError> {
        if self.peek() == Some(b':') {
            self.pos += 1;
            self.skip_annotation();
            let start = self.pos;
            while let Some(b) = self.peek() {
                if DELIMS.contains(&b) {
                    break;
                }
                self.pos += 1;
            }
            if self.pos == start {
                return Err(self.err("missing branch length after ':'"));
            }
            self.skip_annotation();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_cherry() {
        let mut labels = LabelMap::new();
        let node = parse_line("(A,B);", 1, &mut labels).unwrap();
        assert_eq!(node, ParsedNode::Internal(vec![ParsedNode::Leaf(0), ParsedNode::Leaf(1)]));
    }

    #[test]
    fn parses_nested_topology() {
        let mut labels = LabelMap::new();
        let node = parse_line("((A,B),(C,D));", 1, &mut labels).unwrap();
        assert_eq!(
            node,
            ParsedNode::Internal(vec![
                ParsedNode::Internal(vec![ParsedNode::Leaf(0), ParsedNode::Leaf(1)]),
                ParsedNode::Internal(vec![ParsedNode::Leaf(2), ParsedNode::Leaf(3)]),
            ])
        );
    }

    #[test]
    fn strips_branch_lengths_and_internal_labels() {
        let mut labels = LabelMap::new();
        let node = parse_line("((A:0.1,B:0.2)X:0.3,C:0.4);", 1, &mut labels).unwrap();
        assert_eq!(
            node,
            ParsedNode::Internal(vec![
                ParsedNode::Internal(vec![ParsedNode::Leaf(0), ParsedNode::Leaf(1)]),
                ParsedNode::Leaf(2),
            ])
        );
    }

    #[test]
    fn strips_beast_annotations() {
        let mut labels = LabelMap::new();
        let node = parse_line("(A:[&rate=1.0]0.1,B:[&rate=2.0]0.2);", 1, &mut labels).unwrap();
        assert_eq!(node, ParsedNode::Internal(vec![ParsedNode::Leaf(0), ParsedNode::Leaf(1)]));
    }

    #[test]
    fn reuses_bit_positions_for_repeated_labels_across_lines() {
        let mut labels = LabelMap::new();
        parse_line("(A,B);", 1, &mut labels).unwrap();
        let node = parse_line("(B,A);", 2, &mut labels).unwrap();
        assert_eq!(node, ParsedNode::Internal(vec![ParsedNode::Leaf(1), ParsedNode::Leaf(0)]));
    }

    #[test]
    fn rejects_unlabeled_tip() {
        let mut labels = LabelMap::new();
        let err = parse_line("(A,);", 1, &mut labels).unwrap_err();
        assert!(matches!(err, MtripError::InputSyntax { line: 1, .. }));
    }

    #[test]
    fn rejects_missing_semicolon() {
        let mut labels = LabelMap::new();
        let err = parse_line("(A,B)", 1, &mut labels).unwrap_err();
        assert!(matches!(err, MtripError::InputSyntax { .. }));
    }

    #[test]
    fn rejects_unbalanced_parens() {
        let mut labels = LabelMap::new();
        let err = parse_line("((A,B);", 1, &mut labels).unwrap_err();
        assert!(matches!(err, MtripError::InputSyntax { .. }));
    }

    #[test]
    fn handles_polytomy() {
        let mut labels = LabelMap::new();
        let node = parse_line("(A,B,C);", 1, &mut labels).unwrap();
        assert_eq!(
            node,
            ParsedNode::Internal(vec![ParsedNode::Leaf(0), ParsedNode::Leaf(1), ParsedNode::Leaf(2)])
        );
    }
}
