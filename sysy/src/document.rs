//! An open source file: its text, line index and current tree.
//!
//! Editors report changes as a row/column range plus replacement text. A
//! [`Document`] turns each change into an [`Edit`], splices the text and
//! reparses incrementally, so the tree always matches the text.

use sysy_parser_core::{Edit, InvalidEdit, Language, LineIndex, Node, Parser, Point, Tree};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("position {0} is outside the document")]
    PointOutOfRange(Point),

    #[error("change starts at {start} after it ends at {end}")]
    InvertedRange { start: Point, end: Point },

    #[error(transparent)]
    InvalidEdit(#[from] InvalidEdit),
}

pub struct Document {
    text: Vec<u8>,
    lines: LineIndex,
    tree: Tree,
    parser: Parser,
}

impl Document {
    pub fn new(language: &Language, text: impl Into<Vec<u8>>) -> Self {
        Self::with_parser(Parser::new(language), text)
    }

    /// Opens a document with a configured parser.
    pub fn with_parser(mut parser: Parser, text: impl Into<Vec<u8>>) -> Self {
        let text = text.into();
        let tree = parser.parse(&text);
        Self {
            lines: LineIndex::new(&text),
            text,
            tree,
            parser,
        }
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Replaces the text between `start` and `end` with `replacement`.
    ///
    /// On error the document is unchanged.
    pub fn apply_change(
        &mut self,
        start: Point,
        end: Point,
        replacement: &str,
    ) -> Result<&Tree, DocumentError> {
        let start_byte = self
            .lines
            .offset(start)
            .ok_or(DocumentError::PointOutOfRange(start))?;
        let end_byte = self
            .lines
            .offset(end)
            .ok_or(DocumentError::PointOutOfRange(end))?;
        if start_byte > end_byte {
            return Err(DocumentError::InvertedRange { start, end });
        }
        let edit = Edit::replace(start_byte..end_byte, replacement.len());
        self.apply_edit(&edit, replacement.as_bytes())
    }

    /// Applies a byte-level edit whose new bytes are `replacement`.
    pub fn apply_edit(&mut self, edit: &Edit, replacement: &[u8]) -> Result<&Tree, DocumentError> {
        let text = edit.apply(&self.text, replacement)?;
        let tree = self.parser.parse_incremental(&self.tree, edit, &text)?;
        trace!(
            start = edit.start_byte,
            old_end = edit.old_end_byte,
            new_end = edit.new_end_byte,
            has_error = tree.has_error(),
            "document changed"
        );
        self.lines = LineIndex::new(&text);
        self.text = text;
        self.tree = tree;
        Ok(&self.tree)
    }

    /// Replaces the whole text and parses it from scratch.
    pub fn replace_all(&mut self, text: impl Into<Vec<u8>>) -> &Tree {
        self.text = text.into();
        self.lines = LineIndex::new(&self.text);
        self.tree = self.parser.parse(&self.text);
        &self.tree
    }

    /// Smallest node covering `point`. On a token boundary the token
    /// starting there wins.
    pub fn token_at(&self, point: Point) -> Option<Node<'_>> {
        self.tree
            .root_node()
            .descendant_for_point_range(&self.lines, point, point)
    }

    /// Text of `node`, which must belong to this document's tree.
    pub fn node_text(&self, node: Node<'_>) -> Option<&str> {
        node.utf8_text(&self.text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_grammar;

    fn open(text: &str) -> Document {
        Document::new(&load_grammar().unwrap(), text)
    }

    #[test]
    fn test_change_by_points() {
        let mut doc = open("int main() {\n  return 0;\n}\n");
        doc.apply_change(Point::new(1, 9), Point::new(1, 10), "42")
            .unwrap();
        assert_eq!(doc.text(), b"int main() {\n  return 42;\n}\n");
        assert!(!doc.tree().has_error());
        assert_eq!(doc.line_index().len(), doc.text().len());

        let literal = doc.token_at(Point::new(1, 10)).unwrap();
        assert_eq!(literal.kind(), "decimal_literal");
        assert_eq!(doc.node_text(literal), Some("42"));
    }

    #[test]
    fn test_rejected_change_leaves_document_alone() {
        let mut doc = open("int a;\n");
        let before = doc.tree().to_sexp();
        assert_eq!(
            doc.apply_change(Point::new(5, 0), Point::new(5, 0), "x")
                .unwrap_err(),
            DocumentError::PointOutOfRange(Point::new(5, 0))
        );
        assert!(matches!(
            doc.apply_change(Point::new(0, 4), Point::new(0, 2), ""),
            Err(DocumentError::InvertedRange { .. })
        ));
        assert_eq!(doc.text(), b"int a;\n");
        assert_eq!(doc.tree().to_sexp(), before);
    }

    #[test]
    fn test_replace_all() {
        let mut doc = open("int a;");
        let tree = doc.replace_all("void f() {}");
        assert_eq!(
            tree.root_node().child(0).unwrap().kind(),
            "function_definition"
        );
    }
}
