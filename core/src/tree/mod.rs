//! Persistent concrete syntax trees.
//!
//! Node data is immutable and reference counted. Positions are stored
//! relative to the parent (leading padding, content size, offset of each
//! child), never as absolute offsets, so one subtree can sit at different
//! byte offsets in successive tree versions without being copied.
//!
//! Nodes only point at their children. Parents are found by searching down
//! from the root, which keeps ownership acyclic.

mod cursor;
mod node;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bitflags::bitflags;

pub use cursor::TreeCursor;
pub use node::Node;

use crate::edit::Edit;
use crate::error::InvalidEdit;
use crate::language::Language;
use crate::symbol::{FieldId, KindId, NO_STATE, StateId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct NodeFlags: u8 {
        /// The node is, or contains, an error or missing node.
        const HAS_ERROR = 1;
        /// Zero-width terminal inserted by error recovery.
        const MISSING = 1 << 1;
        /// Shaped by an error recovery decision rather than by the grammar
        /// alone, so a reparse cannot splice it back in.
        const FRAGILE = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Child {
    pub(crate) node: Arc<NodeData>,
    pub(crate) field: Option<FieldId>,
    /// Offset of the child's padded start from the parent's padded start.
    pub(crate) offset: usize,
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: KindId,
    pub(crate) flags: NodeFlags,
    /// State below the node on the parse stack when it was pushed.
    pub(crate) parse_state: StateId,
    pub(crate) padding: usize,
    pub(crate) size: usize,
    /// Bytes past the end that were read to build the node.
    pub(crate) lookahead: usize,
    /// Non-empty terminals under the node.
    pub(crate) tokens: usize,
    pub(crate) children: Box<[Child]>,
}

impl NodeData {
    pub(crate) fn leaf(kind: KindId, padding: usize, size: usize, lookahead: usize) -> Self {
        let flags = if kind == KindId::ERROR {
            NodeFlags::HAS_ERROR
        } else {
            NodeFlags::empty()
        };
        Self {
            kind,
            flags,
            parse_state: NO_STATE,
            padding,
            size,
            lookahead,
            tokens: usize::from(size > 0),
            children: Box::default(),
        }
    }

    pub(crate) fn missing(kind: KindId) -> Self {
        let mut node = Self::leaf(kind, 0, 0, 0);
        node.flags = NodeFlags::MISSING | NodeFlags::HAS_ERROR;
        node
    }

    /// Builds an inner node; `lookahead_end` is relative to the padded start.
    pub(crate) fn branch(
        kind: KindId,
        parse_state: StateId,
        children: Vec<(Arc<NodeData>, Option<FieldId>)>,
        lookahead_end: usize,
    ) -> Self {
        let mut flags = if kind == KindId::ERROR {
            NodeFlags::HAS_ERROR
        } else {
            NodeFlags::empty()
        };
        let mut padding = None;
        let mut offset = 0;
        let mut reach = 0;
        let mut tokens = 0;
        let children: Box<[Child]> = children
            .into_iter()
            .map(|(node, field)| {
                if node.has_error() {
                    flags |= NodeFlags::HAS_ERROR;
                }
                tokens += node.tokens;
                if padding.is_none() && node.size > 0 {
                    padding = Some(offset + node.padding);
                }
                let child = Child {
                    offset,
                    field,
                    node,
                };
                offset += child.node.total();
                reach = reach.max(offset + child.node.lookahead);
                child
            })
            .collect();

        let total = offset;
        let padding = padding.unwrap_or(total);
        Self {
            kind,
            flags,
            parse_state,
            padding,
            size: total - padding,
            lookahead: reach.max(lookahead_end).saturating_sub(total),
            tokens,
            children,
        }
    }

    #[inline]
    pub(crate) fn total(&self) -> usize {
        self.padding + self.size
    }

    #[inline]
    pub(crate) fn has_error(&self) -> bool {
        self.flags.contains(NodeFlags::HAS_ERROR)
    }

    #[inline]
    pub(crate) fn is_missing(&self) -> bool {
        self.flags.contains(NodeFlags::MISSING)
    }

    #[inline]
    pub(crate) fn is_fragile(&self) -> bool {
        self.flags.contains(NodeFlags::FRAGILE)
    }

    /// Leftmost token below this node, and its end relative to this node.
    ///
    /// Zero-width children are passed over while a wider one follows.
    pub(crate) fn first_leaf(&self) -> (&NodeData, usize) {
        let mut node = self;
        let mut offset = 0;
        loop {
            let next = node
                .children
                .iter()
                .find(|c| c.node.total() > 0)
                .or_else(|| node.children.first());
            match next {
                Some(child) => {
                    offset += child.offset;
                    node = &child.node;
                }
                None => return (node, offset + node.total()),
            }
        }
    }
}

impl Drop for NodeData {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        // Deep left-recursive lists would otherwise recurse once per level.
        let mut pending: Vec<Arc<NodeData>> = std::mem::take(&mut self.children)
            .into_vec()
            .into_iter()
            .map(|child| child.node)
            .collect();
        while let Some(node) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(node) {
                pending.extend(
                    std::mem::take(&mut inner.children)
                        .into_vec()
                        .into_iter()
                        .map(|child| child.node),
                );
            }
        }
    }
}

/// An immutable syntax tree for one version of a text.
///
/// Cloning is cheap. [`Tree::edit`] returns a new tree that shares every
/// node with this one and remembers the edit, so that node ranges and the
/// next incremental parse account for it.
#[derive(Clone)]
pub struct Tree {
    pub(crate) root: Arc<NodeData>,
    pub(crate) language: Language,
    /// Length of the text the tree describes, after any pending edit.
    pub(crate) source_len: usize,
    /// Edit applied since parsing, in the coordinates of the parsed text.
    pub(crate) edit: Option<Edit>,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.language.name())
            .field("source_len", &self.source_len)
            .field("edit", &self.edit)
            .finish_non_exhaustive()
    }
}

impl Tree {
    pub(crate) fn new(root: Arc<NodeData>, language: Language, source_len: usize) -> Self {
        Self {
            root,
            language,
            source_len,
            edit: None,
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::root(self)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Length of the text this tree describes, accounting for pending edits.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Combined edit applied with [`Tree::edit`] since the tree was parsed.
    pub fn pending_edit(&self) -> Option<Edit> {
        self.edit
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    /// Records an edit of the text, returning the edited tree.
    ///
    /// The receiver is untouched. Several edits compose into one.
    pub fn edit(&self, edit: &Edit) -> Result<Tree, InvalidEdit> {
        edit.validate(self.source_len)?;
        let combined = match self.edit {
            Some(previous) => previous.compose(edit),
            None => *edit,
        };
        Ok(Tree {
            root: Arc::clone(&self.root),
            language: self.language.clone(),
            source_len: edit.new_len(self.source_len),
            edit: Some(combined),
        })
    }

    /// Every `ERROR` node, invalid token and `MISSING` leaf, in source order.
    pub fn errors(&self) -> Vec<SyntaxError> {
        let mut errors = Vec::new();
        if !self.has_error() {
            return errors;
        }
        let mut stack = vec![self.root_node()];
        while let Some(node) = stack.pop() {
            if !node.has_error() {
                continue;
            }
            let kind = if node.is_missing() {
                Some(SyntaxErrorKind::Missing(node.kind().to_owned()))
            } else if node.is_error_token() {
                Some(SyntaxErrorKind::InvalidToken(node.kind().to_owned()))
            } else if node.is_error() && !node.children().all(|c| c.is_error_token()) {
                Some(SyntaxErrorKind::Unexpected)
            } else {
                None
            };
            if let Some(kind) = kind {
                errors.push(SyntaxError {
                    kind,
                    byte_range: node.byte_range(),
                });
            }
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        errors
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    /// Same kinds, ranges, fields and error flags everywhere.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        self.root_node().structurally_eq(&other.root_node())
    }
}

/// A recovered syntax error, reported for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub byte_range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Input the grammar could not place, wrapped in an `ERROR` node.
    Unexpected,
    /// A token recovery inserted; holds its kind.
    Missing(String),
    /// A token the lexer could not classify; holds its error kind.
    InvalidToken(String),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range { start, end } = self.byte_range;
        match &self.kind {
            SyntaxErrorKind::Unexpected => write!(f, "unexpected input at {start}..{end}"),
            SyntaxErrorKind::Missing(kind) => write!(f, "missing `{kind}` at {start}"),
            SyntaxErrorKind::InvalidToken(kind) => write!(f, "{kind} at {start}..{end}"),
        }
    }
}

impl std::error::Error for SyntaxError {}
