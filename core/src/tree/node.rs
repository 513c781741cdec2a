use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::{Child, NodeData, Tree, TreeCursor};
use crate::symbol::{FieldId, KindId, SymbolFlags};
use crate::text::{LineIndex, Point};

/// A node positioned in a [`Tree`].
///
/// `Node` is a cheap, copyable view: it borrows the tree and knows where
/// its data sits. Byte ranges are reported in the coordinates of the tree's
/// current text, i.e. mapped through any pending edit.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    data: &'t Arc<NodeData>,
    /// Padded start in the coordinates of the parsed text.
    start: usize,
    field: Option<FieldId>,
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range { start, end } = self.byte_range();
        write!(f, "{{Node {} {start}..{end}}}", self.kind())
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && Arc::ptr_eq(self.data, other.data)
            && self.start == other.start
    }
}

impl Eq for Node<'_> {}

impl<'t> Node<'t> {
    pub(crate) fn root(tree: &'t Tree) -> Self {
        Self {
            tree,
            data: &tree.root,
            start: 0,
            field: None,
        }
    }

    fn at(&self, child: &'t Child) -> Self {
        Self {
            tree: self.tree,
            data: &child.node,
            start: self.start + child.offset,
            field: child.field,
        }
    }

    #[inline]
    fn flags(&self) -> SymbolFlags {
        self.tree.language.tables().symbol_flags(self.data.kind)
    }

    #[inline]
    fn map(&self, offset: usize) -> usize {
        match &self.tree.edit {
            Some(edit) => edit.map_offset(offset),
            None => offset,
        }
    }

    /// Identity of the underlying node data.
    ///
    /// Equal ids across two trees mean the second tree reused the subtree.
    pub fn id(&self) -> usize {
        Arc::as_ptr(self.data) as usize
    }

    pub fn kind(&self) -> &'t str {
        self.tree.language.tables().symbol_name(self.data.kind)
    }

    pub fn kind_id(&self) -> KindId {
        self.data.kind
    }

    pub fn is_named(&self) -> bool {
        self.flags().contains(SymbolFlags::NAMED)
    }

    pub fn is_terminal(&self) -> bool {
        self.flags().contains(SymbolFlags::TERMINAL)
    }

    /// Whether this is an `ERROR` node.
    pub fn is_error(&self) -> bool {
        self.data.kind == KindId::ERROR
    }

    /// Whether this is a token the lexer could not classify.
    pub fn is_error_token(&self) -> bool {
        self.flags().contains(SymbolFlags::ERROR_TOKEN)
    }

    pub fn is_missing(&self) -> bool {
        self.data.is_missing()
    }

    pub fn has_error(&self) -> bool {
        self.data.has_error()
    }

    /// Whether a pending edit of the tree touches this node.
    pub fn has_changes(&self) -> bool {
        let end = self.start + self.data.total();
        self.tree
            .edit
            .is_some_and(|edit| edit.touches(self.start, end))
    }

    pub fn start_byte(&self) -> usize {
        self.map(self.start + self.data.padding)
    }

    pub fn end_byte(&self) -> usize {
        self.map(self.start + self.data.total())
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    /// Start and end as row/column points.
    pub fn point_range(&self, index: &LineIndex) -> Range<Point> {
        index.point(self.start_byte())..index.point(self.end_byte())
    }

    /// Source text of the node.
    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Result<&'s str, std::str::Utf8Error> {
        let range = self.byte_range();
        let bytes = source.get(range).unwrap_or_default();
        std::str::from_utf8(bytes)
    }

    /// Field this node occupies in its parent.
    pub fn field_name(&self) -> Option<&'t str> {
        self.tree.language.tables().field_name(self.field?)
    }

    pub fn child_count(&self) -> usize {
        self.data.children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        let data: &'t NodeData = self.data;
        data.children.get(index).map(|c| self.at(c))
    }

    pub fn children(
        &self,
    ) -> impl DoubleEndedIterator<Item = Node<'t>> + ExactSizeIterator + use<'t> {
        let parent = *self;
        let data: &'t NodeData = self.data;
        data.children.iter().map(move |c| parent.at(c))
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        self.children().filter(Node::is_named)
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'t>> {
        self.named_children().nth(index)
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'t str> {
        let field = self.data.children.get(index)?.field?;
        self.tree.language.tables().field_name(field)
    }

    /// First child carrying the field `name`.
    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'t>> {
        self.children_by_field_name(name).next()
    }

    /// Every child carrying the field `name`, in order.
    pub fn children_by_field_name(&self, name: &str) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let field = self.tree.language.field_id_for_name(name);
        self.children()
            .filter(move |child| field.is_some() && child.field == field)
    }

    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor::new(*self)
    }

    /// The node containing this one, found by searching from the root.
    pub fn parent(&self) -> Option<Node<'t>> {
        let end = self.start + self.data.total();
        let mut current = Node::root(self.tree);
        if current == *self {
            return None;
        }
        'descend: loop {
            for child in current.children() {
                if child == *self {
                    return Some(current);
                }
                let child_end = child.start + child.data.total();
                if child.start <= self.start && end <= child_end && !child.data.children.is_empty()
                {
                    // Zero-width nodes can sit on a boundary shared by two
                    // siblings, so keep scanning if this one is not an ancestor.
                    if child.contains_descendant(self) {
                        current = child;
                        continue 'descend;
                    }
                }
            }
            return None;
        }
    }

    fn contains_descendant(&self, target: &Node<'t>) -> bool {
        let end = target.start + target.data.total();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            for child in node.children() {
                if child == *target {
                    return true;
                }
                let child_end = child.start + child.data.total();
                if child.start <= target.start && end <= child_end {
                    stack.push(child);
                }
            }
        }
        false
    }

    fn index_in_parent(&self) -> Option<(Node<'t>, usize)> {
        let parent = self.parent()?;
        let index = parent.children().position(|c| c == *self)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.index_in_parent()?;
        parent.child(index + 1)
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.index_in_parent()?;
        parent.child(index.checked_sub(1)?)
    }

    pub fn next_named_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.index_in_parent()?;
        parent.children().skip(index + 1).find(Node::is_named)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'t>> {
        let (parent, index) = self.index_in_parent()?;
        parent.children().take(index).rev().find(Node::is_named)
    }

    /// Smallest node under this one spanning `[start, end]`.
    ///
    /// For a point query (`start == end`) on the boundary of two tokens, the
    /// token starting there wins.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'t>> {
        let range = self.byte_range();
        if start < range.start || end > range.end {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            let mut fallback = None;
            for child in node.children() {
                let Range {
                    start: child_start,
                    end: child_end,
                } = child.byte_range();
                if child_start == child_end || child_start > start || end > child_end {
                    continue;
                }
                if start < child_end {
                    node = child;
                    continue 'descend;
                }
                fallback.get_or_insert(child);
            }
            match fallback {
                Some(child) => node = child,
                None => return Some(node),
            }
        }
    }

    /// Smallest node under this one spanning the given points.
    pub fn descendant_for_point_range(
        &self,
        index: &LineIndex,
        start: Point,
        end: Point,
    ) -> Option<Node<'t>> {
        let start = index.offset(start)?;
        let end = index.offset(end)?;
        self.descendant_for_byte_range(start, end)
    }

    /// S-expression of the named structure below this node.
    ///
    /// Anonymous tokens are omitted unless they are `MISSING`.
    pub fn to_sexp(&self) -> String {
        enum Step<'t> {
            Enter(Node<'t>),
            Leave,
        }

        let mut out = String::new();
        let mut steps = vec![Step::Enter(*self)];
        let mut is_first = true;
        while let Some(step) = steps.pop() {
            let node = match step {
                Step::Leave => {
                    out.push(')');
                    continue;
                }
                Step::Enter(node) => node,
            };
            let visible = node.is_named() || node.is_missing();
            if visible {
                if !is_first {
                    out.push(' ');
                }
                is_first = false;
                if node != *self {
                    if let Some(field) = node.field_name() {
                        out.push_str(field);
                        out.push_str(": ");
                    }
                }
                if node.is_missing() {
                    if node.is_named() {
                        out.push_str("(MISSING ");
                        out.push_str(node.kind());
                    } else {
                        out.push_str("(MISSING \"");
                        out.push_str(node.kind());
                        out.push('"');
                    }
                } else {
                    out.push('(');
                    out.push_str(node.kind());
                }
                steps.push(Step::Leave);
            }
            for child in node.children().rev() {
                steps.push(Step::Enter(child));
            }
        }
        out
    }

    /// Same kinds, ranges, fields and error flags in both subtrees.
    pub fn structurally_eq(&self, other: &Node<'_>) -> bool {
        let mut pairs = vec![(*self, *other)];
        while let Some((a, b)) = pairs.pop() {
            if a.kind_id() != b.kind_id()
                || a.kind() != b.kind()
                || a.byte_range() != b.byte_range()
                || a.field_name() != b.field_name()
                || a.is_missing() != b.is_missing()
                || a.has_error() != b.has_error()
                || a.child_count() != b.child_count()
            {
                return false;
            }
            pairs.extend(a.children().zip(b.children()));
        }
        true
    }
}
