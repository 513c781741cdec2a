//! Walks the previous tree looking for subtrees to splice into a reparse.

use std::sync::Arc;

use tracing::trace;

use crate::edit::Edit;
use crate::tree::{Child, NodeData};

struct Frame<'t> {
    parent: &'t NodeData,
    /// Index of the current child.
    index: usize,
    /// Padded start of the current child in the old text.
    start: usize,
}

/// Left-to-right cursor over the nodes of an edited tree.
///
/// The cursor only ever moves forward. Positions passed in are offsets in the
/// new text; node positions are mapped through the edit before comparing.
pub(super) struct ReuseCursor<'t> {
    frames: Vec<Frame<'t>>,
    edit: Option<Edit>,
}

impl<'t> ReuseCursor<'t> {
    pub(super) fn new(root: &'t NodeData, edit: Option<Edit>) -> Self {
        Self {
            frames: vec![Frame {
                parent: root,
                index: 0,
                start: 0,
            }],
            edit,
        }
    }

    fn current(&self) -> Option<(&'t Child, usize)> {
        let frame = self.frames.last()?;
        let child = frame.parent.children.get(frame.index)?;
        Some((child, frame.start))
    }

    fn map(&self, offset: usize) -> usize {
        match &self.edit {
            Some(edit) => edit.map_offset(offset),
            None => offset,
        }
    }

    /// Moves past the current node.
    pub(super) fn advance(&mut self) {
        while let Some(frame) = self.frames.last_mut() {
            if let Some(child) = frame.parent.children.get(frame.index) {
                frame.start += child.node.total();
                frame.index += 1;
            }
            if frame.index < frame.parent.children.len() {
                return;
            }
            // The exhausted parent is the current node of the frame below.
            self.frames.pop();
        }
    }

    /// Moves to the first child of the current node.
    pub(super) fn descend(&mut self) -> bool {
        let Some((child, start)) = self.current() else {
            return false;
        };
        if child.node.children.is_empty() {
            return false;
        }
        self.frames.push(Frame {
            parent: &child.node,
            index: 0,
            start,
        });
        true
    }

    /// Finds an unchanged node starting exactly at `position`.
    ///
    /// A node is unchanged when the edit touches neither its bytes, nor its
    /// padding, nor the bytes read past its end to build it. Nodes holding
    /// errors and nodes shaped by error recovery are never reused.
    pub(super) fn candidate_at(&mut self, position: usize) -> Option<Arc<NodeData>> {
        loop {
            let (child, old_start) = self.current()?;
            let node = &child.node;
            let start = self.map(old_start);
            if start > position {
                return None;
            }
            let old_end = old_start + node.total();
            if start < position {
                if self.map(old_end) <= position || !self.descend() {
                    self.advance();
                }
                continue;
            }

            let reach = old_end + node.lookahead.saturating_sub(1);
            let dirty = self.edit.is_some_and(|e| e.touches(old_start, reach));
            if dirty || node.has_error() || node.is_fragile() || node.total() == 0 {
                trace!(
                    kind = node.kind.0,
                    position,
                    dirty,
                    has_error = node.has_error(),
                    fragile = node.is_fragile(),
                    "cannot reuse node"
                );
                if !self.descend() {
                    self.advance();
                }
                continue;
            }
            return Some(Arc::clone(node));
        }
    }
}
