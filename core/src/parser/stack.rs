//! The parse stack and node construction.

use std::sync::Arc;

use crate::symbol::{FieldId, KindId, StateId, SymbolFlags};
use crate::tables::{ParseTables, RuleInfo};
use crate::tree::{NodeData, NodeFlags};

type Children = Vec<(Arc<NodeData>, Option<FieldId>)>;

#[derive(Debug)]
pub(super) struct Entry {
    pub(super) state: StateId,
    pub(super) node: Arc<NodeData>,
    /// Extras (error nodes) repeat the state below them.
    pub(super) extra: bool,
    /// End of the node in the new text.
    pub(super) end: usize,
}

/// Stack of `(state, node)` entries over an implicit base state 0.
///
/// The `ERROR` extra on top of the stack is kept open while recovery keeps
/// adding to it, so long runs of skipped input are not rebuilt per token.
pub(super) struct Stack<'a> {
    tables: &'a ParseTables,
    entries: Vec<Entry>,
    open_error: Children,
    open_end: usize,
    /// Entries below this index were on the stack during the latest error
    /// recovery. Nodes reduced from them are fragile.
    recovered_below: usize,
}

impl<'a> Stack<'a> {
    pub(super) fn new(tables: &'a ParseTables, entries: Vec<Entry>) -> Self {
        debug_assert!(entries.is_empty());
        Self {
            tables,
            entries,
            open_error: Vec::new(),
            open_end: 0,
            recovered_below: 0,
        }
    }

    /// Gives back the entry buffer for the next parse.
    pub(super) fn into_entries(mut self) -> Vec<Entry> {
        self.entries.clear();
        self.entries
    }

    pub(super) fn state(&self) -> StateId {
        self.entries.last().map_or(0, |e| e.state)
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len() + usize::from(!self.open_error.is_empty())
    }

    fn entries_end(&self) -> usize {
        self.entries.last().map_or(0, |e| e.end)
    }

    /// Where the next token starts.
    pub(super) fn end(&self) -> usize {
        if self.open_error.is_empty() {
            self.entries_end()
        } else {
            self.open_end
        }
    }

    /// States of the non-extra entries, with the base state first.
    pub(super) fn states(&self) -> Vec<StateId> {
        std::iter::once(0)
            .chain(self.entries.iter().filter(|e| !e.extra).map(|e| e.state))
            .collect()
    }

    /// Cost of popping the top `d` non-extra entries, for every `d` up to
    /// the number of non-extra entries.
    ///
    /// An entry costs the tokens it holds, and at least one. Extras are free.
    pub(super) fn pop_costs(&self) -> Vec<usize> {
        let mut total = 0;
        std::iter::once(0)
            .chain(self.entries.iter().rev().filter(|e| !e.extra).map(|e| {
                total += e.node.tokens.max(1);
                total
            }))
            .collect()
    }

    /// Records that recovery has made a decision with the current stack.
    pub(super) fn mark_recovery(&mut self) {
        self.recovered_below = self.entries.len();
    }

    pub(super) fn push(&mut self, state: StateId, node: Arc<NodeData>) {
        self.seal();
        let end = self.entries_end() + node.total();
        self.entries.push(Entry {
            state,
            node,
            extra: false,
            end,
        });
    }

    fn push_extra(&mut self, node: Arc<NodeData>) {
        let end = self.entries_end() + node.total();
        self.entries.push(Entry {
            state: self.state(),
            node,
            extra: true,
            end,
        });
    }

    /// Adds skipped input to the `ERROR` extra on top, opening one if needed.
    pub(super) fn push_error(&mut self, pieces: Vec<Arc<NodeData>>) {
        if self.open_error.is_empty() {
            self.open_end = self.entries_end();
            let top_is_error = self
                .entries
                .last()
                .is_some_and(|e| e.extra && e.node.kind == KindId::ERROR);
            if top_is_error {
                if let Some(entry) = self.entries.pop() {
                    self.open_end = self.entries_end();
                    self.add_error_piece(entry.node);
                }
            }
        }
        for piece in pieces {
            self.add_error_piece(piece);
        }
    }

    fn add_error_piece(&mut self, piece: Arc<NodeData>) {
        let mut work = vec![piece];
        while let Some(node) = work.pop() {
            let flatten = !node.children.is_empty()
                && (node.kind == KindId::ERROR || self.is_hidden(node.kind));
            if flatten {
                work.extend(node.children.iter().rev().map(|c| Arc::clone(&c.node)));
            } else {
                self.open_end += node.total();
                self.open_error.push((node, None));
            }
        }
    }

    /// Turns the open `ERROR` run into a stack entry.
    fn seal(&mut self) {
        if self.open_error.is_empty() {
            return;
        }
        let children = std::mem::take(&mut self.open_error);
        let node = NodeData::branch(KindId::ERROR, self.state(), children, 0);
        self.push_extra(Arc::new(node));
    }

    /// Pops `depth` non-extra entries and every extra above and between them.
    ///
    /// The nodes come back in source order.
    pub(super) fn pop_non_extra(&mut self, depth: usize) -> Vec<Arc<NodeData>> {
        self.seal();
        let mut popped = Vec::new();
        let mut remaining = depth;
        while remaining > 0 {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            if !entry.extra {
                remaining -= 1;
            }
            popped.push(entry.node);
        }
        self.recovered_below = self.recovered_below.min(self.entries.len());
        popped.reverse();
        popped
    }

    /// Applies `rule`, returning `false` if the tables have no goto for it.
    ///
    /// `lookahead_end` is the absolute end of the bytes read to decide on the
    /// reduction.
    pub(super) fn reduce(&mut self, rule: &RuleInfo, lookahead_end: usize) -> bool {
        self.seal();
        let mut trailing = Vec::new();
        while self.entries.last().is_some_and(|e| e.extra) {
            if let Some(entry) = self.entries.pop() {
                trailing.push(entry.node);
            }
        }

        let mut children = Vec::with_capacity(rule.len());
        let mut remaining = rule.len();
        while remaining > 0 {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            if entry.extra {
                children.push((entry.node, None));
            } else {
                remaining -= 1;
                let field = rule.fields.get(remaining).copied().flatten();
                children.push((entry.node, field));
            }
        }
        children.reverse();

        let fragile = self.entries.len() < self.recovered_below
            || children.iter().any(|(node, _)| node.is_fragile());
        self.recovered_below = self.recovered_below.min(self.entries.len());

        let below = self.state();
        let start = self.entries_end();
        let children = if self.is_hidden(rule.lhs) {
            children
        } else {
            self.flatten(children)
        };
        let mut node = NodeData::branch(
            rule.lhs,
            below,
            children,
            lookahead_end.saturating_sub(start),
        );
        if fragile {
            node.flags |= NodeFlags::FRAGILE;
        }

        let pushed = match self.tables.goto(below, rule.lhs) {
            Some(next) => {
                self.push(next, Arc::new(node));
                true
            }
            None => {
                self.push_error(vec![Arc::new(node)]);
                false
            }
        };
        for node in trailing.into_iter().rev() {
            self.seal();
            self.push_extra(node);
        }
        pushed
    }

    fn is_hidden(&self, kind: KindId) -> bool {
        self.tables
            .symbol_flags(kind)
            .contains(SymbolFlags::HIDDEN)
    }

    /// Splices hidden children into a visible parent.
    ///
    /// A spliced node keeps its own field, or takes the one of the hidden
    /// node it came from.
    fn flatten(&self, children: Children) -> Children {
        let mut out = Vec::with_capacity(children.len());
        let mut work: Children = children.into_iter().rev().collect();
        while let Some((node, field)) = work.pop() {
            if self.is_hidden(node.kind) {
                work.extend(
                    node.children
                        .iter()
                        .rev()
                        .map(|c| (Arc::clone(&c.node), c.field.or(field))),
                );
            } else {
                out.push((node, field));
            }
        }
        out
    }

    /// Builds the root from whatever the stack holds.
    ///
    /// Nodes of the start symbol are spliced into the root.
    pub(super) fn into_root(mut self, start: KindId, source_len: usize) -> (NodeData, Vec<Entry>) {
        self.seal();
        let mut children = Vec::new();
        for entry in self.entries.drain(..) {
            if !entry.extra && entry.node.kind == start {
                children.extend(
                    entry
                        .node
                        .children
                        .iter()
                        .map(|c| (Arc::clone(&c.node), c.field)),
                );
            } else {
                children.push((entry.node, None));
            }
        }
        let children = self.flatten(children);
        let mut root = NodeData::branch(start, crate::symbol::NO_STATE, children, 0);
        root.padding = 0;
        root.size = source_len;
        root.lookahead = 0;
        (root, self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    /// `list -> _items`, `_items -> _items item | item`, `item -> a`.
    fn tables() -> (ParseTables, KindId, KindId) {
        let mut g = GrammarBuilder::new("list");
        let a = g.terminal("a", true).unwrap();
        let list = g.nonterminal("list").unwrap();
        let items = g.nonterminal("_items").unwrap();
        let item = g.nonterminal("item").unwrap();
        let field = g.field("entry");
        g.rule(list, [field.on(items)]).unwrap();
        g.rule(items, [items, item]).unwrap();
        g.rule(items, [item]).unwrap();
        g.rule(item, [a]).unwrap();
        g.start(list);
        let tables = ParseTables::build(&g.build().unwrap()).unwrap();
        (tables, a, item)
    }

    fn leaf(kind: KindId, padding: usize, size: usize) -> Arc<NodeData> {
        Arc::new(NodeData::leaf(kind, padding, size, 1))
    }

    #[test]
    fn test_error_run_stays_one_node() {
        let (tables, a, _) = tables();
        let mut stack = Stack::new(&tables, Vec::new());
        stack.push_error(vec![leaf(a, 0, 1)]);
        stack.push_error(vec![leaf(a, 1, 1)]);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.end(), 3);
        // Sealing and reopening merges into the same node.
        let popped = stack.pop_non_extra(0);
        assert!(popped.is_empty());
        stack.push_error(vec![leaf(a, 0, 2)]);
        let (root, _) = stack.into_root(KindId(3), 5);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].node.kind, KindId::ERROR);
        assert_eq!(root.children[0].node.children.len(), 3);
        assert!(root.has_error());
    }

    fn shift_a(tables: &ParseTables, stack: &mut Stack<'_>, a: KindId, padding: usize) {
        let crate::tables::Action::Shift(next) = tables.action(stack.state(), a) else {
            unreachable!("`a` starts an item");
        };
        stack.push(next, leaf(a, padding, 1));
    }

    #[test]
    fn test_reduction_over_recovered_entries_is_fragile() {
        let (tables, a, item) = tables();
        let rule = tables
            .rules
            .iter()
            .find(|r| r.lhs == item)
            .cloned()
            .unwrap();

        let mut stack = Stack::new(&tables, Vec::new());
        shift_a(&tables, &mut stack, a, 0);
        assert!(stack.reduce(&rule, 2));
        assert!(!stack.entries[0].node.is_fragile());

        let mut stack = Stack::new(&tables, Vec::new());
        shift_a(&tables, &mut stack, a, 0);
        stack.mark_recovery();
        assert!(stack.reduce(&rule, 2));
        assert!(stack.entries[0].node.is_fragile());
    }

    #[test]
    fn test_pop_costs_count_tokens() {
        let (tables, a, _) = tables();
        let mut stack = Stack::new(&tables, Vec::new());
        shift_a(&tables, &mut stack, a, 0);
        stack.push_error(vec![leaf(a, 1, 1)]);
        let missing = Arc::new(NodeData::missing(a));
        stack.push(stack.state(), missing);
        // The error extra is free and the empty entry still costs one.
        assert_eq!(stack.pop_costs(), vec![0, 1, 2]);
    }

    #[test]
    fn test_trailing_extras_stay_above_reduced_node() {
        let (tables, a, item) = tables();
        let mut stack = Stack::new(&tables, Vec::new());
        let rule = tables
            .rules
            .iter()
            .find(|r| r.lhs == item)
            .cloned()
            .unwrap();
        let crate::tables::Action::Shift(next) = tables.action(0, a) else {
            unreachable!("state 0 shifts `a`");
        };
        stack.push(next, leaf(a, 0, 1));
        stack.push_error(vec![leaf(a, 1, 1)]);
        assert!(stack.reduce(&rule, 3));
        assert_eq!(stack.entries.len(), 2);
        assert_eq!(stack.entries[0].node.kind, item);
        assert_eq!(stack.entries[0].end, 1);
        assert!(stack.entries[1].extra);
        assert_eq!(stack.entries[1].state, stack.entries[0].state);
        assert_eq!(stack.end(), 3);
    }
}
