//! Error recovery.
//!
//! When the lookahead token has no action, the parser tries, in order:
//!
//! 1. Tokens the lexer could not classify are wrapped in an `ERROR` node and
//!    skipped.
//! 2. A zero-width `MISSING` token is inserted if that lets the lookahead be
//!    shifted. At the end of input a short sequence of them may be inserted.
//! 3. A bounded search over `k` skipped tokens and `d` popped stack entries
//!    picks the cheapest pair after which the parse can continue. A skipped
//!    token costs 3 and a popped entry costs the tokens it holds (at least
//!    1), so a complete construct is only torn apart when that discards less
//!    than skipping would. Fewer skipped tokens win a tie. Everything
//!    skipped or popped goes into one `ERROR` node.
//! 4. Otherwise the lookahead alone is skipped.
//!
//! Every path consumes input or makes the lookahead shiftable, so parsing
//! terminates. Candidates are checked by simulating the parser on a copy of
//! the state stack, never by mutating the real one.
//!
//! Steps 2 to 4 look at the whole stack and at tokens well past the
//! lookahead. Nodes later reduced from entries that were on the stack at
//! that point are marked fragile and never reused by a reparse.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use tracing::trace;

use super::{Lookahead, Run};
use crate::symbol::{KindId, StateId, SymbolFlags};
use crate::tables::{Action, ParseTables};
use crate::tree::NodeData;

/// Upper bound on simulated actions per candidate.
const MAX_SIMULATION_STEPS: usize = 10_000;

/// Weight of one skipped token against one popped token.
const SKIP_COST: usize = 3;

pub(super) enum Recovery {
    Resume(Lookahead),
    /// The end of input was reached and no state can accept it.
    Finish,
}

/// A state stack made of a borrowed prefix and an owned suffix.
#[derive(Clone)]
struct SimStack<'a> {
    base: &'a [StateId],
    base_len: usize,
    overlay: Vec<StateId>,
}

impl<'a> SimStack<'a> {
    /// The stack with `depth` entries popped. The base state is never popped.
    fn new(base: &'a [StateId], depth: usize) -> Self {
        Self {
            base,
            base_len: base.len().saturating_sub(depth).max(1),
            overlay: Vec::new(),
        }
    }

    fn top(&self) -> StateId {
        match self.overlay.last() {
            Some(&state) => state,
            None => self.base.get(self.base_len - 1).copied().unwrap_or(0),
        }
    }

    fn pop(&mut self, count: usize) {
        let from_overlay = count.min(self.overlay.len());
        self.overlay.truncate(self.overlay.len() - from_overlay);
        self.base_len = self
            .base_len
            .saturating_sub(count - from_overlay)
            .max(1);
    }

    fn push(&mut self, state: StateId) {
        self.overlay.push(state);
    }
}

/// Runs the parser on `kind` until it is shifted or accepted.
fn feed(tables: &ParseTables, stack: &mut SimStack<'_>, kind: KindId) -> bool {
    for _ in 0..MAX_SIMULATION_STEPS {
        match tables.action(stack.top(), kind) {
            Action::Shift(next) => {
                stack.push(next);
                return true;
            }
            Action::Accept => return true,
            Action::Reduce(rule) => {
                let Some(info) = tables.rule(rule) else {
                    return false;
                };
                stack.pop(info.len());
                let Some(next) = tables.goto(stack.top(), info.lhs) else {
                    return false;
                };
                stack.push(next);
            }
            Action::Error => return false,
        }
    }
    false
}

fn viable(tables: &ParseTables, states: &[StateId], depth: usize, kind: KindId) -> bool {
    feed(tables, &mut SimStack::new(states, depth), kind)
}

/// Shortest sequence of at most `max_len` terminals after which `lookahead`
/// can be shifted. Shorter sequences win, then terminal order.
fn missing_sequence(
    tables: &ParseTables,
    states: &[StateId],
    lookahead: KindId,
    max_len: usize,
) -> Option<Vec<KindId>> {
    let candidates: Vec<KindId> = (2..tables.terminal_count())
        .map(|t| KindId(t as u16))
        .filter(|&t| {
            !tables
                .symbol_flags(t)
                .contains(SymbolFlags::ERROR_TOKEN)
        })
        .collect();
    let mut path = Vec::new();
    (1..=max_len).find_map(|len| {
        search_missing(
            tables,
            SimStack::new(states, 0),
            &candidates,
            lookahead,
            len,
            &mut path,
        )
        .then(|| path.clone())
    })
}

fn search_missing(
    tables: &ParseTables,
    stack: SimStack<'_>,
    candidates: &[KindId],
    lookahead: KindId,
    remaining: usize,
    path: &mut Vec<KindId>,
) -> bool {
    for &terminal in candidates {
        let mut next = stack.clone();
        if !feed(tables, &mut next, terminal) {
            continue;
        }
        path.push(terminal);
        let found = if remaining == 1 {
            feed(tables, &mut next.clone(), lookahead)
        } else {
            search_missing(tables, next, candidates, lookahead, remaining - 1, path)
        };
        if found {
            return true;
        }
        path.pop();
    }
    false
}

impl Run<'_> {
    /// Recovers from a lookahead token that has no action.
    pub(super) fn recover(&mut self, lookahead: Lookahead) -> Recovery {
        let token = lookahead.node;
        let kind = token.kind;
        let at_end = kind == KindId::END;

        if !at_end && self.is_invalid_token(kind) {
            trace!(position = self.stack.end(), "skipping invalid token");
            self.stack.push_error(vec![token]);
            return Recovery::Resume(self.next_lookahead());
        }

        let states = self.stack.states();
        let max_missing = if at_end {
            self.config.max_missing_tokens
        } else {
            self.config.max_missing_tokens.min(1)
        };
        if let Some(sequence) = missing_sequence(self.tables, &states, kind, max_missing) {
            trace!(
                position = self.stack.end(),
                count = sequence.len(),
                "inserting missing tokens"
            );
            self.stack.mark_recovery();
            self.pending.push_front(token);
            for &terminal in sequence.iter().skip(1).rev() {
                self.pending.push_front(Arc::new(NodeData::missing(terminal)));
            }
            let first = sequence.first().copied().unwrap_or(KindId::ERROR);
            return Recovery::Resume(Lookahead {
                node: Arc::new(NodeData::missing(first)),
                from_cursor: false,
            });
        }

        let tokens = self.peek_tokens(token);
        let pop_costs = self.stack.pop_costs();
        match self.cheapest_resume(&states, &pop_costs, &tokens) {
            Some((skipped, popped)) => {
                trace!(
                    position = self.stack.end(),
                    skipped,
                    popped,
                    "resuming after error"
                );
                let mut pieces = self.stack.pop_non_extra(popped);
                self.stack.mark_recovery();
                let mut tokens = tokens.into_iter();
                pieces.extend(tokens.by_ref().take(skipped));
                // The tokens after the resume point are still in `pending`.
                for _ in 1..skipped {
                    self.pending.pop_front();
                }
                let next = if skipped == 0 {
                    tokens.next()
                } else {
                    self.pending.pop_front()
                };
                if !pieces.is_empty() {
                    self.stack.push_error(pieces);
                }
                match next {
                    Some(node) => Recovery::Resume(Lookahead {
                        node,
                        from_cursor: false,
                    }),
                    None => Recovery::Resume(self.next_lookahead()),
                }
            }
            None if at_end => {
                trace!("no state accepts the end of input");
                let everything = self.stack.pop_non_extra(usize::MAX);
                if !everything.is_empty() {
                    self.stack.push_error(everything);
                }
                Recovery::Finish
            }
            None => {
                trace!(position = self.stack.end(), "skipping unexpected token");
                self.stack.mark_recovery();
                let token = tokens.into_iter().next();
                self.stack.push_error(token.into_iter().collect());
                Recovery::Resume(self.next_lookahead())
            }
        }
    }

    /// The lookahead followed by up to `max_skipped_tokens` more tokens,
    /// stopping at the end of input. Newly lexed tokens are queued.
    fn peek_tokens(&mut self, lookahead: Arc<NodeData>) -> Vec<Arc<NodeData>> {
        let limit = self.config.max_skipped_tokens.max(1);
        let mut position = self.stack.end() + lookahead.total();
        let mut tokens = vec![lookahead];
        for queued in self.pending.iter().take(limit) {
            position += queued.total();
            tokens.push(Arc::clone(queued));
        }
        while tokens.len() <= limit && tokens.last().is_some_and(|t| t.kind != KindId::END) {
            let token = self.lex(position);
            position += token.total();
            self.pending.push_back(Arc::clone(&token));
            tokens.push(token);
        }
        if let Some(end) = tokens.iter().position(|t| t.kind == KindId::END) {
            tokens.truncate(end + 1);
        }
        tokens
    }

    /// Finds `(skipped, popped)` with the lowest cost after which
    /// `tokens[skipped]` can be shifted.
    fn cheapest_resume(
        &self,
        states: &[StateId],
        pop_costs: &[usize],
        tokens: &[Arc<NodeData>],
    ) -> Option<(usize, usize)> {
        cheapest(pop_costs, tokens.len(), |skipped, popped| {
            let kind = tokens[skipped].kind;
            !self.is_invalid_token(kind) && viable(self.tables, states, popped, kind)
        })
    }
}

/// Visits `(skipped, popped)` pairs by increasing cost, then fewer skipped
/// tokens, then fewer popped entries, and returns the first one `accept`
/// takes.
///
/// `pop_costs[d]` is the cost of popping `d` entries and never decreases.
/// The last of the `token_count` tokens is only ever resumed at.
fn cheapest(
    pop_costs: &[usize],
    token_count: usize,
    mut accept: impl FnMut(usize, usize) -> bool,
) -> Option<(usize, usize)> {
    let max_skipped = token_count.checked_sub(1)?;
    let base = pop_costs.first().copied()?;
    let mut queue: BinaryHeap<Reverse<(usize, usize, usize)>> = (0..=max_skipped)
        .map(|skipped| Reverse((SKIP_COST * skipped + base, skipped, 0)))
        .collect();
    while let Some(Reverse((_, skipped, popped))) = queue.pop() {
        if accept(skipped, popped) {
            return Some((skipped, popped));
        }
        if let Some(&cost) = pop_costs.get(popped + 1) {
            queue.push(Reverse((SKIP_COST * skipped + cost, skipped, popped + 1)));
        }
    }
    None
}
