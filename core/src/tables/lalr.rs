//! LALR(1) table construction.
//!
//! The automaton is built in three passes:
//!
//! 1. nullable and FIRST sets for every symbol;
//! 2. the LR(0) automaton, with kernels deduplicated in an [`IndexSet`] so
//!    state numbering follows discovery order;
//! 3. lookahead generation and propagation over kernel items until a
//!    fixpoint, as in the dragon book.
//!
//! Shift/reduce conflicts are resolved with rule and token precedence the
//! way yacc does. Conflicts nothing resolves are logged and settled in favor
//! of shifting; reduce/reduce conflicts keep the earlier rule.

use std::collections::{BTreeMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::bitset::BitSet;
use super::{Action, NO_GOTO, ParseTables, RuleInfo};
use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::symbol::{Assoc, KindId, NO_STATE};

/// `(rule, dot)`. The augmented rule `start' -> start` uses index `rules.len()`.
type Item = (u32, u16);

struct Automaton<'g> {
    grammar: &'g Grammar,
    terminal_count: usize,
    /// Marker bit for "propagated lookahead".
    hash: usize,
    rhs: Vec<Vec<KindId>>,
    rules_by_lhs: Vec<Vec<u32>>,
    nullable: Vec<bool>,
    first: Vec<BitSet>,
}

impl<'g> Automaton<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let terminal_count = grammar.terminal_count();
        let symbol_count = grammar.symbols.len();

        let mut rhs: Vec<Vec<KindId>> = grammar
            .rules
            .iter()
            .map(|rule| rule.rhs.iter().map(|sym| sym.kind).collect())
            .collect();
        rhs.push(vec![grammar.start]);

        let mut rules_by_lhs = vec![Vec::new(); symbol_count];
        for (index, rule) in grammar.rules.iter().enumerate() {
            rules_by_lhs[rule.lhs.index()].push(index as u32);
        }

        let mut automaton = Self {
            grammar,
            terminal_count,
            hash: terminal_count,
            rhs,
            rules_by_lhs,
            nullable: vec![false; symbol_count],
            first: Vec::new(),
        };
        automaton.compute_nullable();
        automaton.compute_first();
        automaton
    }

    fn augmented(&self) -> u32 {
        self.grammar.rules.len() as u32
    }

    fn compute_nullable(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.grammar.rules {
                if self.nullable[rule.lhs.index()] {
                    continue;
                }
                if rule.rhs.iter().all(|sym| self.nullable[sym.kind.index()]) {
                    self.nullable[rule.lhs.index()] = true;
                    changed = true;
                }
            }
        }
    }

    fn compute_first(&mut self) {
        let bits = self.terminal_count + 1;
        let mut first: Vec<BitSet> = (0..self.grammar.symbols.len())
            .map(|_| BitSet::new(bits))
            .collect();
        for (terminal, set) in first.iter_mut().enumerate().take(self.terminal_count) {
            set.insert(terminal);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.grammar.rules {
                for sym in &rule.rhs {
                    if sym.kind != rule.lhs {
                        let source = first[sym.kind.index()].clone();
                        changed |= first[rule.lhs.index()].union_with(&source);
                    }
                    if !self.nullable[sym.kind.index()] {
                        break;
                    }
                }
            }
        }
        self.first = first;
    }

    fn is_terminal(&self, kind: KindId) -> bool {
        kind.index() < self.terminal_count
    }

    /// FIRST of `seq`, plus `tail` when the whole sequence is nullable.
    fn first_of(&self, seq: &[KindId], tail: &BitSet) -> BitSet {
        let mut out = BitSet::new(self.terminal_count + 1);
        for kind in seq {
            out.union_with(&self.first[kind.index()]);
            if !self.nullable[kind.index()] {
                return out;
            }
        }
        out.union_with(tail);
        out
    }

    fn closure0(&self, kernel: &[Item]) -> Vec<Item> {
        let mut items = kernel.to_vec();
        let mut expanded = vec![false; self.grammar.symbols.len()];
        let mut i = 0;
        while i < items.len() {
            let (rule, dot) = items[i];
            i += 1;
            let Some(&next) = self.rhs[rule as usize].get(dot as usize) else {
                continue;
            };
            if self.is_terminal(next) || expanded[next.index()] {
                continue;
            }
            expanded[next.index()] = true;
            items.extend(self.rules_by_lhs[next.index()].iter().map(|&r| (r, 0)));
        }
        items
    }

    fn closure1(&self, seed: impl IntoIterator<Item = (Item, BitSet)>) -> IndexMap<Item, BitSet> {
        let mut items: IndexMap<Item, BitSet> = IndexMap::new();
        for (item, set) in seed {
            items
                .entry(item)
                .or_insert_with(|| BitSet::new(self.terminal_count + 1))
                .union_with(&set);
        }
        let mut work: Vec<usize> = (0..items.len()).collect();

        while let Some(index) = work.pop() {
            let Some((&(rule, dot), lookahead)) = items.get_index(index) else {
                continue;
            };
            let rhs = &self.rhs[rule as usize];
            let Some(&next) = rhs.get(dot as usize) else {
                continue;
            };
            if self.is_terminal(next) {
                continue;
            }
            let follow = self.first_of(&rhs[dot as usize + 1..], lookahead);
            for &expansion in &self.rules_by_lhs[next.index()] {
                match items.get_full_mut(&(expansion, 0)) {
                    Some((slot, _, set)) => {
                        if set.union_with(&follow) {
                            work.push(slot);
                        }
                    }
                    None => {
                        let (slot, _) = items.insert_full((expansion, 0), follow.clone());
                        work.push(slot);
                    }
                }
            }
        }
        items
    }
}

pub(super) fn build(grammar: &Grammar) -> Result<ParseTables, GrammarError> {
    let automaton = Automaton::new(grammar);
    let terminal_count = automaton.terminal_count;
    let nonterminal_count = grammar.symbols.len() - terminal_count;
    let max_states = NO_STATE as usize - 1;

    // LR(0) states.
    let mut kernels: IndexSet<Vec<Item>> = IndexSet::new();
    kernels.insert(vec![(automaton.augmented(), 0)]);
    let mut transitions: Vec<BTreeMap<KindId, usize>> = Vec::new();
    let mut index = 0;
    while let Some(kernel) = kernels.get_index(index).cloned() {
        let mut successors: BTreeMap<KindId, Vec<Item>> = BTreeMap::new();
        for (rule, dot) in automaton.closure0(&kernel) {
            if let Some(&next) = automaton.rhs[rule as usize].get(dot as usize) {
                successors.entry(next).or_default().push((rule, dot + 1));
            }
        }
        let mut row = BTreeMap::new();
        for (symbol, mut items) in successors {
            items.sort_unstable();
            items.dedup();
            let (target, _) = kernels.insert_full(items);
            row.insert(symbol, target);
        }
        transitions.push(row);
        if kernels.len() > max_states {
            return Err(GrammarError::TooManyStates { max: max_states });
        }
        index += 1;
    }

    // Lookaheads.
    let mut lookaheads: Vec<Vec<BitSet>> = kernels
        .iter()
        .map(|kernel| vec![BitSet::new(terminal_count + 1); kernel.len()])
        .collect();
    lookaheads[0][0].insert(KindId::END.index());

    let mut links: Vec<((usize, usize), (usize, usize))> = Vec::new();
    for (state, kernel) in kernels.iter().enumerate() {
        for (slot, &item) in kernel.iter().enumerate() {
            let mut sentinel = BitSet::new(terminal_count + 1);
            sentinel.insert(automaton.hash);
            for ((rule, dot), set) in automaton.closure1([(item, sentinel)]) {
                let Some(&next) = automaton.rhs[rule as usize].get(dot as usize) else {
                    continue;
                };
                let Some(&target) = transitions[state].get(&next) else {
                    continue;
                };
                let Ok(target_slot) = kernels[target].binary_search(&(rule, dot + 1)) else {
                    continue;
                };
                for terminal in set.iter() {
                    if terminal == automaton.hash {
                        links.push(((state, slot), (target, target_slot)));
                    } else {
                        lookaheads[target][target_slot].insert(terminal);
                    }
                }
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &((from_state, from_slot), (to_state, to_slot)) in &links {
            let source = lookaheads[from_state][from_slot].clone();
            changed |= lookaheads[to_state][to_slot].union_with(&source);
        }
    }

    // Tables.
    let state_count = kernels.len();
    let mut actions = vec![Action::Error.encode(); state_count * terminal_count];
    let mut gotos = vec![NO_GOTO; state_count * nonterminal_count];
    let mut non_assoc_cells: HashSet<usize> = HashSet::new();
    let mut conflicts = 0usize;

    for (state, kernel) in kernels.iter().enumerate() {
        for (&symbol, &target) in &transitions[state] {
            if automaton.is_terminal(symbol) {
                actions[state * terminal_count + symbol.index()] =
                    Action::Shift(target as u16).encode();
            } else {
                gotos[state * nonterminal_count + symbol.index() - terminal_count] = target as u16;
            }
        }

        let seed = kernel
            .iter()
            .copied()
            .zip(lookaheads[state].iter().cloned());
        for ((rule, dot), set) in automaton.closure1(seed) {
            if (dot as usize) < automaton.rhs[rule as usize].len() {
                continue;
            }
            for terminal in set.iter().filter(|&t| t < terminal_count) {
                let cell = state * terminal_count + terminal;
                if rule == automaton.augmented() {
                    if terminal == KindId::END.index() {
                        actions[cell] = Action::Accept.encode();
                    }
                    continue;
                }
                if non_assoc_cells.contains(&cell) {
                    continue;
                }
                let resolved = resolve(
                    grammar,
                    state,
                    terminal,
                    actions[cell],
                    rule as u16,
                    &mut conflicts,
                );
                if resolved == Action::Error {
                    non_assoc_cells.insert(cell);
                }
                actions[cell] = resolved.encode();
            }
        }
    }

    debug!(
        grammar = %grammar.name,
        states = state_count,
        rules = grammar.rules.len(),
        unresolved_conflicts = conflicts,
        "built LALR(1) tables"
    );

    let rules = grammar
        .rules
        .iter()
        .map(|rule| RuleInfo {
            lhs: rule.lhs,
            rhs: rule.rhs.iter().map(|sym| sym.kind).collect(),
            fields: rule.rhs.iter().map(|sym| sym.field).collect(),
        })
        .collect();

    Ok(ParseTables {
        name: grammar.name.clone(),
        symbols: grammar.symbols.clone(),
        fields: grammar.fields.clone(),
        terminal_count: grammar.terminal_count,
        start: grammar.start,
        rules,
        token_precedence: grammar.token_precedence.clone(),
        state_count: state_count as u16,
        actions,
        gotos,
    })
}

/// Chooses between the action already in a cell and a new reduction.
fn resolve(
    grammar: &Grammar,
    state: usize,
    terminal: usize,
    existing: u32,
    rule: u16,
    conflicts: &mut usize,
) -> Action {
    let reduce = Action::Reduce(rule);
    let lookahead = grammar.symbols[terminal].name.as_str();
    match Action::decode(existing) {
        None | Some(Action::Error) => reduce,
        Some(Action::Shift(target)) => {
            let rule_prec = grammar.rules[rule as usize].precedence;
            let token_prec = grammar.token_precedence.get(terminal).copied().flatten();
            match (rule_prec, token_prec) {
                (Some(r), Some(t)) if r.level > t.level => reduce,
                (Some(r), Some(t)) if r.level < t.level => Action::Shift(target),
                (Some(r), Some(_)) => match r.assoc {
                    Assoc::Left => reduce,
                    Assoc::Right => Action::Shift(target),
                    Assoc::NonAssoc => Action::Error,
                },
                _ => {
                    *conflicts += 1;
                    debug!(state, lookahead, rule, "unresolved shift/reduce conflict, shifting");
                    Action::Shift(target)
                }
            }
        }
        Some(Action::Reduce(other)) => {
            *conflicts += 1;
            debug!(state, lookahead, rule, other, "reduce/reduce conflict, keeping earlier rule");
            Action::Reduce(other.min(rule))
        }
        Some(Action::Accept) => {
            *conflicts += 1;
            debug!(state, lookahead, rule, "reduce/accept conflict, accepting");
            Action::Accept
        }
    }
}
