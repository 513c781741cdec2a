//! LR parse tables.
//!
//! [`ParseTables`] is the read-only product of grammar compilation. It is
//! built once with [`ParseTables::build`], serialized with
//! [`ParseTables::to_bytes`] and loaded back with the validating
//! [`ParseTables::from_bytes`]. Parsers only ever read it, so a single
//! instance is shared by every parse through an `Arc`.
//!
//! The action table is dense: one `u32` cell per `(state, terminal)`.
//! The goto table holds one `u16` cell per `(state, nonterminal)`.

mod bitset;
pub mod blob;
mod lalr;

use crate::error::{GrammarError, GrammarLoadError};
use crate::grammar::Grammar;
use crate::symbol::{FieldId, KindId, Precedence, RuleId, StateId, SymbolFlags, SymbolInfo};

pub(crate) const NO_GOTO: u16 = u16::MAX;

const TAG_SHIFT: u32 = 1 << 30;
const TAG_REDUCE: u32 = 2 << 30;
const TAG_ACCEPT: u32 = 3 << 30;
const TAG_MASK: u32 = 3 << 30;
const PAYLOAD_MASK: u32 = !TAG_MASK;

/// Table entry for a `(state, terminal)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Error,
    Shift(StateId),
    Reduce(RuleId),
    Accept,
}

impl Action {
    pub(crate) const fn encode(self) -> u32 {
        match self {
            Action::Error => 0,
            Action::Shift(state) => TAG_SHIFT | state as u32,
            Action::Reduce(rule) => TAG_REDUCE | rule as u32,
            Action::Accept => TAG_ACCEPT,
        }
    }

    /// Decodes a raw cell; `None` for bit patterns no encoder produces.
    pub(crate) const fn decode(raw: u32) -> Option<Self> {
        let payload = raw & PAYLOAD_MASK;
        match raw & TAG_MASK {
            0 if payload == 0 => Some(Action::Error),
            TAG_SHIFT if payload <= u16::MAX as u32 => Some(Action::Shift(payload as u16)),
            TAG_REDUCE if payload <= u16::MAX as u32 => Some(Action::Reduce(payload as u16)),
            TAG_ACCEPT if payload == 0 => Some(Action::Accept),
            _ => None,
        }
    }
}

/// Runtime view of a rule: its left-hand side and per-position symbols and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuleInfo {
    pub(crate) lhs: KindId,
    pub(crate) rhs: Box<[KindId]>,
    pub(crate) fields: Box<[Option<FieldId>]>,
}

impl RuleInfo {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.rhs.len()
    }
}

/// Compiled, immutable LALR(1) tables plus the symbol metadata trees need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTables {
    pub(crate) name: String,
    pub(crate) symbols: Vec<SymbolInfo>,
    pub(crate) fields: Vec<String>,
    pub(crate) terminal_count: u16,
    pub(crate) start: KindId,
    pub(crate) rules: Vec<RuleInfo>,
    pub(crate) token_precedence: Vec<Option<Precedence>>,
    pub(crate) state_count: u16,
    pub(crate) actions: Vec<u32>,
    pub(crate) gotos: Vec<u16>,
}

impl ParseTables {
    /// Runs LALR(1) construction over `grammar`.
    pub fn build(grammar: &Grammar) -> Result<Self, GrammarError> {
        lalr::build(grammar)
    }

    /// Serializes the tables into the versioned, checksummed blob format.
    pub fn to_bytes(&self) -> Vec<u8> {
        blob::encode(self)
    }

    /// Loads and validates a blob produced by [`ParseTables::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GrammarLoadError> {
        blob::decode(bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_count as usize
    }

    pub fn state_count(&self) -> usize {
        self.state_count as usize
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn start_symbol(&self) -> KindId {
        self.start
    }

    pub fn token_precedence(&self, terminal: KindId) -> Option<Precedence> {
        self.token_precedence.get(terminal.index()).copied().flatten()
    }

    #[inline]
    pub(crate) fn symbol_flags(&self, kind: KindId) -> SymbolFlags {
        self.symbols
            .get(kind.index())
            .map_or(SymbolFlags::empty(), |s| s.flags)
    }

    pub(crate) fn symbol_name(&self, kind: KindId) -> &str {
        self.symbols.get(kind.index()).map_or("", |s| s.name.as_str())
    }

    pub(crate) fn field_name(&self, field: FieldId) -> Option<&str> {
        let index = (field.0 as usize).checked_sub(1)?;
        self.fields.get(index).map(String::as_str)
    }

    #[inline]
    pub(crate) fn is_terminal(&self, kind: KindId) -> bool {
        kind.0 < self.terminal_count
    }

    #[inline]
    pub(crate) fn rule(&self, rule: RuleId) -> Option<&RuleInfo> {
        self.rules.get(rule as usize)
    }

    /// Action for `terminal` in `state`.
    #[inline]
    pub fn action(&self, state: StateId, terminal: KindId) -> Action {
        if !self.is_terminal(terminal) {
            return Action::Error;
        }
        let cell = state as usize * self.terminal_count as usize + terminal.index();
        self.actions
            .get(cell)
            .and_then(|&raw| Action::decode(raw))
            .unwrap_or(Action::Error)
    }

    /// Successor of `state` after a reduction to `nonterminal`.
    #[inline]
    pub fn goto(&self, state: StateId, nonterminal: KindId) -> Option<StateId> {
        let column = nonterminal.0.checked_sub(self.terminal_count)? as usize;
        let width = self.symbols.len() - self.terminal_count as usize;
        self.gotos
            .get(state as usize * width + column)
            .copied()
            .filter(|&next| next != NO_GOTO)
    }

    /// Checksum of the serialized form; equal tables have equal fingerprints.
    pub fn fingerprint(&self) -> u32 {
        let bytes = self.to_bytes();
        crc32fast::hash(&bytes)
    }
}
