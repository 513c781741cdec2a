//! Identifiers for grammar symbols, fields, rules and parse states.
//!
//! Symbols are numbered densely: terminals first, nonterminals after them.
//! Two terminals are reserved in every grammar:
//!
//! | Id | Name | Meaning |
//! |----|------|---------|
//! | 0 | `end` | end of input |
//! | 1 | `ERROR` | kind of the nodes that wrap skipped input |

use bitflags::bitflags;

/// Identifier of a grammar symbol, and therefore of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KindId(pub u16);

impl KindId {
    /// End of input.
    pub const END: KindId = KindId(0);
    /// Error node kind.
    pub const ERROR: KindId = KindId(1);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a field name. Field ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldId(pub u16);

impl FieldId {
    /// Attaches this field to a right-hand-side symbol.
    #[inline]
    pub const fn on(self, kind: KindId) -> Sym {
        Sym {
            kind,
            field: Some(self),
        }
    }
}

/// Index of a rule in a grammar.
pub type RuleId = u16;

/// Index of a state in the LR automaton.
pub type StateId = u16;

/// Parse state recorded on nodes that must never be reused by state.
pub const NO_STATE: StateId = u16::MAX;

bitflags! {
    /// Static properties of a grammar symbol.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u8 {
        /// Produced by the lexer.
        const TERMINAL = 1;
        /// Shown in S-expressions and counted by `named_child`.
        const NAMED = 1 << 1;
        /// Nonterminal flattened into its parent.
        const HIDDEN = 1 << 2;
        /// Lexer error kind. Never accepted by any state.
        const ERROR_TOKEN = 1 << 3;
    }
}

/// Metadata for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub flags: SymbolFlags,
}

/// Operator associativity for conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// Precedence level with associativity. Higher levels bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Precedence {
    pub level: u16,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn left(level: u16) -> Self {
        Self {
            level,
            assoc: Assoc::Left,
        }
    }

    pub const fn right(level: u16) -> Self {
        Self {
            level,
            assoc: Assoc::Right,
        }
    }

    pub const fn non_assoc(level: u16) -> Self {
        Self {
            level,
            assoc: Assoc::NonAssoc,
        }
    }
}

/// One right-hand-side position of a rule: a symbol and its optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sym {
    pub kind: KindId,
    pub field: Option<FieldId>,
}

impl From<KindId> for Sym {
    #[inline]
    fn from(kind: KindId) -> Self {
        Sym { kind, field: None }
    }
}
