//! Error types for the parser runtime.
//!
//! Malformed source text is never an error here: it is recovered inside the
//! tree as `ERROR` nodes and `MISSING` leaves (see [`crate::SyntaxError`]).
//! The types below cover the three ways a caller can actually fail:
//!
//! - [`GrammarError`]: a grammar description is inconsistent and no tables
//!   can be built from it.
//! - [`GrammarLoadError`]: a serialized grammar blob is corrupt, truncated or
//!   from another format version, or the grammar it should hold could not be
//!   compiled.
//! - [`InvalidEdit`]: an edit descriptor or a previous tree does not fit the
//!   text it is applied to.

use thiserror::Error;

use crate::tables::blob::{FORMAT_VERSION, MAGIC};

/// Errors raised while describing a grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("symbol `{0}` is declared twice")]
    DuplicateSymbol(String),

    #[error("terminal `{0}` declared after the first nonterminal")]
    TerminalAfterNonterminal(String),

    #[error("grammar declares more than {max} symbols")]
    TooManySymbols { max: usize },

    #[error("unknown symbol id {0}")]
    UnknownSymbol(u16),

    #[error("unknown field id {0}")]
    UnknownField(u16),

    #[error("`{0}` is a terminal and cannot appear on the left of a rule")]
    TerminalRule(String),

    #[error("reserved symbol `{0}` cannot appear in a rule")]
    ReservedSymbol(String),

    #[error("nonterminal `{0}` has no rules")]
    NoRules(String),

    #[error("no start symbol was set")]
    MissingStart,

    #[error("automaton has more than {max} states")]
    TooManyStates { max: usize },
}

/// Errors raised while loading a serialized grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarLoadError {
    #[error("grammar blob too small: {0} bytes")]
    FileTooSmall(usize),

    #[error("invalid magic: expected {MAGIC:?}, found {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("grammar format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u16, found: u16 },

    #[error("size mismatch: header says {header} payload bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },

    #[error("checksum mismatch: header says {expected:#010x}, payload hashes to {found:#010x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("unexpected end of grammar data while reading {0}")]
    Truncated(&'static str),

    #[error("{0} trailing bytes after grammar data")]
    TrailingBytes(usize),

    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: u32 },

    #[error("malformed grammar data: {0}")]
    Malformed(&'static str),

    #[error("grammar could not be compiled: {0}")]
    Build(#[from] GrammarError),

    #[error("lexer expects terminal `{expected}` at id {index}, grammar declares `{found}`")]
    LexerMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

impl GrammarLoadError {
    /// The format version this build reads.
    pub const fn supported_version() -> u16 {
        FORMAT_VERSION
    }
}

/// Errors raised by [`crate::Tree::edit`] and incremental parsing.
///
/// Returning one of these never modifies the previous tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidEdit {
    #[error("edit starts at {start} after its old end {old_end}")]
    StartAfterOldEnd { start: usize, old_end: usize },

    #[error("edit starts at {start} after its new end {new_end}")]
    StartAfterNewEnd { start: usize, new_end: usize },

    #[error("edit old end {old_end} is past the end of the text ({len} bytes)")]
    OutOfBounds { old_end: usize, len: usize },

    #[error("edited text should be {expected} bytes, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("previous tree was built by grammar `{found}`, parser uses `{expected}`")]
    LanguageMismatch { expected: String, found: String },
}
