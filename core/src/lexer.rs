//! The lexer contract.
//!
//! A lexer is a pure function of the bytes after an offset. The engine
//! calls it lazily, one token at a time, and resumes it at arbitrary offsets
//! during incremental reparsing, so it must not keep hidden state between
//! calls: everything it needs to resume is in [`LexState`].

use crate::symbol::KindId;

/// Resumable lexer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexState {
    pub offset: usize,
}

/// One lexed token with its leading trivia.
///
/// The token occupies `[offset + padding, offset + padding + size)` where
/// `offset` is the [`LexState`] the lexer was called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: KindId,
    /// Whitespace and comment bytes skipped before the token.
    pub padding: usize,
    pub size: usize,
    /// Bytes past the token's end the lexer inspected to decide where it ends.
    pub lookahead: usize,
}

/// Converts source bytes into tokens.
pub trait Lexer: Send + Sync {
    /// Lexes the next token at `state.offset`.
    ///
    /// Returns `None` when only trivia remains. Malformed input must come back
    /// as a token of an error kind, never as `None` or a panic.
    fn next_token(&self, source: &[u8], state: LexState) -> Option<(Token, LexState)>;

    /// Names of the terminals this lexer produces, indexed by [`KindId`].
    ///
    /// Checked against the grammar's symbol table when a language is loaded.
    fn terminal_names(&self) -> &[&'static str];
}
