//! SysY tokenizer.
//!
//! Tokens are matched by a `logos` automaton over raw bytes: the longest
//! match wins and keywords beat identifiers of the same length, so `ifx` is
//! one identifier. Whitespace and comments are not tokens; they become the
//! padding of the token that follows.
//!
//! Nothing here fails. Input that is not SysY comes back as one of the error
//! terminals listed in [`LexErrorKind`] and is contained by the parser.

use std::ops::Range;

use logos::Logos;
use sysy_parser_core::{KindId, LexState, Lexer, Token};
use thiserror::Error;

use crate::terminal::Terminal;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(utf8 = false)]
enum RawToken {
    // Trivia
    #[regex(r"[ \t\r\n\x0B\x0C]+")]
    Whitespace,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", allow_greedy = true)]
    BlockComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\**", allow_greedy = true)]
    UnterminatedComment,

    // Punctuation
    #[token(";")]
    Semicolon,
    #[token(")")]
    RParen,
    #[token("]")]
    RBracket,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token("[")]
    LBracket,
    #[token("{")]
    LBrace,

    // Operators
    #[token("=")]
    Assign,
    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,

    // Keywords
    #[token("const")]
    Const,
    #[token("int")]
    Int,
    #[token("void")]
    Void,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // Literals. Any other run of alphanumerics starting with a digit is a
    // malformed number, so `09`, `0x` and `1abc` are single error tokens.
    #[regex(r"[1-9][0-9]*", priority = 3)]
    DecimalLiteral,
    #[regex(r"0[0-7]*", priority = 3)]
    OctalLiteral,
    #[regex(r"0[xX][0-9a-fA-F]+", priority = 3)]
    HexLiteral,
    #[regex(r"[0-9][0-9a-zA-Z_]*", priority = 1)]
    MalformedNumber,
}

impl RawToken {
    /// The terminal this token stands for, or `None` for trivia.
    fn terminal(self) -> Option<Terminal> {
        let terminal = match self {
            RawToken::Whitespace | RawToken::LineComment | RawToken::BlockComment => return None,
            RawToken::UnterminatedComment => Terminal::UnterminatedComment,
            RawToken::Semicolon => Terminal::Semicolon,
            RawToken::RParen => Terminal::RParen,
            RawToken::RBracket => Terminal::RBracket,
            RawToken::RBrace => Terminal::RBrace,
            RawToken::Comma => Terminal::Comma,
            RawToken::LParen => Terminal::LParen,
            RawToken::LBracket => Terminal::LBracket,
            RawToken::LBrace => Terminal::LBrace,
            RawToken::Assign => Terminal::Assign,
            RawToken::OrOr => Terminal::OrOr,
            RawToken::AndAnd => Terminal::AndAnd,
            RawToken::EqEq => Terminal::EqEq,
            RawToken::NotEq => Terminal::NotEq,
            RawToken::Lt => Terminal::Lt,
            RawToken::Gt => Terminal::Gt,
            RawToken::LtEq => Terminal::LtEq,
            RawToken::GtEq => Terminal::GtEq,
            RawToken::Plus => Terminal::Plus,
            RawToken::Minus => Terminal::Minus,
            RawToken::Star => Terminal::Star,
            RawToken::Slash => Terminal::Slash,
            RawToken::Percent => Terminal::Percent,
            RawToken::Bang => Terminal::Bang,
            RawToken::Const => Terminal::Const,
            RawToken::Int => Terminal::Int,
            RawToken::Void => Terminal::Void,
            RawToken::If => Terminal::If,
            RawToken::Else => Terminal::Else,
            RawToken::While => Terminal::While,
            RawToken::Break => Terminal::Break,
            RawToken::Continue => Terminal::Continue,
            RawToken::Return => Terminal::Return,
            RawToken::Identifier => Terminal::Identifier,
            RawToken::DecimalLiteral => Terminal::DecimalLiteral,
            RawToken::OctalLiteral => Terminal::OctalLiteral,
            RawToken::HexLiteral => Terminal::HexLiteral,
            RawToken::MalformedNumber => Terminal::MalformedNumber,
        };
        Some(terminal)
    }
}

/// Why the lexer produced an error token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    #[error("unexpected character")]
    UnexpectedCharacter,

    #[error("malformed number literal")]
    MalformedNumber,

    #[error("unterminated block comment")]
    UnterminatedComment,
}

impl LexErrorKind {
    pub fn from_terminal(terminal: Terminal) -> Option<Self> {
        match terminal {
            Terminal::UnexpectedCharacter => Some(Self::UnexpectedCharacter),
            Terminal::MalformedNumber => Some(Self::MalformedNumber),
            Terminal::UnterminatedComment => Some(Self::UnterminatedComment),
            _ => None,
        }
    }

    pub fn from_kind(kind: KindId) -> Option<Self> {
        Terminal::from_kind(kind).and_then(Self::from_terminal)
    }
}

/// The SysY lexer, as plugged into the parser runtime.
///
/// Every token reports one byte of lookahead unless it ends the text: no
/// pattern decides where it stops by looking further than the next byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysyLexer;

impl Lexer for SysyLexer {
    fn next_token(&self, source: &[u8], state: LexState) -> Option<(Token, LexState)> {
        let rest = source.get(state.offset..)?;
        let mut lexer = RawToken::lexer(rest);
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let terminal = match result {
                Ok(raw) => match raw.terminal() {
                    Some(terminal) => terminal,
                    None => continue,
                },
                Err(()) => Terminal::UnexpectedCharacter,
            };
            let end = span.end.max(span.start + 1).min(rest.len());
            let token = Token {
                kind: terminal.kind(),
                padding: span.start,
                size: end - span.start,
                lookahead: usize::from(end < rest.len()),
            };
            return Some((
                token,
                LexState {
                    offset: state.offset + end,
                },
            ));
        }
        None
    }

    fn terminal_names(&self) -> &[&'static str] {
        &Terminal::NAMES
    }
}

/// One token of [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub terminal: Terminal,
    pub range: Range<usize>,
}

/// Splits a whole text into tokens, without the end of input.
pub fn tokenize(source: &[u8]) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut state = LexState::default();
    while let Some((token, next)) = SysyLexer.next_token(source, state) {
        let start = state.offset + token.padding;
        let terminal = Terminal::from_kind(token.kind).unwrap_or(Terminal::UnexpectedCharacter);
        lexemes.push(Lexeme {
            terminal,
            range: start..start + token.size,
        });
        state = next;
    }
    lexemes
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn kinds(source: &str) -> Vec<Terminal> {
        tokenize(source.as_bytes())
            .into_iter()
            .map(|l| l.terminal)
            .collect()
    }

    #[test_case("ifx", &[Terminal::Identifier] ; "keyword prefix")]
    #[test_case("if x", &[Terminal::If, Terminal::Identifier] ; "keyword")]
    #[test_case("returned", &[Terminal::Identifier] ; "longer keyword prefix")]
    #[test_case("_int1", &[Terminal::Identifier] ; "underscore")]
    #[test_case("<= < =", &[Terminal::LtEq, Terminal::Lt, Terminal::Assign] ; "relational")]
    #[test_case("a&&b||!c", &[
        Terminal::Identifier, Terminal::AndAnd, Terminal::Identifier,
        Terminal::OrOr, Terminal::Bang, Terminal::Identifier,
    ] ; "logical")]
    #[test_case("== != =", &[Terminal::EqEq, Terminal::NotEq, Terminal::Assign] ; "equality")]
    fn test_maximal_munch(source: &str, expected: &[Terminal]) {
        assert_eq!(kinds(source), expected);
    }

    #[test_case("123" => Terminal::DecimalLiteral ; "decimal")]
    #[test_case("0" => Terminal::OctalLiteral ; "zero")]
    #[test_case("017" => Terminal::OctalLiteral ; "octal")]
    #[test_case("0x1F" => Terminal::HexLiteral ; "hex")]
    #[test_case("0XaB" => Terminal::HexLiteral ; "upper hex prefix")]
    #[test_case("09" => Terminal::MalformedNumber ; "octal with nine")]
    #[test_case("0x" => Terminal::MalformedNumber ; "hex without digits")]
    #[test_case("0x1G" => Terminal::MalformedNumber ; "hex with letter")]
    #[test_case("12ab" => Terminal::MalformedNumber ; "suffix")]
    fn test_number_classification(source: &str) -> Terminal {
        let lexemes = tokenize(source.as_bytes());
        assert_eq!(lexemes.len(), 1, "{lexemes:?}");
        assert_eq!(lexemes[0].range, 0..source.len());
        lexemes[0].terminal
    }

    #[test]
    fn test_trivia_becomes_padding() {
        let source = b"  // line\n /* block\n * more */ x";
        let (token, next) = SysyLexer.next_token(source, LexState::default()).unwrap();
        assert_eq!(token.kind, Terminal::Identifier.kind());
        assert_eq!(token.padding, source.len() - 1);
        assert_eq!(token.size, 1);
        assert_eq!(token.lookahead, 0);
        assert_eq!(next.offset, source.len());
        assert!(SysyLexer.next_token(source, next).is_none());
    }

    #[test]
    fn test_only_trivia_is_end_of_input() {
        assert!(SysyLexer.next_token(b"  /* c */ // d", LexState::default()).is_none());
        assert!(SysyLexer.next_token(b"", LexState::default()).is_none());
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let source = b"a /* never closed\n int b;";
        let lexemes = tokenize(source);
        assert_eq!(lexemes.len(), 2);
        assert_eq!(lexemes[1].terminal, Terminal::UnterminatedComment);
        assert_eq!(lexemes[1].range, 2..source.len());
    }

    #[test]
    fn test_comment_star_runs() {
        assert_eq!(kinds("/***/ a /** b **/"), [Terminal::Identifier]);
        assert_eq!(kinds("a /*/ b"), [Terminal::Identifier, Terminal::UnterminatedComment]);
    }

    #[test]
    fn test_unexpected_bytes() {
        let source = b"a @ \xff b & c";
        let found: Vec<_> = tokenize(source)
            .into_iter()
            .map(|l| (l.terminal, l.range))
            .collect();
        assert_eq!(
            found,
            [
                (Terminal::Identifier, 0..1),
                (Terminal::UnexpectedCharacter, 2..3),
                (Terminal::UnexpectedCharacter, 4..5),
                (Terminal::Identifier, 6..7),
                (Terminal::UnexpectedCharacter, 8..9),
                (Terminal::Identifier, 10..11),
            ]
        );
    }

    #[test]
    fn test_lookahead_is_one_byte_before_end() {
        let (token, _) = SysyLexer.next_token(b"abc;", LexState::default()).unwrap();
        assert_eq!(token.lookahead, 1);
        let (token, _) = SysyLexer.next_token(b"abc", LexState::default()).unwrap();
        assert_eq!(token.lookahead, 0);
    }

    #[test]
    fn test_resumes_at_any_token_boundary() {
        let source = b"int a = 0x10;";
        let all = tokenize(source);
        for lexeme in &all {
            let (token, _) = SysyLexer
                .next_token(source, LexState { offset: lexeme.range.start })
                .unwrap();
            assert_eq!(token.padding, 0);
            assert_eq!(token.kind, lexeme.terminal.kind());
        }
    }

    #[test]
    fn test_error_kind_messages() {
        let kind = LexErrorKind::from_kind(Terminal::MalformedNumber.kind()).unwrap();
        assert_eq!(kind.to_string(), "malformed number literal");
        assert_eq!(LexErrorKind::from_terminal(Terminal::Identifier), None);
    }
}
