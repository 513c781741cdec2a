//! Terminal symbols of SysY.
//!
//! The discriminant of each variant is its [`KindId`]; the grammar declares
//! terminals in exactly this order and the lexer reports this table, so a
//! blob built from another ordering is rejected when loaded.

use sysy_parser_core::KindId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum Terminal {
    End = 0,
    Error,
    Semicolon,
    RParen,
    RBracket,
    RBrace,
    Comma,
    LParen,
    LBracket,
    LBrace,
    Assign,
    OrOr,
    AndAnd,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Const,
    Int,
    Void,
    If,
    Else,
    While,
    Break,
    Continue,
    Return,
    Identifier,
    DecimalLiteral,
    OctalLiteral,
    HexLiteral,
    UnexpectedCharacter,
    MalformedNumber,
    UnterminatedComment,
}

impl Terminal {
    pub const ALL: [Terminal; 41] = [
        Terminal::End,
        Terminal::Error,
        Terminal::Semicolon,
        Terminal::RParen,
        Terminal::RBracket,
        Terminal::RBrace,
        Terminal::Comma,
        Terminal::LParen,
        Terminal::LBracket,
        Terminal::LBrace,
        Terminal::Assign,
        Terminal::OrOr,
        Terminal::AndAnd,
        Terminal::EqEq,
        Terminal::NotEq,
        Terminal::Lt,
        Terminal::Gt,
        Terminal::LtEq,
        Terminal::GtEq,
        Terminal::Plus,
        Terminal::Minus,
        Terminal::Star,
        Terminal::Slash,
        Terminal::Percent,
        Terminal::Bang,
        Terminal::Const,
        Terminal::Int,
        Terminal::Void,
        Terminal::If,
        Terminal::Else,
        Terminal::While,
        Terminal::Break,
        Terminal::Continue,
        Terminal::Return,
        Terminal::Identifier,
        Terminal::DecimalLiteral,
        Terminal::OctalLiteral,
        Terminal::HexLiteral,
        Terminal::UnexpectedCharacter,
        Terminal::MalformedNumber,
        Terminal::UnterminatedComment,
    ];

    /// Symbol names, indexed by kind id.
    pub const NAMES: [&'static str; 41] = [
        "end",
        "ERROR",
        ";",
        ")",
        "]",
        "}",
        ",",
        "(",
        "[",
        "{",
        "=",
        "||",
        "&&",
        "==",
        "!=",
        "<",
        ">",
        "<=",
        ">=",
        "+",
        "-",
        "*",
        "/",
        "%",
        "!",
        "const",
        "int",
        "void",
        "if",
        "else",
        "while",
        "break",
        "continue",
        "return",
        "identifier",
        "decimal_literal",
        "octal_literal",
        "hex_literal",
        "unexpected_character",
        "malformed_number",
        "unterminated_comment",
    ];

    #[inline]
    pub const fn kind(self) -> KindId {
        KindId(self as u16)
    }

    pub fn from_kind(kind: KindId) -> Option<Terminal> {
        Self::ALL.get(kind.index()).copied()
    }

    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Shows up in S-expressions.
    pub const fn is_named(self) -> bool {
        matches!(
            self,
            Terminal::Identifier
                | Terminal::DecimalLiteral
                | Terminal::OctalLiteral
                | Terminal::HexLiteral
        )
    }

    /// A kind the lexer produces for input it cannot classify.
    pub const fn is_lex_error(self) -> bool {
        matches!(
            self,
            Terminal::UnexpectedCharacter | Terminal::MalformedNumber | Terminal::UnterminatedComment
        )
    }
}
