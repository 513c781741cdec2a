//! A small calculator language shared by the integration tests.
//!
//! ```text
//! program     -> statement+
//! statement   -> value:expression ";"
//! expression  -> binary | parenthesized | number
//! binary      -> left:expression operator:("+" | "*") right:expression
//! ```
#![allow(dead_code)]

use std::sync::Arc;

use sysy_parser_core::{
    GrammarBuilder, KindId, Language, LexState, Lexer, ParseTables, Parser, Precedence, Token,
    Tree,
};

const TERMINALS: &[&str] = &[
    "end",
    "ERROR",
    ";",
    "(",
    ")",
    "+",
    "*",
    "number",
    "bad_character",
];

const SEMI: KindId = KindId(2);
const NUMBER: KindId = KindId(7);
const BAD: KindId = KindId(8);

pub struct CalcLexer;

impl Lexer for CalcLexer {
    fn next_token(&self, source: &[u8], state: LexState) -> Option<(Token, LexState)> {
        let rest = source.get(state.offset..)?;
        let padding = rest
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        let rest = &rest[padding..];
        let first = *rest.first()?;
        let (kind, size, lookahead) = match first {
            b';' => (SEMI, 1, 0),
            b'(' => (KindId(3), 1, 0),
            b')' => (KindId(4), 1, 0),
            b'+' => (KindId(5), 1, 0),
            b'*' => (KindId(6), 1, 0),
            b'0'..=b'9' => {
                let size = rest.iter().take_while(|b| b.is_ascii_digit()).count();
                (NUMBER, size, usize::from(size < rest.len()))
            }
            _ => (BAD, 1, 0),
        };
        let token = Token {
            kind,
            padding,
            size,
            lookahead,
        };
        let next = LexState {
            offset: state.offset + padding + size,
        };
        Some((token, next))
    }

    fn terminal_names(&self) -> &[&'static str] {
        TERMINALS
    }
}

pub fn tables(name: &str) -> ParseTables {
    let mut g = GrammarBuilder::new(name);
    let semi = g.terminal(";", false).unwrap();
    let open = g.terminal("(", false).unwrap();
    let close = g.terminal(")", false).unwrap();
    let plus = g.terminal("+", false).unwrap();
    let star = g.terminal("*", false).unwrap();
    let number = g.terminal("number", true).unwrap();
    g.error_terminal("bad_character").unwrap();

    let program = g.nonterminal("program").unwrap();
    let statements = g.nonterminal("_statements").unwrap();
    let statement = g.nonterminal("statement").unwrap();
    let expression = g.nonterminal("_expression").unwrap();
    let binary = g.nonterminal("binary").unwrap();
    let parenthesized = g.nonterminal("parenthesized").unwrap();

    let value = g.field("value");
    let left = g.field("left");
    let operator = g.field("operator");
    let right = g.field("right");

    g.token_precedence(plus, Precedence::left(1));
    g.token_precedence(star, Precedence::left(2));

    g.rule(program, [statements]).unwrap();
    g.rule(statements, [statements, statement]).unwrap();
    g.rule(statements, [statement]).unwrap();
    g.rule(statement, [value.on(expression), semi.into()]).unwrap();
    g.rule(expression, [binary]).unwrap();
    g.rule(expression, [parenthesized]).unwrap();
    g.rule(expression, [number]).unwrap();
    for (op, level) in [(plus, 1), (star, 2)] {
        g.rule_with_precedence(
            binary,
            [left.on(expression), operator.on(op), right.on(expression)],
            Precedence::left(level),
        )
        .unwrap();
    }
    g.rule(parenthesized, [open, expression, close]).unwrap();
    g.start(program);

    ParseTables::build(&g.build().unwrap()).unwrap()
}

/// The calculator, loaded through the blob codec like a shipped grammar.
pub fn language() -> Language {
    language_named("calc")
}

pub fn language_named(name: &str) -> Language {
    let blob = tables(name).to_bytes();
    Language::from_blob(&blob, Arc::new(CalcLexer)).unwrap()
}

pub fn parse(source: &str) -> Tree {
    Parser::new(&language()).parse(source.as_bytes())
}
