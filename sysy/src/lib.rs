#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Incremental, error-tolerant parser for SysY.
//!
//! SysY is the C subset used in compiler courses: `int` and `void`
//! functions, `const` and variable declarations with array dimensions,
//! `if`/`else`, `while`, `break`, `continue`, `return` and C expressions.
//!
//! ```ignore
//! use sysy_parser::{Edit, load_grammar, create_parser};
//!
//! let language = load_grammar()?;
//! let mut parser = create_parser(&language);
//! let tree = parser.parse(b"int main(){return 0;}");
//! let function = tree.root_node().child(0).unwrap();
//! assert_eq!(function.child_by_field_name("name").unwrap().kind(), "identifier");
//!
//! // `0` becomes `42`.
//! let edit = Edit::replace(18..19, 2);
//! let tree = parser.parse_incremental(&tree, &edit, b"int main(){return 42;}")?;
//! ```
//!
//! Malformed input still produces a full tree; see [`Tree::errors`].

pub mod document;
pub mod grammar;
pub mod lexer;
pub mod terminal;

pub use document::{Document, DocumentError};
pub use grammar::{LANGUAGE_NAME, grammar_blob, load_grammar};
pub use lexer::{LexErrorKind, Lexeme, SysyLexer, tokenize};
pub use sysy_parser_core::{
    Edit, GrammarLoadError, InvalidEdit, Language, LineIndex, Node, ParseConfig, Parser, Point,
    SyntaxError, SyntaxErrorKind, Tree, TreeCursor,
};
pub use terminal::Terminal;

/// A parser for `language` with the default configuration.
pub fn create_parser(language: &Language) -> Parser {
    Parser::new(language)
}
