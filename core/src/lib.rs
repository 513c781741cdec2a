#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Language-independent runtime for incremental, error-tolerant LR parsing.
//!
//! A language is described once with a [`GrammarBuilder`], compiled into
//! LALR(1) [`ParseTables`] and serialized into a checksummed blob. At run
//! time the blob is loaded back into a [`Language`] together with a
//! [`Lexer`], and a [`Parser`] turns text into a [`Tree`].
//!
#![cfg_attr(feature = "docs", doc = simple_mermaid::mermaid!("../docs/diagrams/pipeline.mmd"))]
//!
//! # Trees and edits
//!
//! Trees are persistent. Editing a tree with [`Tree::edit`] produces a new
//! tree that shares every node with the old one, and
//! [`Parser::reparse`] builds the tree of the new text while splicing in the
//! subtrees the edit did not touch.
//!
#![cfg_attr(feature = "docs", doc = simple_mermaid::mermaid!("../docs/diagrams/reparse.mmd"))]
//!
//! # Errors
//!
//! Parsing never fails. Unexpected input is wrapped in `ERROR` nodes and
//! absent tokens are inserted as zero-width `MISSING` leaves; both set
//! [`Node::has_error`] on every ancestor. Only loading a grammar
//! ([`GrammarLoadError`]) and misusing edits ([`InvalidEdit`]) are errors.
//!
//! # Example
//!
//! ```ignore
//! use sysy_parser_core::{Edit, Parser};
//!
//! let mut parser = Parser::new(&language);
//! let tree = parser.parse(b"int main(){return 0;}");
//!
//! let edit = Edit::replace(18..19, 2);
//! let tree = parser.parse_incremental(&tree, &edit, b"int main(){return 42;}")?;
//! assert!(!tree.has_error());
//! ```

pub mod config;
mod edit;
mod error;
pub mod grammar;
mod language;
pub mod lexer;
mod parser;
pub mod symbol;
pub mod tables;
mod text;
mod tree;

pub use config::ParseConfig;
pub use edit::Edit;
pub use error::{GrammarError, GrammarLoadError, InvalidEdit};
pub use grammar::{Grammar, GrammarBuilder, Rule};
pub use language::Language;
pub use lexer::{LexState, Lexer, Token};
pub use parser::Parser;
pub use symbol::{Assoc, FieldId, KindId, Precedence, Sym, SymbolFlags};
pub use tables::{Action, ParseTables};
pub use text::{LineIndex, Point};
pub use tree::{Node, SyntaxError, SyntaxErrorKind, Tree, TreeCursor};
