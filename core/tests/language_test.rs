//! Loading grammars: blob validation and lexer agreement.
mod common;

use std::sync::Arc;

use common::{CalcLexer, tables};
use pretty_assertions::assert_eq;
use sysy_parser_core::{GrammarLoadError, Language, LexState, Lexer, Token};

/// A lexer that knows one terminal fewer than the calculator grammar.
struct ShortLexer;

impl Lexer for ShortLexer {
    fn next_token(&self, _: &[u8], _: LexState) -> Option<(Token, LexState)> {
        None
    }

    fn terminal_names(&self) -> &[&'static str] {
        &["end", "ERROR", ";", "(", ")", "+", "*", "number"]
    }
}

#[test]
fn test_blob_round_trip_keeps_metadata() {
    let language = Language::from_blob(&tables("calc").to_bytes(), Arc::new(CalcLexer)).unwrap();
    assert_eq!(language.name(), "calc");
    let binary = language.id_for_name("binary").unwrap();
    assert_eq!(language.symbol_name(binary), Some("binary"));
    assert!(language.is_named(binary));
    assert!(!language.is_named(language.id_for_name("+").unwrap()));
    assert_eq!(language.id_for_name("_expression"), None);
    assert_eq!(language.field_count(), 4);
    let left = language.field_id_for_name("left").unwrap();
    assert_eq!(language.field_name(left), Some("left"));
    assert!(language.state_count() > 0);
}

#[test]
fn test_same_grammar_same_fingerprint() {
    let a = common::language();
    let b = common::language();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a, b);
    assert_ne!(a.fingerprint(), common::language_named("other").fingerprint());
}

#[test]
fn test_lexer_mismatch_is_reported() {
    let error = Language::from_blob(&tables("calc").to_bytes(), Arc::new(ShortLexer)).unwrap_err();
    assert_eq!(
        error,
        GrammarLoadError::LexerMismatch {
            index: 8,
            expected: "<none>".into(),
            found: "bad_character".into(),
        }
    );
}

#[test]
fn test_corrupt_blob_is_rejected() {
    let mut blob = tables("calc").to_bytes();
    let last = blob.len() - 1;
    blob[last] ^= 0x40;
    assert!(matches!(
        Language::from_blob(&blob, Arc::new(CalcLexer)),
        Err(GrammarLoadError::ChecksumMismatch { .. })
    ));

    let blob = tables("calc").to_bytes();
    assert!(Language::from_blob(&blob[..blob.len() / 2], Arc::new(CalcLexer)).is_err());
    assert!(matches!(
        Language::from_blob(b"nope", Arc::new(CalcLexer)),
        Err(GrammarLoadError::FileTooSmall(4))
    ));
}
