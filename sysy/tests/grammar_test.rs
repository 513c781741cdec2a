//! The SysY grammar loads, and loading is repeatable.
mod common;

use std::sync::Arc;

use common::SAMPLE;
use pretty_assertions::assert_eq;
use sysy_parser::{
    GrammarLoadError, LANGUAGE_NAME, Language, Parser, SysyLexer, Terminal, grammar_blob,
    load_grammar,
};

#[test]
fn test_can_load_grammar() {
    let language = load_grammar().expect("error loading SysY grammar");
    assert_eq!(language.name(), LANGUAGE_NAME);
}

#[test]
fn test_loading_twice_gives_equal_languages() {
    let a = load_grammar().unwrap();
    let b = load_grammar().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());

    let first = Parser::new(&a).parse(SAMPLE.as_bytes());
    let second = Parser::new(&b).parse(SAMPLE.as_bytes());
    assert!(first.structurally_eq(&second));
    assert_eq!(first.to_sexp(), second.to_sexp());
}

#[test]
fn test_symbols_and_fields() {
    let language = load_grammar().unwrap();
    for terminal in Terminal::ALL {
        assert_eq!(language.symbol_name(terminal.kind()), Some(terminal.name()));
        let named = terminal.is_named() || terminal.is_lex_error() || terminal == Terminal::Error;
        assert_eq!(language.is_named(terminal.kind()), named, "{terminal:?}");
    }
    for name in [
        "source_file",
        "function_definition",
        "if_statement",
        "binary_expression",
    ] {
        let kind = language.id_for_name(name).unwrap();
        assert!(language.is_named(kind), "{name}");
    }
    // Hidden rules never show up as node kinds.
    assert_eq!(language.id_for_name("_expression"), None);
    assert_eq!(language.id_for_name("_statement"), None);

    for name in [
        "type",
        "name",
        "parameters",
        "body",
        "condition",
        "alternative",
        "value",
    ] {
        let field = language.field_id_for_name(name).unwrap();
        assert_eq!(language.field_name(field), Some(name));
    }
}

#[test]
fn test_corrupt_blob_is_rejected() {
    let mut blob = grammar_blob().unwrap().to_vec();
    let last = blob.len() - 1;
    blob[last] ^= 0xFF;
    let error = Language::from_blob(&blob, Arc::new(SysyLexer)).unwrap_err();
    assert!(
        matches!(error, GrammarLoadError::ChecksumMismatch { .. }),
        "{error}"
    );
}

#[test]
fn test_other_format_version_is_rejected() {
    let mut blob = grammar_blob().unwrap().to_vec();
    let found = GrammarLoadError::supported_version() + 1;
    blob[4..6].copy_from_slice(&found.to_le_bytes());
    let error = Language::from_blob(&blob, Arc::new(SysyLexer)).unwrap_err();
    assert_eq!(
        error,
        GrammarLoadError::VersionMismatch {
            expected: GrammarLoadError::supported_version(),
            found,
        }
    );
}
