#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sysy_parser::{Edit, Language, Parser, load_grammar};

fn language() -> &'static Language {
    static LANGUAGE: OnceLock<Language> = OnceLock::new();
    LANGUAGE.get_or_init(|| load_grammar().expect("sysy grammar loads"))
}

#[derive(Debug, Arbitrary)]
struct Change {
    start: u16,
    removed: u8,
    inserted: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    source: Vec<u8>,
    changes: Vec<Change>,
    /// Raw edits, most of them invalid; they must be rejected, not panic.
    raw: Vec<Edit>,
}

fuzz_target!(|input: Input| {
    let mut parser = Parser::new(language());
    let mut text = input.source;
    let mut tree = parser.parse(&text);

    for edit in &input.raw {
        if edit.validate(text.len()).is_err() {
            assert!(tree.edit(edit).is_err());
        }
    }

    for change in input.changes.iter().take(8) {
        let start = usize::from(change.start) % (text.len() + 1);
        let end = (start + usize::from(change.removed)).min(text.len());
        let edit = Edit::replace(start..end, change.inserted.len());
        text = edit.apply(&text, &change.inserted).expect("edit fits the text");
        tree = parser
            .parse_incremental(&tree, &edit, &text)
            .expect("edit fits the tree");
        let fresh = Parser::new(language()).parse(&text);
        assert!(
            tree.structurally_eq(&fresh),
            "incremental: {}\nfresh: {}",
            tree.to_sexp(),
            fresh.to_sexp()
        );
    }
});
