#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use sysy_parser::{Language, Parser, load_grammar};

fn language() -> &'static Language {
    static LANGUAGE: OnceLock<Language> = OnceLock::new();
    LANGUAGE.get_or_init(|| load_grammar().expect("sysy grammar loads"))
}

fuzz_target!(|data: &[u8]| {
    let tree = Parser::new(language()).parse(data);
    let root = tree.root_node();
    assert_eq!(root.byte_range(), 0..data.len());

    let mut end = 0;
    for node in tree.walk().preorder() {
        let range = node.byte_range();
        assert!(range.start <= range.end);
        assert!(range.end <= data.len());
        if node.child_count() == 0 {
            assert!(range.start >= end, "leaves overlap at {range:?}");
            end = range.end;
        }
    }
    if !tree.has_error() {
        assert!(tree.errors().is_empty());
    }
});
