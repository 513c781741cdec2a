#![no_main]

use libfuzzer_sys::fuzz_target;
use sysy_parser::{Terminal, tokenize};

fuzz_target!(|data: &[u8]| {
    let mut end = 0;
    for lexeme in tokenize(data) {
        // Tokens are non-empty, ordered and inside the input.
        assert!(lexeme.range.start >= end);
        assert!(lexeme.range.start < lexeme.range.end);
        assert!(lexeme.range.end <= data.len());
        assert_ne!(lexeme.terminal, Terminal::End);
        end = lexeme.range.end;
    }
});
