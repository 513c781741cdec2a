#![allow(dead_code)]

use sysy_parser::{Language, Parser, Tree, load_grammar};
use tracing_subscriber::EnvFilter;

/// Routes engine events to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn language() -> Language {
    init_tracing();
    load_grammar().unwrap()
}

pub fn parse(source: &str) -> Tree {
    Parser::new(&language()).parse(source.as_bytes())
}

/// S-expression of the first top-level item.
pub fn first_item(source: &str) -> String {
    parse(source).root_node().child(0).unwrap().to_sexp()
}

/// Everything a small program can contain.
pub const SAMPLE: &str = "\
// Sum of the first N squares.
const int N = 10;
int squares[N] = {0};

int square(int x) {
    return x * x;
}

int main() {
    int i = 0, total = 0;
    while (i < N) {
        if (i % 2 == 0 && i != 4) {
            squares[i] = square(i);
        } else {
            squares[i] = -1;
            i = i + 1;
            continue;
        }
        total = total + squares[i];
        i = i + 1;
    }
    /* done */
    putint(total);
    return 0;
}
";
