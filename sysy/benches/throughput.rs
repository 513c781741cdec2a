use divan::{Bencher, black_box};
use sysy_parser::{Edit, Parser, load_grammar, tokenize};

use divan::AllocProfiler;

#[allow(unused)]
#[cfg_attr(feature = "alloc", global_allocator)]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

const SAMPLE_FUNCTIONS: &[&str] = &[
    "int add(int a, int b) { return a + b; }\n",
    "int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n",
    "void fill(int a[], int n) { int i = 0; while (i < n) { a[i] = i * i % 7; i = i + 1; } }\n",
    "const int TABLE[2][3] = {{1, 2, 3}, {0x4, 05, 6}};\n",
    "int main() { /* entry */ int x = getint(); putint(add(x, fib(x))); return 0; }\n",
];

/// A program of `count` top-level items.
fn generate_program(count: usize) -> String {
    let mut result = String::with_capacity(count * 80);
    for i in 0..count {
        result.push_str(SAMPLE_FUNCTIONS[i % SAMPLE_FUNCTIONS.len()]);
    }
    result
}

#[divan::bench(name = "lex", args = [100, 1000, 10_000])]
fn bench_lex(bencher: Bencher, n: usize) {
    let input = generate_program(n);
    bencher
        .counter(divan::counter::BytesCount::new(input.len()))
        .bench(|| black_box(tokenize(input.as_bytes())));
}

#[divan::bench(name = "full_parse", args = [100, 1000, 10_000])]
fn bench_full_parse(bencher: Bencher, n: usize) {
    let language = load_grammar().unwrap();
    let input = generate_program(n);
    bencher
        .counter(divan::counter::BytesCount::new(input.len()))
        .with_inputs(|| Parser::new(&language))
        .bench_local_values(|mut parser| black_box(parser.parse(input.as_bytes())));
}

/// Replaces one digit in the middle of the file and reparses.
#[divan::bench(name = "single_character_edit", args = [100, 1000, 10_000])]
fn bench_single_character_edit(bencher: Bencher, n: usize) {
    let language = load_grammar().unwrap();
    let input = generate_program(n);
    let at = input.len() / 2 + input[input.len() / 2..].find('2').unwrap();
    let edit = Edit::replace(at..at + 1, 1);
    let mut edited = input.clone().into_bytes();
    edited[at] = b'3';

    let mut parser = Parser::new(&language);
    let tree = parser.parse(input.as_bytes());
    bencher.bench_local(|| black_box(parser.parse_incremental(&tree, &edit, &edited).unwrap()));
}

#[divan::bench(name = "reparse_without_reuse", args = [100, 1000, 10_000])]
fn bench_reparse_without_reuse(bencher: Bencher, n: usize) {
    let language = load_grammar().unwrap();
    let input = generate_program(n);
    let at = input.len() / 2 + input[input.len() / 2..].find('2').unwrap();
    let edit = Edit::replace(at..at + 1, 1);
    let mut edited = input.clone().into_bytes();
    edited[at] = b'3';

    let config = sysy_parser::ParseConfig::new().with_reuse(false);
    let mut parser = Parser::with_config(&language, config);
    let tree = parser.parse(input.as_bytes());
    bencher.bench_local(|| black_box(parser.parse_incremental(&tree, &edit, &edited).unwrap()));
}

#[divan::bench]
fn bench_load_grammar() -> sysy_parser::Language {
    load_grammar().unwrap()
}
