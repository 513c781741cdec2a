//! Fresh parses of well-formed input.
mod common;

use common::parse;
use pretty_assertions::assert_eq;

#[test]
fn test_precedence_shapes_tree() {
    let tree = parse("1+2*3;");
    insta::assert_snapshot!(tree.to_sexp(), @"(program (statement value: (binary left: (number) right: (binary left: (number) right: (number)))))");
}

#[test]
fn test_left_associativity() {
    let tree = parse("1+2+3;");
    insta::assert_snapshot!(tree.to_sexp(), @"(program (statement value: (binary left: (binary left: (number) right: (number)) right: (number))))");
}

#[test]
fn test_parentheses_override_precedence() {
    let tree = parse("(1+2)*3;");
    insta::assert_snapshot!(tree.to_sexp(), @"(program (statement value: (binary left: (parenthesized (binary left: (number) right: (number))) right: (number))))");
}

#[test]
fn test_hidden_list_is_flattened_into_root() {
    let tree = parse("1;\n2;\n3;\n");
    let root = tree.root_node();
    assert_eq!(root.child_count(), 3);
    assert!(root.children().all(|c| c.kind() == "statement"));
}

#[test]
fn test_root_spans_whole_text() {
    let source = "  1 ;  \n";
    let tree = parse(source);
    let root = tree.root_node();
    assert_eq!(root.byte_range(), 0..source.len());
    assert_eq!(tree.source_len(), source.len());
    // The statement starts after the leading padding.
    assert_eq!(root.child(0).unwrap().byte_range(), 2..5);
}

#[test]
fn test_child_ranges_are_nested_and_ordered() {
    let source = "(12 + 3) * 45;\n7;";
    let tree = parse(source);
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        let range = node.byte_range();
        let mut previous_end = range.start;
        for child in node.children() {
            let child_range = child.byte_range();
            assert!(child_range.start >= previous_end, "{child:?} overlaps");
            assert!(child_range.end <= range.end, "{child:?} escapes {node:?}");
            previous_end = child_range.end;
            stack.push(child);
        }
    }
}

#[test]
fn test_fields_and_text() {
    let source = b"10 * 20;";
    let tree = parse("10 * 20;");
    let binary = tree.root_node().child(0).unwrap().child_by_field_name("value").unwrap();
    assert_eq!(binary.kind(), "binary");
    assert_eq!(binary.utf8_text(source).unwrap(), "10 * 20");
    assert_eq!(
        binary.child_by_field_name("left").unwrap().utf8_text(source).unwrap(),
        "10"
    );
    assert_eq!(
        binary.child_by_field_name("operator").unwrap().utf8_text(source).unwrap(),
        "*"
    );
    assert_eq!(binary.field_name_for_child(2), Some("right"));
    assert!(binary.child_by_field_name("value").is_none());
    assert!(binary.child_by_field_name("no_such_field").is_none());
}

#[test]
fn test_valid_input_has_no_errors() {
    let tree = parse("((1));\n2 * (3 + 4);");
    assert!(!tree.has_error());
    assert!(tree.errors().is_empty());
}

#[test]
fn test_long_statement_list() {
    let source: String = (0..5_000).map(|i| format!("{i} + {i};\n")).collect();
    let tree = parse(&source);
    assert!(!tree.has_error());
    assert_eq!(tree.root_node().child_count(), 5_000);
}

#[test]
fn test_deep_nesting() {
    let depth = 2_000;
    let source = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(&source);
    assert!(!tree.has_error());
    let mut node = tree.root_node().child(0).unwrap().child(0).unwrap();
    let mut levels = 0;
    while node.kind() == "parenthesized" {
        levels += 1;
        node = node.named_child(0).unwrap();
    }
    assert_eq!(levels, depth);
}
