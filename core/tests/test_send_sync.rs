use sysy_parser_core::{Language, ParseTables, Parser, Tree};

fn assert_send<T: Send>() {}
fn assert_sync<T: Sync>() {}

#[test]
fn runtime_types_send_sync() {
    // Trees and languages are shared across threads; parsers are moved.
    assert_send::<Language>();
    assert_sync::<Language>();
    assert_send::<ParseTables>();
    assert_sync::<ParseTables>();
    assert_send::<Tree>();
    assert_sync::<Tree>();
    assert_send::<Parser>();
}
