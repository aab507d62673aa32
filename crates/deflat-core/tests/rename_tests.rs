//! Renamer tests: unique names per binding, shadowing, globals.

use deflat_core::rename_identifiers;
use deflat_emitter::{PrinterOptions, print};
use deflat_parser::ParserState;

fn rename_source(source: &str) -> (String, usize) {
    let (mut arena, root, diagnostics) = ParserState::parse("test.js", source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let count = rename_identifiers(&mut arena, root);
    (print(&arena, root, &PrinterOptions::default()), count)
}

#[test]
fn test_bindings_get_role_suffixes_in_source_order() {
    let (out, count) = rename_source("function f(a) { var b = a; return b; }");
    assert_eq!(count, 3);
    assert_eq!(
        out,
        "function _u1000f(_u1001p) {\n    var _u1002v = _u1001p;\n    return _u1002v;\n}\n"
    );
}

#[test]
fn test_shadowed_bindings_get_distinct_names() {
    let (out, _) = rename_source("var x = 1; function g(x) { return x; } h(x);");
    assert_eq!(
        out,
        "var _u1000v = 1;\nfunction _u1001f(_u1002p) {\n    return _u1002p;\n}\nh(_u1000v);\n"
    );
}

#[test]
fn test_globals_keep_their_names() {
    let (out, count) = rename_source("log(undefined, Math.max(a, 1));");
    assert_eq!(count, 0);
    assert_eq!(out, "log(undefined, Math.max(a, 1));\n");
}

#[test]
fn test_property_names_are_not_renamed() {
    let (out, _) = rename_source("var o = { k: 1 }; o.k = 2;");
    assert_eq!(out, "var _u1000v = { k: 1 };\n_u1000v.k = 2;\n");
}

#[test]
fn test_fresh_names_avoid_existing_identifiers() {
    let (out, _) = rename_source("var a = _u1000v;");
    assert_eq!(out, "var _u1000v2 = _u1000v;\n");
}

#[test]
fn test_renaming_twice_keeps_names_unique() {
    let (once, _) = rename_source("function f(a, b) { var c = a + b; return c; }");
    let (twice, count) = rename_source(&once);
    assert_eq!(count, 4);
    let names: Vec<&str> = twice
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| word.starts_with("_u"))
        .collect();
    let mut unique = names.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 4, "{twice}");
}
