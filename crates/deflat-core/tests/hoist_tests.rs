//! Member-assignment hoisting on whole programs.

use deflat_core::{DeobOptions, deobfuscate, hoist_member_assignments};
use deflat_emitter::{PrinterOptions, print};
use deflat_parser::ParserState;

fn hoist_source(source: &str) -> (String, usize) {
    let (mut arena, root, diagnostics) = ParserState::parse("test.js", source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let count = hoist_member_assignments(&mut arena, root);
    (print(&arena, root, &PrinterOptions::default()), count)
}

#[test]
fn test_read_access_is_hoisted() {
    let (out, count) = hoist_source("y = obj[x -= 1];");
    assert_eq!(count, 1);
    assert_eq!(out, "x -= 1;\ny = obj[x];\n");
}

#[test]
fn test_hoist_inside_function_body() {
    let (out, count) = hoist_source("function f() { o[i += 4] = 0; }");
    assert_eq!(count, 1);
    assert_eq!(out, "function f() {\n    i += 4;\n    o[i] = 0;\n}\n");
}

#[test]
fn test_earlier_call_blocks_the_hoist() {
    let (out, count) = hoist_source("f(g(), b[x += 1]);");
    assert_eq!(count, 0);
    assert_eq!(out, "f(g(), b[x += 1]);\n");
}

#[test]
fn test_earlier_read_of_the_name_blocks_the_hoist() {
    let (out, count) = hoist_source("f(x, b[x += 1]);");
    assert_eq!(count, 0);
    assert_eq!(out, "f(x, b[x += 1]);\n");
}

#[test]
fn test_object_reading_the_name_blocks_the_hoist() {
    let (out, count) = hoist_source("a[i][i += 1] = 9;");
    assert_eq!(count, 0);
    assert_eq!(out, "a[i][i += 1] = 9;\n");
}

#[test]
fn test_object_with_a_call_blocks_the_hoist() {
    let (out, count) = hoist_source("g()[i += 1] = 1;");
    assert_eq!(count, 0);
    assert_eq!(out, "g()[i += 1] = 1;\n");
}

#[test]
fn test_object_with_the_name_as_base_blocks_the_hoist() {
    let (out, count) = hoist_source("i[i += 1] = 0;");
    assert_eq!(count, 0);
    assert_eq!(out, "i[i += 1] = 0;\n");
}

#[test]
fn test_short_circuit_blocks_the_hoist() {
    let (out, count) = hoist_source("a && b[x += 1];");
    assert_eq!(count, 0);
    assert_eq!(out, "a && b[x += 1];\n");
}

#[test]
fn test_non_expression_statement_is_left_alone() {
    let (out, count) = hoist_source("function f() { return o[x += 1]; }");
    assert_eq!(count, 0);
    assert_eq!(out, "function f() {\n    return o[x += 1];\n}\n");
}

#[test]
fn test_pipeline_hoists_after_renaming() {
    let out = deobfuscate("function f(o) { var i = 0; o[i += 1] = 2; }", &DeobOptions::default())
        .expect("deobfuscation");
    assert_eq!(
        out.code,
        "function _u1000f(_u1001p) {\n    var _u1002v = 0;\n    _u1002v += 1;\n    _u1001p[_u1002v] = 2;\n}\n"
    );
}

#[test]
fn test_pipeline_can_skip_the_hoist() {
    let options = DeobOptions {
        skip_member_hoist: true,
        ..DeobOptions::default()
    };
    let out = deobfuscate("function f(o) { var i = 0; o[i += 1] = 2; }", &options).expect("deobfuscation");
    assert!(out.code.contains("_u1001p[_u1002v += 1] = 2;"), "{}", out.code);
}
