//! Normalizer tests: each rule's canonical output, diagnostics, and
//! idempotence on mixed input.

use deflat_common::diagnostics::diagnostic_codes;
use deflat_core::{DeobContext, Normalizer, Rule, normalize};
use deflat_emitter::{PrinterOptions, print};
use deflat_parser::ParserState;

fn normalized(source: &str) -> (String, DeobContext) {
    let (mut arena, root, diagnostics) = ParserState::parse("test.js", source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let mut ctx = DeobContext::new();
    normalize(&mut arena, root, &mut ctx);
    (print(&arena, root, &PrinterOptions::default()), ctx)
}

fn normalize_source(source: &str) -> String {
    normalized(source).0
}

#[test]
fn test_literal_first_comparison_is_swapped() {
    assert_eq!(normalize_source("if (3 == x) y();"), "if (x == 3) {\n    y();\n}\n");
    assert_eq!(normalize_source("if (1 < x) y();"), "if (x > 1) {\n    y();\n}\n");
    assert_eq!(normalize_source("if (2 >= x) y();"), "if (x <= 2) {\n    y();\n}\n");
}

#[test]
fn test_comparison_between_names_is_kept() {
    assert_eq!(normalize_source("if (a < b) y();"), "if (a < b) {\n    y();\n}\n");
}

#[test]
fn test_conditional_statement_becomes_if() {
    assert_eq!(
        normalize_source("a ? b() : c();"),
        "if (a) {\n    b();\n} else {\n    c();\n}\n"
    );
}

#[test]
fn test_logical_and_statement_becomes_if() {
    assert_eq!(normalize_source("a && b();"), "if (a) {\n    b();\n}\n");
}

#[test]
fn test_conditional_assignment_is_distributed() {
    assert_eq!(
        normalize_source("x = t ? 1 : 2;"),
        "if (t) {\n    x = 1;\n} else {\n    x = 2;\n}\n"
    );
}

#[test]
fn test_conditional_assignment_to_computed_target_is_kept() {
    assert_eq!(normalize_source("o[k()] = t ? 1 : 2;"), "o[k()] = t ? 1 : 2;\n");
}

#[test]
fn test_sequence_statement_is_split() {
    assert_eq!(normalize_source("a(), b(), c();"), "a();\nb();\nc();\n");
}

#[test]
fn test_return_sequence_is_split() {
    assert_eq!(
        normalize_source("function f() { return a(), b(); }"),
        "function f() {\n    a();\n    return b();\n}\n"
    );
}

#[test]
fn test_if_test_sequence_is_split() {
    assert_eq!(
        normalize_source("function f() { if (a(), b) c(); }"),
        "function f() {\n    a();\n    if (b) {\n        c();\n    }\n}\n"
    );
}

#[test]
fn test_void_forms() {
    assert_eq!(normalize_source("x = void 0;"), "x = undefined;\n");
    assert_eq!(normalize_source("void f();"), "f();\n");
    assert_eq!(normalize_source("x = void f();"), "x = void f();\n");
}

#[test]
fn test_case_clauses_hold_one_block() {
    assert_eq!(
        normalize_source("switch (k) { case 1: a(); break; default: b(); }"),
        "switch (k) {\n    case 1: {\n        a();\n        break;\n    }\n    default: {\n        b();\n    }\n}\n"
    );
}

#[test]
fn test_loop_bodies_become_blocks() {
    assert_eq!(normalize_source("while (a) b();"), "while (a) {\n    b();\n}\n");
    assert_eq!(normalize_source("for (;;) ;"), "for (;;) {}\n");
}

#[test]
fn test_nested_blocks_are_flattened() {
    assert_eq!(normalize_source("{ a(); { b(); } }"), "a();\nb();\n");
}

#[test]
fn test_block_with_let_keeps_its_scope() {
    assert_eq!(
        normalize_source("a(); { let x = 1; f(x); }"),
        "a();\n{\n    let x = 1;\n    f(x);\n}\n"
    );
}

#[test]
fn test_iife_is_inlined_inside_function() {
    assert_eq!(
        normalize_source("function f() { !function () { a(); b(); }(); }"),
        "function f() {\n    a();\n    b();\n}\n"
    );
}

#[test]
fn test_iife_with_return_is_kept_and_reported() {
    let (out, ctx) = normalized("function f() { !function () { return a(); }(); }");
    assert!(out.contains("!function () {"), "{out}");
    assert!(
        ctx.diagnostics
            .iter()
            .any(|d| d.code == diagnostic_codes::INLINE_SKIPPED)
    );
}

#[test]
fn test_top_level_iife_is_kept() {
    let out = normalize_source("!function () { a(); }();");
    assert!(out.starts_with("!function () {"), "{out}");
}

#[test]
fn test_conditional_in_unexpected_position_is_reported_once() {
    let (out, ctx) = normalized("f(a ? b : c), g();");
    assert!(out.contains("f(a ? b : c);"), "{out}");
    let reports = ctx
        .diagnostics
        .iter()
        .filter(|d| d.code == diagnostic_codes::UNEXPECTED_PARENT_TYPE)
        .count();
    assert!(reports <= 1, "reported {reports} times");
}

#[test]
fn test_single_rule_can_run_alone() {
    let (mut arena, root, _) = ParserState::parse("test.js", "if (3 == x) y();");
    let mut ctx = DeobContext::new();
    let changed = Normalizer::new(&mut arena, root, &mut ctx).run_rule(Rule::IfTestBinary);
    assert!(changed);
    assert_eq!(print(&arena, root, &PrinterOptions::default()), "if (x == 3)\n    y();\n");
}

#[test]
fn test_normalization_is_idempotent() {
    let source = r#"
        function f(a, b) {
            a ? b() : c();
            x = a ? 1 : 2;
            a && b();
            d(), e(), g();
            if (0 === a) { { h(); } }
            switch (a) { case 1: i(); break; default: j(); }
            for (var k = 0; k < 3; k++) l(k);
            while (m) n();
            return o(), p;
        }
    "#;
    let once = normalize_source(source);
    let twice = normalize_source(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_rule_list_is_stable() {
    assert_eq!(Rule::ALL.len(), 12);
    assert_eq!(Rule::ALL[0].name(), "remove-void");
    assert_eq!(Rule::ALL[11].name(), "flatten-block");
}
