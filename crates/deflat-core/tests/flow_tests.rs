//! End-to-end control-flow reconstruction through `deobfuscate`.

use deflat_common::diagnostics::diagnostic_codes;
use deflat_core::flow::{merge_dispatchers, track_keys};
use deflat_core::{DeobContext, DeobOptions, classify, deobfuscate, normalize};
use deflat_emitter::{PrinterOptions, print};
use deflat_parser::ParserState;
use std::collections::BTreeMap;

fn run(source: &str) -> deflat_core::DeobOutput {
    deobfuscate(source, &DeobOptions::default()).expect("deobfuscation")
}

fn has_code(output: &deflat_core::DeobOutput, code: u32) -> bool {
    output.diagnostics.iter().any(|d| d.code == code)
}

const THREE_STATES: &str = r#"
function f() {
    for (var s = 0; ;) {
        switch (s) {
            case 0:
                log("a");
                s = 2;
                break;
            case 1:
                log("b");
                return;
            case 2:
                log("c");
                s = 1;
                break;
        }
    }
}
"#;

#[test]
fn test_three_states_become_straight_line_code() {
    let out = run(THREE_STATES);
    assert_eq!(
        out.code,
        "function _u1000f() {\n    log(\"a\");\n    log(\"c\");\n    log(\"b\");\n    return;\n}\n"
    );
    assert!(has_code(&out, diagnostic_codes::DISPATCH_KEY));
    assert!(has_code(&out, diagnostic_codes::LOOP_COLLAPSED));
}

#[test]
fn test_key_declared_before_the_loop() {
    let out = run(r#"
        function f() {
            var s = 1;
            for (;;) {
                switch (s) {
                    case 0: log("second"); return;
                    case 1: log("first"); s = 0; break;
                }
            }
        }
    "#);
    assert_eq!(
        out.code,
        "function _u1000f() {\n    log(\"first\");\n    log(\"second\");\n    return;\n}\n"
    );
}

#[test]
fn test_shared_successor_is_hoisted_after_if() {
    let out = run(r#"
        function f(n) {
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("start"); if (n > 2) { s = 1; } else { s = 2; } break;
                    case 1: log("big"); s = 3; break;
                    case 2: log("small"); s = 3; break;
                    case 3: log("end"); s = undefined; break;
                }
            }
        }
    "#);
    assert!(!out.code.contains("switch"), "{}", out.code);
    assert!(
        out.code.contains("} else {\n        log(\"small\");\n    }\n    log(\"end\");"),
        "{}",
        out.code
    );
}

#[test]
fn test_self_jump_becomes_while_loop() {
    let out = run(r#"
        function f(n) {
            var i = 0;
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("begin"); s = 1; break;
                    case 1: if (i < n) { log(i); i++; s = 1; } else { s = 2; } break;
                    case 2: log("end"); s = undefined; break;
                }
            }
        }
    "#);
    assert!(out.code.contains("while (_u1002v < _u1001p) {"), "{}", out.code);
    assert!(!out.code.contains("switch"), "{}", out.code);
}

#[test]
fn test_masked_dispatcher_with_if_chain() {
    let out = run(r#"
        function f() {
            for (var s = 2; s !== undefined;) {
                var a = 3 & s, b = s >> 2;
                switch (b) {
                    case 0:
                        if (a < 2) { if (a == 0) { log("zero"); s = undefined; } else { log("one"); s = 0; } }
                        else { if (a == 2) { log("two"); s = 1; } else { log("three"); s = undefined; } }
                        break;
                }
            }
        }
    "#);
    assert!(has_code(&out, diagnostic_codes::DISPATCH_VARIABLE));
    assert!(!out.code.contains("switch"), "{}", out.code);
    assert!(
        out.code.contains("log(\"two\");\n    log(\"one\");\n    log(\"zero\");"),
        "{}",
        out.code
    );
}

#[test]
fn test_ambiguous_chain_reports_multiple_default() {
    let out = run(r#"
        function f() {
            for (var s = 0; s !== undefined;) {
                var a = 7 & s, b = s >> 3;
                if (a < 4) { log("low"); s = undefined; } else { log("high"); s = undefined; }
            }
        }
    "#);
    assert!(has_code(&out, diagnostic_codes::MULTIPLE_DEFAULT_CHOICE));
    assert!(out.code.contains("if (_u1002v < 4)"), "{}", out.code);
}

#[test]
fn test_computed_key_write_is_left_alone() {
    let source = r#"
        function f(x) {
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: s = x + 1; break;
                    case 1: log("one"); s = undefined; break;
                }
            }
        }
    "#;
    let out = run(source);
    assert!(has_code(&out, diagnostic_codes::OPAQUE_KEY));
    assert!(out.code.contains("switch (_u1002v)"), "{}", out.code);
    assert!(out.code.contains("case 0:"), "{}", out.code);
}

#[test]
fn test_unselected_case_is_dropped_with_warning() {
    let out = run(r#"
        function f() {
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("a"); s = undefined; break;
                    case 9: log("dead"); s = undefined; break;
                }
            }
        }
    "#);
    assert!(has_code(&out, diagnostic_codes::DROP_IN_KEY));
    assert!(!out.code.contains("dead"), "{}", out.code);
}

#[test]
fn test_histogram_counts_static_assignment_sites() {
    let source = r#"
        function f(n) {
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: if (n) { s = 1; } else { s = 2; } break;
                    case 1: log("x"); s = 2; break;
                    case 2: log("y"); s = undefined; break;
                }
            }
        }
    "#;
    let (mut arena, root, _) = ParserState::parse("test.js", source);
    let mut ctx = DeobContext::new();
    normalize(&mut arena, root, &mut ctx);
    classify(&arena, root, &mut ctx);
    track_keys(&arena, root, &mut ctx);
    assert_eq!(ctx.keys["s"].value_histogram, BTreeMap::from([(0, 1), (1, 1), (2, 2)]));

    merge_dispatchers(&mut arena, root, &mut ctx);
    let key = &ctx.keys["s"];
    assert_eq!(key.count(1), 0);
    let printed = print(&arena, root, &PrinterOptions::default());
    assert!(!printed.contains("case 1:"), "{printed}");
}

#[test]
fn test_output_is_a_printing_fixpoint() {
    let first = run(THREE_STATES).code;
    let (arena, root, diagnostics) = ParserState::parse("again.js", &first);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(print(&arena, root, &PrinterOptions::default()), first);
}

#[test]
fn test_skip_control_flow_keeps_the_loop() {
    let options = DeobOptions {
        skip_control_flow: true,
        ..DeobOptions::default()
    };
    let out = deobfuscate(THREE_STATES, &options).expect("deobfuscation");
    assert!(out.code.contains("switch (_u1001v)"), "{}", out.code);
}
