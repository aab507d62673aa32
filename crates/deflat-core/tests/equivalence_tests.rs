//! Behavioral equivalence: generated dispatchers are run before and after
//! deobfuscation and must log the same lines.

#[path = "support/interp.rs"]
mod interp;

use deflat_core::{DeobOptions, deobfuscate};

/// Execution orders over the state values `0..n`.
const ORDERS: [&[i64]; 4] = [&[1, 0], &[2, 0, 1], &[3, 0, 4, 1, 2], &[5, 2, 7, 0, 3, 6, 1, 4]];

fn next_state(order: &[i64], value: i64) -> String {
    let position = order.iter().position(|&v| v == value).expect("state in order");
    match order.get(position + 1) {
        Some(next) => next.to_string(),
        None => "undefined".to_string(),
    }
}

fn state_body(order: &[i64], value: i64) -> String {
    format!("log(\"state {value}\"); s = {};", next_state(order, value))
}

fn sorted(order: &[i64]) -> Vec<i64> {
    let mut values = order.to_vec();
    values.sort_unstable();
    values
}

fn program(order: &[i64], dispatcher: &str, prelude: &str) -> String {
    labeled_program(order, "", "", dispatcher, prelude)
}

/// `setup` runs once before the loop; a non-empty `label` labels the loop.
fn labeled_program(order: &[i64], setup: &str, label: &str, dispatcher: &str, prelude: &str) -> String {
    let label = if label.is_empty() { String::new() } else { format!("{label}: ") };
    format!(
        "function run() {{\n    {setup}\n    {label}for (var s = {}; s !== undefined;) {{\n        {prelude}\n        {dispatcher}\n    }}\n}}\nrun();\n",
        order[0]
    )
}

/// `switch (s)` with one case per state.
fn direct_chain(order: &[i64]) -> String {
    let cases: String = sorted(order)
        .into_iter()
        .map(|v| format!("case {v}: {} break;\n", state_body(order, v)))
        .collect();
    program(order, &format!("switch (s) {{\n{cases}}}"), "")
}

/// States grouped by `s >> 2`, selected inside a group by `3 & s`.
fn groups(order: &[i64]) -> Vec<(i64, Vec<i64>)> {
    let mut groups: Vec<(i64, Vec<i64>)> = Vec::new();
    for v in sorted(order) {
        match groups.last_mut() {
            Some((group, members)) if *group == v >> 2 => members.push(v),
            _ => groups.push((v >> 2, vec![v])),
        }
    }
    groups
}

const MASK_PRELUDE: &str = "var a = 3 & s, b = s >> 2;";

/// Nested `switch (b) { case g: switch (a) { ... } }`.
fn masked_switch_chain(order: &[i64]) -> String {
    let mut outer = String::from("switch (b) {\n");
    for (group, members) in groups(order) {
        let inner: String = members
            .iter()
            .map(|&v| format!("case {}: {} break;\n", v & 3, state_body(order, v)))
            .collect();
        outer.push_str(&format!("case {group}: switch (a) {{\n{inner}}} break;\n"));
    }
    outer.push('}');
    program(order, &outer, MASK_PRELUDE)
}

/// `switch (b)` whose groups pick the state with an if-chain on `a`.
fn masked_if_chain(order: &[i64]) -> String {
    let mut outer = String::from("switch (b) {\n");
    for (group, members) in groups(order) {
        let selection = match members.as_slice() {
            [only] => state_body(order, *only),
            [init @ .., last] => {
                let mut chain = String::new();
                for &v in init {
                    chain.push_str(&format!("if (a == {}) {{ {} }} else ", v & 3, state_body(order, v)));
                }
                chain.push_str(&format!("{{ {} }}", state_body(order, *last)));
                chain
            }
            [] => String::new(),
        };
        outer.push_str(&format!("case {group}: {selection} break;\n"));
    }
    outer.push('}');
    program(order, &outer, MASK_PRELUDE)
}

/// Every other state leaves its case with `continue` instead of `break`.
fn continue_chain(order: &[i64]) -> String {
    let cases: String = sorted(order)
        .into_iter()
        .map(|v| {
            let jump = if v % 2 == 0 { "continue" } else { "break" };
            format!("case {v}: {} {jump};\n", state_body(order, v))
        })
        .collect();
    program(order, &format!("switch (s) {{\n{cases}}}"), "")
}

/// Each state first re-enters the dispatcher once without touching the
/// key, through a bare `break` or a `continue`.
fn reentrant_chain(order: &[i64]) -> String {
    let cases: String = sorted(order)
        .into_iter()
        .map(|v| {
            let jump = if v % 2 == 0 { "break" } else { "continue" };
            format!(
                "case {v}: r++; if (r % 2 == 1) {{ log(\"again {v}\"); {jump}; }} {} break;\n",
                state_body(order, v)
            )
        })
        .collect();
    labeled_program(order, "var r = 0;", "", &format!("switch (s) {{\n{cases}}}"), "")
}

/// A labeled dispatch loop left through `continue outer` and, from the
/// last state, `break outer`.
fn labeled_chain(order: &[i64]) -> String {
    let last = order[order.len() - 1];
    let cases: String = sorted(order)
        .into_iter()
        .map(|v| {
            if v == last {
                format!("case {v}: log(\"state {v}\"); break outer;\n")
            } else if v % 2 == 0 {
                format!("case {v}: {} continue outer;\n", state_body(order, v))
            } else {
                format!("case {v}: {} break;\n", state_body(order, v))
            }
        })
        .collect();
    labeled_program(order, "", "outer", &format!("switch (s) {{\n{cases}}}"), "")
}

fn state_lines(log: Vec<String>) -> Vec<String> {
    log.into_iter().filter(|line| line.starts_with("state ")).collect()
}

fn expected_log(order: &[i64]) -> Vec<String> {
    order.iter().map(|v| format!("state {v}")).collect()
}

fn assert_equivalent(source: &str) -> String {
    let output = deobfuscate(source, &DeobOptions::default()).expect("deobfuscation");
    let before = interp::run(source);
    let after = interp::run(&output.code);
    assert_eq!(before, after, "behavior changed\n--- input\n{source}\n--- output\n{}", output.code);
    output.code
}

#[test]
fn test_direct_chains_are_equivalent_and_flat() {
    for order in ORDERS {
        let source = direct_chain(order);
        assert_eq!(interp::run(&source), expected_log(order));
        let code = assert_equivalent(&source);
        assert!(!code.contains("switch"), "{code}");
        assert!(!code.contains("for ("), "{code}");
    }
}

#[test]
fn test_masked_switch_chains_are_equivalent_and_flat() {
    for order in ORDERS {
        let source = masked_switch_chain(order);
        assert_eq!(interp::run(&source), expected_log(order));
        let code = assert_equivalent(&source);
        assert!(!code.contains("switch"), "{code}");
        assert!(!code.contains("for ("), "{code}");
    }
}

#[test]
fn test_masked_if_chains_are_equivalent() {
    for order in ORDERS {
        let source = masked_if_chain(order);
        assert_eq!(interp::run(&source), expected_log(order));
        let code = assert_equivalent(&source);
        assert!(!code.contains("for ("), "{code}");
    }
}

#[test]
fn test_continue_chains_are_equivalent() {
    for order in ORDERS {
        let source = continue_chain(order);
        assert_eq!(interp::run(&source), expected_log(order));
        assert_equivalent(&source);
    }
}

#[test]
fn test_reentrant_chains_are_equivalent() {
    for order in ORDERS {
        let source = reentrant_chain(order);
        assert_eq!(state_lines(interp::run(&source)), expected_log(order));
        assert_equivalent(&source);
    }
}

#[test]
fn test_labeled_chains_are_equivalent() {
    for order in ORDERS {
        let source = labeled_chain(order);
        assert_eq!(interp::run(&source), expected_log(order));
        assert_equivalent(&source);
    }
}

#[test]
fn test_successor_with_continue_keeps_its_case() {
    let source = r#"
        function run() {
            var n = 0;
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("x"); s = 1; break;
                    case 1: n++; if (n < 3) { continue; } log("end"); s = undefined; break;
                }
            }
        }
        run();
    "#;
    assert_eq!(interp::run(source), vec!["x", "end"]);
    let code = assert_equivalent(source);
    assert!(code.contains("switch"), "{code}");
}

#[test]
fn test_successor_with_bare_break_keeps_its_case() {
    let source = r#"
        function run() {
            var n = 0;
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("x"); s = 1; break;
                    case 1: n++; if (n < 3) { log("wait"); break; } log("end"); s = undefined; break;
                }
            }
        }
        run();
    "#;
    assert_eq!(interp::run(source), vec!["x", "wait", "wait", "end"]);
    assert_equivalent(source);
}

#[test]
fn test_fall_through_into_a_continue_is_equivalent() {
    let source = r#"
        function run() {
            var n = 0;
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("a"); s = 1; break;
                    case 1: log("b"); n++;
                    case 2: if (n < 2) { continue; } log("c"); s = undefined; break;
                }
            }
        }
        run();
    "#;
    assert_eq!(interp::run(source), vec!["a", "b", "b", "c"]);
    assert_equivalent(source);
}

#[test]
fn test_branching_dispatcher_is_equivalent() {
    let source = r#"
        function run(n) {
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("start " + n); if (n > 2) { s = 1; } else { s = 2; } break;
                    case 1: log("big"); s = 3; break;
                    case 2: log("small"); s = 4; break;
                    case 4: log("smaller"); s = 3; break;
                    case 3: log("end"); s = undefined; break;
                }
            }
        }
        run(1);
        run(5);
    "#;
    let code = assert_equivalent(source);
    assert!(!code.contains("switch"), "{code}");
}

#[test]
fn test_counting_loop_is_equivalent() {
    let source = r#"
        function run(n) {
            var i = 0;
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("begin"); s = 1; break;
                    case 1: if (i < n) { log("step " + i); i++; s = 1; } else { s = 2; } break;
                    case 2: log("done " + i); s = undefined; break;
                }
            }
        }
        run(0);
        run(3);
    "#;
    let code = assert_equivalent(source);
    assert!(code.contains("while ("), "{code}");
}

#[test]
fn test_loop_into_middle_state_stays_dispatched_and_equivalent() {
    let source = r#"
        function run(n) {
            var i = 0;
            for (var s = 0; s !== undefined;) {
                switch (s) {
                    case 0: log("init"); s = 1; break;
                    case 1: log("body " + i); i++; s = 2; break;
                    case 2: log("check"); if (i < n) { s = 1; } else { s = undefined; } break;
                }
            }
        }
        run(2);
    "#;
    let code = assert_equivalent(source);
    assert!(code.contains("switch"), "{code}");
}

#[test]
fn test_return_value_survives() {
    let source = r#"
        function pick(n) {
            for (var s = 7; ;) {
                switch (s) {
                    case 7: if (n % 2 == 0) { s = 3; } else { s = 5; } break;
                    case 3: return "even";
                    case 5: return "odd";
                }
            }
        }
        log(pick(4));
        log(pick(7));
    "#;
    let code = assert_equivalent(source);
    assert!(!code.contains("switch"), "{code}");
}
