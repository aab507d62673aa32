//! File-level driver tests.

use clap::Parser;
use deflat_cli::args::CliArgs;
use deflat_cli::driver;
use deflat_common::diagnostics::diagnostic_codes;
use std::fs;
use tempfile::TempDir;

const PACKED: &str = r#"
function f() {
    for (var s = 0; ;) {
        switch (s) {
            case 0: log("a"); s = 2; break;
            case 1: log("b"); return;
            case 2: log("c"); s = 1; break;
        }
    }
}
"#;

fn args(argv: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("deflat").chain(argv.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn test_output_file_receives_the_result() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("packed.js");
    let output = dir.path().join("clean.js");
    fs::write(&input, PACKED).expect("write input");

    let result = driver::run(&args(&[
        input.to_str().expect("utf-8 path"),
        "-o",
        output.to_str().expect("utf-8 path"),
    ]))
    .expect("run succeeds");

    let written = fs::read_to_string(&output).expect("output written");
    assert_eq!(written, result.code);
    assert_eq!(
        written,
        "function _u1000f() {\n    log(\"a\");\n    log(\"c\");\n    log(\"b\");\n    return;\n}\n"
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == diagnostic_codes::LOOP_COLLAPSED)
    );
}

#[test]
fn test_no_control_flow_keeps_the_dispatcher() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("packed.js");
    let output = dir.path().join("out.js");
    fs::write(&input, PACKED).expect("write input");

    driver::run(&args(&[
        input.to_str().expect("utf-8 path"),
        "--no-control-flow",
        "--no-rename",
        "--indent",
        "2",
        "-o",
        output.to_str().expect("utf-8 path"),
    ]))
    .expect("run succeeds");

    let written = fs::read_to_string(&output).expect("output written");
    assert!(written.contains("switch (s) {"), "{written}");
    assert!(written.starts_with("function f() {\n  for (var s = 0;;) {"), "{written}");
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("nope.js");
    let err = driver::run(&args(&[missing.to_str().expect("utf-8 path")]))
        .err()
        .expect("missing file fails");
    assert!(err.to_string().contains("failed to read"), "{err}");
}

#[test]
fn test_syntax_error_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("broken.js");
    let output = dir.path().join("out.js");
    fs::write(&input, "var = ;").expect("write input");

    let result = driver::run(&args(&[
        input.to_str().expect("utf-8 path"),
        "-o",
        output.to_str().expect("utf-8 path"),
    ]));
    assert!(result.is_err());
    assert!(!output.exists());
}
