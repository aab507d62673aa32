use super::args::{CliArgs, DiagnosticsFormat};
use clap::Parser;

fn parse(argv: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("deflat").chain(argv.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn defaults_map_to_default_options() {
    let args = parse(&["packed.js"]);
    assert!(!args.reads_stdin());
    assert_eq!(args.diagnostics, DiagnosticsFormat::Text);

    let options = args.deob_options();
    assert_eq!(options.file_name, "packed.js");
    assert!(!options.skip_rename);
    assert!(!options.skip_control_flow);
    assert!(options.printer.remove_comments);
    assert!(options.printer.minimal_escape);
    assert_eq!(options.printer.indent_width, 4);
}

#[test]
fn flags_map_onto_options() {
    let args = parse(&[
        "packed.js",
        "-o",
        "clean.js",
        "--keep-comments",
        "--no-minimal-escape",
        "--indent",
        "2",
        "--no-rename",
        "--no-control-flow",
        "--diagnostics",
        "json",
    ]);
    assert_eq!(args.output.as_deref(), Some(std::path::Path::new("clean.js")));
    assert_eq!(args.diagnostics, DiagnosticsFormat::Json);

    let options = args.deob_options();
    assert!(options.skip_rename);
    assert!(options.skip_control_flow);
    assert!(!options.skip_member_hoist);
    assert!(!options.printer.remove_comments);
    assert!(!options.printer.minimal_escape);
    assert_eq!(options.printer.indent_width, 2);
}

#[test]
fn dash_reads_stdin() {
    let args = parse(&["-"]);
    assert!(args.reads_stdin());
    assert_eq!(args.file_name(), "<stdin>");
}

#[test]
fn input_is_required() {
    assert!(CliArgs::try_parse_from(["deflat"]).is_err());
}

#[test]
fn unknown_diagnostics_format_is_rejected() {
    assert!(CliArgs::try_parse_from(["deflat", "a.js", "--diagnostics", "xml"]).is_err());
}
