use clap::{Parser, ValueEnum};
use deflat_core::DeobOptions;
use deflat_emitter::PrinterOptions;
use std::path::PathBuf;

/// CLI arguments for the deflat binary.
#[derive(Parser, Debug)]
#[command(
    name = "deflat",
    version,
    about = "Undo control-flow flattening in obfuscated JavaScript"
)]
pub struct CliArgs {
    /// Input file, or `-` to read from stdin.
    pub input: PathBuf,

    /// Write the result here instead of stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    // ==================== Printing ====================
    /// Keep source comments in the output.
    #[arg(long = "keep-comments")]
    pub keep_comments: bool,

    /// Escape every non-ASCII character in string literals.
    #[arg(long = "no-minimal-escape")]
    pub no_minimal_escape: bool,

    /// Spaces per indentation level.
    #[arg(long, default_value_t = 4)]
    pub indent: u32,

    // ==================== Passes ====================
    /// Keep the original binding names.
    #[arg(long = "no-rename")]
    pub no_rename: bool,

    /// Skip dispatcher detection and reconstruction.
    #[arg(long = "no-control-flow")]
    pub no_control_flow: bool,

    // ==================== Reporting ====================
    /// How advisory diagnostics are written to stderr.
    #[arg(long, value_enum, default_value_t = DiagnosticsFormat::Text)]
    pub diagnostics: DiagnosticsFormat,

    /// Disable colored diagnostics.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DiagnosticsFormat {
    Text,
    Json,
}

impl CliArgs {
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Name used for the input in errors and diagnostics.
    pub fn file_name(&self) -> String {
        if self.reads_stdin() {
            "<stdin>".to_string()
        } else {
            self.input.display().to_string()
        }
    }

    pub fn deob_options(&self) -> DeobOptions {
        DeobOptions {
            file_name: self.file_name(),
            skip_rename: self.no_rename,
            skip_control_flow: self.no_control_flow,
            printer: PrinterOptions {
                remove_comments: !self.keep_comments,
                minimal_escape: !self.no_minimal_escape,
                indent_width: self.indent,
            },
            ..DeobOptions::default()
        }
    }
}
