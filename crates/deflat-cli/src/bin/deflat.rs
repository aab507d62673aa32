#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use deflat_cli::args::{CliArgs, DiagnosticsFormat};
use deflat_cli::driver;
use deflat_cli::reporter::Reporter;

fn main() -> Result<()> {
    // Installs a subscriber only when DEFLAT_LOG or RUST_LOG is set.
    deflat_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let result = driver::run(&args)?;
    if result.diagnostics.is_empty() {
        return Ok(());
    }

    let file_name = args.file_name();
    let color = !args.no_color && std::io::stderr().is_terminal();
    let reporter = Reporter::new(&file_name, &result.source, color);
    let rendered = match args.diagnostics {
        DiagnosticsFormat::Text => reporter.render(&result.diagnostics),
        DiagnosticsFormat::Json => reporter.render_json(&result.diagnostics)?,
    };
    eprint!("{rendered}");
    Ok(())
}
