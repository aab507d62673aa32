//! Read the input, run the pipeline, write the result.

use anyhow::{Context, Result};
use deflat_common::Diagnostic;
use deflat_core::deobfuscate;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::args::CliArgs;

pub struct RunResult {
    pub source: String,
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn read_input(args: &CliArgs) -> Result<String> {
    if args.reads_stdin() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))
}

/// Deobfuscate `source` with the options `args` selects.
pub fn run_source(args: &CliArgs, source: String) -> Result<RunResult> {
    let options = args.deob_options();
    let output = deobfuscate(&source, &options)?;
    info!(
        file = %options.file_name,
        diagnostics = output.diagnostics.len(),
        "deobfuscated"
    );
    Ok(RunResult {
        source,
        code: output.code,
        diagnostics: output.diagnostics,
    })
}

pub fn write_output(path: Option<&Path>, code: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, code).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(code.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write stdout")
        }
    }
}

/// The whole command: read, deobfuscate, write.
pub fn run(args: &CliArgs) -> Result<RunResult> {
    let source = read_input(args)?;
    let result = run_source(args, source)?;
    write_output(args.output.as_deref(), &result.code)?;
    Ok(result)
}
