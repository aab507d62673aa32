//! The deobfuscation pipeline: parse, rewrite, print.

use crate::classify::classify;
use crate::context::DeobContext;
use crate::error::DeobError;
use crate::flow::{flatten_if_chains, merge_dispatchers, track_keys};
use crate::hoist::hoist_member_assignments;
use crate::normalize::normalize;
use crate::rename::rename_identifiers;
use deflat_common::Diagnostic;
use deflat_emitter::{PrinterOptions, print};
use deflat_parser::{NodeArena, NodeIndex, ParserState};
use serde::Serialize;
use tracing::{debug, debug_span, info};

/// Options for one `deobfuscate` run.
#[derive(Clone, Debug, Serialize)]
pub struct DeobOptions {
    /// Name used in parse errors and diagnostics.
    pub file_name: String,
    pub skip_rename: bool,
    pub skip_normalize: bool,
    /// Skip classification, if-chain flattening, tracking and merging.
    pub skip_control_flow: bool,
    pub skip_member_hoist: bool,
    pub printer: PrinterOptions,
}

impl Default for DeobOptions {
    fn default() -> Self {
        DeobOptions {
            file_name: "input.js".to_string(),
            skip_rename: false,
            skip_normalize: false,
            skip_control_flow: false,
            skip_member_hoist: false,
            printer: PrinterOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DeobOutput {
    pub code: String,
    /// Advisory records, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Deobfuscate one JavaScript source text.
///
/// Only a syntax error fails the run. Everything the passes cannot handle is
/// left as it was and reported in `DeobOutput::diagnostics`.
pub fn deobfuscate(source: &str, options: &DeobOptions) -> Result<DeobOutput, DeobError> {
    let _span = debug_span!("deobfuscate", file = %options.file_name).entered();
    let (mut arena, root, parse_diagnostics) = ParserState::parse(&options.file_name, source);
    if let Some(first) = parse_diagnostics.first() {
        return Err(DeobError::Parse {
            file_name: options.file_name.clone(),
            message: first.message.clone(),
            diagnostics: parse_diagnostics,
        });
    }

    let mut ctx = DeobContext::new();
    run_passes(&mut arena, root, &mut ctx, options);

    let code = {
        let _span = debug_span!("print").entered();
        print(&arena, root, &options.printer)
    };
    info!(
        file = %options.file_name,
        diagnostics = ctx.diagnostics.len(),
        "deobfuscated"
    );
    Ok(DeobOutput {
        code,
        diagnostics: ctx.diagnostics,
    })
}

/// Run every enabled pass over an already parsed tree.
pub fn run_passes(arena: &mut NodeArena, root: NodeIndex, ctx: &mut DeobContext, options: &DeobOptions) {
    if !options.skip_rename {
        let renamed = rename_identifiers(arena, root);
        debug!(renamed, "identifiers renamed");
    }
    if !options.skip_normalize {
        normalize(arena, root, ctx);
    }
    if !options.skip_control_flow {
        let _span = debug_span!("control_flow").entered();
        classify(arena, root, ctx);
        flatten_if_chains(arena, root, ctx);
        track_keys(arena, root, ctx);
        let merged = merge_dispatchers(arena, root, ctx);
        debug!(merged, keys = ctx.keys.len(), "dispatchers merged");
    }
    if !options.skip_member_hoist {
        hoist_member_assignments(arena, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_fails_the_run() {
        let err = deobfuscate("var = ;", &DeobOptions::default()).unwrap_err();
        assert!(matches!(err, DeobError::Parse { ref file_name, .. } if file_name == "input.js"));
    }

    #[test]
    fn plain_code_only_gets_renamed() {
        let out = deobfuscate("function f(a) {\n    return a + 1;\n}\n", &DeobOptions::default()).unwrap();
        assert_eq!(out.code, "function _u1000f(_u1001p) {\n    return _u1001p + 1;\n}\n");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn skipped_passes_leave_the_tree_alone() {
        let options = DeobOptions {
            skip_rename: true,
            skip_normalize: true,
            skip_control_flow: true,
            skip_member_hoist: true,
            ..DeobOptions::default()
        };
        let out = deobfuscate("if (3 == x) { y(); }", &options).unwrap();
        assert_eq!(out.code, "if (3 == x) {\n    y();\n}\n");
    }
}
