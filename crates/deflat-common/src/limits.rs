//! Centralized limits and thresholds for the deobfuscation passes.
//!
//! Every pass that recurses over the tree or iterates to a fixpoint takes its
//! bound from here, so a hostile input degrades into "left unchanged" rather
//! than a stack overflow or a hang.

/// Maximum recursion depth of the bounded expression evaluator.
pub const MAX_EVAL_DEPTH: u32 = 256;

/// Maximum number of full walks a single normalization rule may take before
/// it is considered to have reached its fixpoint.
pub const MAX_NORMALIZE_ITERATIONS: usize = 64;

/// Maximum number of merge sweeps over one dispatcher's case table.
pub const MAX_MERGE_SWEEPS: usize = 1_000;

/// Maximum recursion depth while walking a case body during merging.
pub const MAX_MERGE_DEPTH: u32 = 512;

/// Largest dispatch-variable domain the if-chain flattener will enumerate.
pub const MAX_DISPATCH_DOMAIN: i64 = 4_096;

/// Maximum nesting depth accepted by the parser.
pub const MAX_PARSER_DEPTH: u32 = 256;

/// Suffix attempts when a generated name collides with an existing identifier.
pub const MAX_RENAME_SUFFIX: u32 = 10_000;
