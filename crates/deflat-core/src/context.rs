//! Per-run classification tables and the diagnostics sink.
//!
//! A `DeobContext` is created for one pipeline run. The classifier fills the
//! dispatch-variable and key tables, the tracker rebuilds each key's
//! histogram, and the flattening passes read both.

use deflat_common::{Diagnostic, DiagnosticCategory, DiagnosticMessage};
use deflat_parser::{NodeArena, NodeIndex};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info, warn};

/// A state variable derived from a bitmask: `name = mask & parent`.
#[derive(Clone, Debug)]
pub struct DispatchVariable {
    pub name: String,
    /// Number of values the variable can take (`mask + 1`).
    pub domain_size: i64,
    /// Key of the dispatch loop the variable lives in.
    pub root_key: String,
    /// First identifier of the masked operand, if any.
    pub parent: Option<String>,
    /// The `VARIABLE_DECLARATION` node.
    pub declaration: NodeIndex,
}

/// One dispatch loop, identified by its induction variable.
#[derive(Clone, Debug)]
pub struct KeyInfo {
    pub key_name: String,
    pub start_value: i64,
    /// The `for` statement.
    pub loop_node: NodeIndex,
    /// Variable statement deriving the dispatch variables from the key.
    pub prelude: Option<NodeIndex>,
    /// Index of the dispatcher statement in the loop body.
    pub dispatch_slot: usize,
    /// Declaration of the key: in the loop initializer or just before the loop.
    pub key_declaration: NodeIndex,
    pub child_vars: IndexSet<String>,
    /// Literal key value to the number of places that produce it.
    pub value_histogram: BTreeMap<i64, u32>,
    /// Values that leave the loop instead of selecting a case.
    pub exit_values: BTreeSet<i64>,
    /// Why the key cannot be merged, when it cannot.
    pub opaque: Option<String>,
    pub visited: bool,
}

impl KeyInfo {
    pub fn new(key_name: &str, start_value: i64, loop_node: NodeIndex) -> Self {
        KeyInfo {
            key_name: key_name.to_string(),
            start_value,
            loop_node,
            prelude: None,
            dispatch_slot: 0,
            key_declaration: NodeIndex::NONE,
            child_vars: IndexSet::new(),
            value_histogram: BTreeMap::new(),
            exit_values: BTreeSet::new(),
            opaque: None,
            visited: false,
        }
    }

    /// The dispatcher statement inside the loop body.
    pub fn dispatcher(&self, arena: &NodeArena) -> Option<NodeIndex> {
        let node = arena.get(self.loop_node)?;
        let body = arena.get_loop(node)?.statement;
        arena.get_statements(body)?.nodes.get(self.dispatch_slot).copied()
    }

    pub fn count(&self, value: i64) -> u32 {
        self.value_histogram.get(&value).copied().unwrap_or(0)
    }
}

#[derive(Default)]
pub struct DeobContext {
    pub dispatch_vars: IndexMap<String, DispatchVariable>,
    pub keys: IndexMap<String, KeyInfo>,
    /// Advisory records in emission order.
    pub diagnostics: Vec<Diagnostic>,
    reported: FxHashSet<(u32, u32)>,
}

impl DeobContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic anchored at `node` and log it.
    pub fn report(
        &mut self,
        arena: &NodeArena,
        message: &DiagnosticMessage,
        node: NodeIndex,
        args: &[&str],
    ) {
        let (start, length) = arena
            .get(node)
            .map(|n| (n.pos, n.end.saturating_sub(n.pos)))
            .unwrap_or((0, 0));
        let diagnostic = Diagnostic::from_message(message, start, length, args);
        match diagnostic.category {
            DiagnosticCategory::Error => {
                error!(code = diagnostic.code, start, "{}", diagnostic.message_text)
            }
            DiagnosticCategory::Warning => {
                warn!(code = diagnostic.code, start, "{}", diagnostic.message_text)
            }
            DiagnosticCategory::Suggestion | DiagnosticCategory::Message => {
                info!(code = diagnostic.code, start, "{}", diagnostic.message_text)
            }
        }
        self.diagnostics.push(diagnostic);
    }

    /// Like `report`, but only the first time for this message and node.
    /// Fixpoint rules revisit the same node on every walk.
    pub fn report_once(
        &mut self,
        arena: &NodeArena,
        message: &DiagnosticMessage,
        node: NodeIndex,
        args: &[&str],
    ) {
        if self.reported.insert((message.code, node.0)) {
            self.report(arena, message, node, args);
        }
    }

    pub fn is_dispatch_variable(&self, name: &str) -> bool {
        self.dispatch_vars.contains_key(name)
    }
}
