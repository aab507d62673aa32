//! Key value tracking.
//!
//! For each dispatch key, counts how many places produce each literal key
//! value (`K = 5;` anywhere in the dispatcher, plus the start value) and
//! works out which values leave the loop. A key whose value can change in
//! any other way is marked opaque and left alone by the merger.

use crate::classify::loop_body;
use crate::context::{DeobContext, KeyInfo};
use crate::eval::{Evaluator, Value};
use crate::walk::{is_attached, is_key_exit_assignment, key_assignment_value, name_references, pre_order};
use deflat_binder::is_write_position;
use deflat_common::diagnostics::diagnostic_messages;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, debug_span};

/// Result of scanning one key.
struct Tracked {
    histogram: BTreeMap<i64, u32>,
    exit_values: BTreeSet<i64>,
}

pub struct KeyValueTracker<'a> {
    arena: &'a NodeArena,
    root: NodeIndex,
}

impl<'a> KeyValueTracker<'a> {
    pub fn new(arena: &'a NodeArena, root: NodeIndex) -> Self {
        KeyValueTracker { arena, root }
    }

    pub fn run(&self, ctx: &mut DeobContext) {
        let _span = debug_span!("track").entered();
        let names: Vec<String> = ctx.keys.keys().cloned().collect();
        for name in names {
            let Some(key) = ctx.keys.get(&name) else {
                continue;
            };
            if key.visited || key.opaque.is_some() {
                continue;
            }
            let loop_node = key.loop_node;
            let outcome = self.track(key);
            let Some(key) = ctx.keys.get_mut(&name) else {
                continue;
            };
            match outcome {
                Ok(tracked) => {
                    key.value_histogram = tracked.histogram;
                    key.exit_values = tracked.exit_values;
                    let states = key.value_histogram.len().to_string();
                    debug!(key = %name, histogram = ?key.value_histogram, exits = ?key.exit_values, "tracked");
                    ctx.report(self.arena, &diagnostic_messages::KEY_SIZE, loop_node, &[&name, &states]);
                }
                Err(reason) => {
                    key.opaque = Some(reason.clone());
                    ctx.report(self.arena, &diagnostic_messages::OPAQUE_KEY, loop_node, &[&name, &reason]);
                }
            }
        }
    }

    fn track(&self, key: &KeyInfo) -> Result<Tracked, String> {
        let arena = self.arena;
        let name = key.key_name.as_str();
        if !is_attached(arena, self.root, key.loop_node) {
            return Err("loop is no longer in the tree".to_string());
        }
        let data = arena
            .get(key.loop_node)
            .and_then(|node| arena.get_loop(node))
            .ok_or("not a loop")?;
        if data.incrementor.is_some() {
            return Err("loop has an update clause".to_string());
        }

        let body = loop_body(arena, key.loop_node);
        let expected = match key.prelude {
            Some(prelude) => body.len() == 2 && body[0] == prelude,
            None => body.len() == 1,
        };
        if !expected {
            return Err(format!("loop body has {} statements", body.len()));
        }
        let dispatcher = body[key.dispatch_slot];
        if !arena.is_kind(dispatcher, syntax_kind_ext::SWITCH_STATEMENT) {
            return Err("dispatcher is not a switch".to_string());
        }

        let mut prelude_names = Vec::new();
        if let Some(prelude) = key.prelude {
            prelude_names = declared_names(arena, prelude);
            if !self.is_pure_prelude(prelude) {
                return Err("prelude has side effects".to_string());
            }
        }

        let mut histogram = BTreeMap::from([(key.start_value, 1)]);
        let home = arena.enclosing_function(key.loop_node);
        for reference in name_references(arena, self.root, name) {
            if arena.is_ancestor_or_self(data.condition, reference)
                || key.prelude.is_some_and(|prelude| arena.is_ancestor_or_self(prelude, reference))
            {
                continue;
            }
            if !arena.is_ancestor_or_self(dispatcher, reference) {
                return Err("key is used outside its loop".to_string());
            }
            if !is_write_position(arena, reference) {
                if is_discriminant(arena, reference) {
                    continue;
                }
                return Err("key is read inside the dispatcher".to_string());
            }
            if arena.enclosing_function(reference) != home {
                return Err("key is written inside a nested function".to_string());
            }
            let statement = assignment_statement(arena, reference);
            if let Some(value) = key_assignment_value(arena, statement, name) {
                *histogram.entry(value).or_insert(0) += 1;
            } else if !is_key_exit_assignment(arena, statement, name) {
                return Err("key is written with a non-literal value".to_string());
            }
        }

        for prelude_name in &prelude_names {
            for reference in name_references(arena, self.root, prelude_name) {
                let in_prelude = key.prelude.is_some_and(|prelude| arena.is_ancestor_or_self(prelude, reference));
                if in_prelude {
                    continue;
                }
                if !arena.is_ancestor_or_self(dispatcher, reference) || !is_discriminant(arena, reference) {
                    return Err(format!("'{prelude_name}' is used outside a dispatch test"));
                }
            }
        }

        let mut exit_values = BTreeSet::new();
        let mut evaluator = Evaluator::new(arena);
        for &value in histogram.keys() {
            evaluator.bind(name, Value::Number(value as f64));
            let holds = evaluator
                .evaluate_condition(data.condition)
                .map_err(|err| format!("loop test cannot be decided: {err}"))?;
            if !holds {
                exit_values.insert(value);
            }
        }
        if exit_values.contains(&key.start_value) {
            return Err("loop test fails for the start value".to_string());
        }

        Ok(Tracked {
            histogram,
            exit_values,
        })
    }

    /// Every declarator initializer is plain arithmetic over names and
    /// literals.
    fn is_pure_prelude(&self, prelude: NodeIndex) -> bool {
        let arena = self.arena;
        pre_order(arena, prelude).into_iter().all(|idx| {
            let Some(node) = arena.get(idx) else {
                return true;
            };
            match node.kind {
                syntax_kind_ext::VARIABLE_STATEMENT
                | syntax_kind_ext::VARIABLE_DECLARATION_LIST
                | syntax_kind_ext::VARIABLE_DECLARATION
                | syntax_kind_ext::CONDITIONAL_EXPRESSION => true,
                syntax_kind_ext::BINARY_EXPRESSION => arena
                    .get_binary_expr(node)
                    .is_some_and(|binary| !binary.operator_token.is_assignment_operator()),
                syntax_kind_ext::PREFIX_UNARY_EXPRESSION => arena.get_unary_expr(node).is_some_and(|unary| {
                    !matches!(
                        unary.operator,
                        SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken | SyntaxKind::DeleteKeyword
                    )
                }),
                kind => {
                    kind == SyntaxKind::Identifier as u16
                        || kind == SyntaxKind::NumericLiteral as u16
                        || kind == SyntaxKind::StringLiteral as u16
                        || kind == SyntaxKind::TrueKeyword as u16
                        || kind == SyntaxKind::FalseKeyword as u16
                        || kind == SyntaxKind::NullKeyword as u16
                }
            }
        })
    }
}

/// Rebuild the histogram and exit values of every key in `ctx`.
pub fn track_keys(arena: &NodeArena, root: NodeIndex, ctx: &mut DeobContext) {
    KeyValueTracker::new(arena, root).run(ctx);
}

/// Names declared by a variable statement.
fn declared_names(arena: &NodeArena, statement: NodeIndex) -> Vec<String> {
    let Some(list) = arena.get(statement).and_then(|node| arena.get_variable(node)) else {
        return Vec::new();
    };
    list.declarations
        .iter()
        .filter_map(|&decl| {
            let data = arena.get(decl).and_then(|node| arena.get_variable_declaration(node))?;
            arena.get_identifier_text(data.name).map(str::to_string)
        })
        .collect()
}

/// The identifier is the discriminant of a `switch`.
fn is_discriminant(arena: &NodeArena, reference: NodeIndex) -> bool {
    let parent = arena.get_parent(reference);
    arena
        .get(parent)
        .filter(|node| node.kind == syntax_kind_ext::SWITCH_STATEMENT)
        .and_then(|node| arena.get_switch(node))
        .is_some_and(|switch| switch.expression == reference)
}

/// The expression statement around the assignment writing `target`, or NONE.
fn assignment_statement(arena: &NodeArena, target: NodeIndex) -> NodeIndex {
    let assignment = arena.get_parent(target);
    let statement = arena.get_parent(assignment);
    if arena.is_kind(statement, syntax_kind_ext::EXPRESSION_STATEMENT) {
        statement
    } else {
        NodeIndex::NONE
    }
}
