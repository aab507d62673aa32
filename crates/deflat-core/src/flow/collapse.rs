//! Replacing a fully merged dispatch loop by its single remaining case.

use crate::context::KeyInfo;
use crate::eval::{Evaluator, Value};
use crate::walk::{
    find_escaping_jumps, is_key_exit_assignment, is_return_or_throw, is_unlabeled_break,
    key_assignment_value, name_references,
};
use deflat_binder::is_write_position;
use deflat_parser::parser::{NodeFlags, syntax_kind_ext};
use deflat_parser::{NodeArena, NodeIndex};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Collapse the loop of `key` when only its start case is left and that
/// case always leaves the loop. Returns whether the loop was replaced.
pub(super) fn collapse_loop(arena: &mut NodeArena, root: NodeIndex, key: &KeyInfo) -> bool {
    let Some(block) = start_case_block(arena, key) else {
        return false;
    };
    let mut body = arena
        .get_statements(block)
        .map(|list| list.nodes.clone())
        .unwrap_or_default();

    let mut tails = FxHashSet::default();
    if !exits_on_every_path(arena, &body, key, &mut tails) {
        trace!(key = %key.key_name, "start case can loop again");
        return false;
    }
    let escaping = find_escaping_jumps(arena, &body, true);
    if escaping.iter().any(|jump| !tails.contains(jump)) {
        trace!(key = %key.key_name, "start case jumps out of the dispatcher");
        return false;
    }
    let Some(data) = arena.get(key.loop_node).and_then(|node| arena.get_loop(node)) else {
        return false;
    };
    let (initializer, condition) = (data.initializer, data.condition);
    let mut evaluator = Evaluator::new(arena);
    evaluator.bind(&key.key_name, Value::Number(key.start_value as f64));
    if !evaluator.evaluate_condition(condition).unwrap_or(false) {
        return false;
    }
    if arena.statement_position(key.loop_node).is_none() {
        return false;
    }

    strip_exit_tails(arena, &mut body, key);

    let mut replacement = Vec::with_capacity(body.len() + 2);
    match arena.get(initializer).map(|node| (node.kind, node.flags)) {
        Some((syntax_kind_ext::VARIABLE_DECLARATION_LIST, flags)) => {
            let declarations = arena
                .get(initializer)
                .and_then(|node| arena.get_variable(node))
                .map(|list| list.declarations.nodes.clone())
                .unwrap_or_default();
            let flags = NodeFlags::from_bits_truncate(flags);
            replacement.push(arena.create_variable_statement(declarations, flags));
        }
        Some(_) => replacement.push(arena.create_expression_statement(initializer)),
        None => {}
    }
    replacement.extend(key.prelude);
    replacement.extend(body);
    if !arena.replace_statement_with(key.loop_node, replacement) {
        return false;
    }
    debug!(key = %key.key_name, "dispatch loop collapsed");

    remove_unused_prelude(arena, root, key);
    remove_unused_key(arena, root, key);
    true
}

/// The block of the only clause left in the re-emitted dispatcher, when that
/// clause is the start value's.
fn start_case_block(arena: &NodeArena, key: &KeyInfo) -> Option<NodeIndex> {
    let dispatcher = key.dispatcher(arena)?;
    let switch = arena.get(dispatcher).and_then(|node| arena.get_switch(node))?;
    let [clause] = switch.clauses.nodes.as_slice() else {
        return None;
    };
    let case = arena.get(*clause).and_then(|node| arena.get_case_clause(node))?;
    let label = arena.get_numeric_value(case.expression)?;
    if label != key.start_value as f64 {
        return None;
    }
    let block = case.statements.first()?;
    arena.is_kind(block, syntax_kind_ext::BLOCK).then_some(block)
}

fn is_exit_jump(arena: &NodeArena, assignment: NodeIndex, key: &KeyInfo) -> bool {
    is_key_exit_assignment(arena, assignment, &key.key_name)
        || key_assignment_value(arena, assignment, &key.key_name)
            .is_some_and(|value| key.exit_values.contains(&value))
}

/// Every path through `statements` ends in `return`/`throw` or in
/// `K = <exit>; break;`. The `break`s of those exits are collected.
fn exits_on_every_path(
    arena: &NodeArena,
    statements: &[NodeIndex],
    key: &KeyInfo,
    tails: &mut FxHashSet<NodeIndex>,
) -> bool {
    let Some(&last) = statements.last() else {
        return false;
    };
    if is_return_or_throw(arena, last) {
        return true;
    }
    let n = statements.len();
    if is_unlabeled_break(arena, last) {
        if n >= 2 && is_exit_jump(arena, statements[n - 2], key) {
            tails.insert(last);
            return true;
        }
        return false;
    }
    let Some(stmt) = arena
        .get(last)
        .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
        .and_then(|node| arena.get_if_statement(node))
    else {
        return false;
    };
    if stmt.else_statement.is_none() {
        return false;
    }
    let arm = |idx: NodeIndex| arena.get_statements(idx).map(|list| list.nodes.clone());
    match (arm(stmt.then_statement), arm(stmt.else_statement)) {
        (Some(then_list), Some(else_list)) => {
            exits_on_every_path(arena, &then_list, key, tails) && exits_on_every_path(arena, &else_list, key, tails)
        }
        _ => false,
    }
}

/// Drop the `K = <exit>; break;` pairs found by `exits_on_every_path`.
fn strip_exit_tails(arena: &mut NodeArena, statements: &mut Vec<NodeIndex>, key: &KeyInfo) {
    let Some(&last) = statements.last() else {
        return;
    };
    if is_unlabeled_break(arena, last) {
        statements.truncate(statements.len().saturating_sub(2));
        return;
    }
    let Some((then_block, else_block)) = arena
        .get(last)
        .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
        .and_then(|node| arena.get_if_statement(node))
        .map(|stmt| (stmt.then_statement, stmt.else_statement))
    else {
        return;
    };
    for arm in [then_block, else_block] {
        let Some(mut arm_statements) = arena.get_statements(arm).map(|list| list.nodes.clone()) else {
            continue;
        };
        strip_exit_tails(arena, &mut arm_statements, key);
        arena.set_statements(arm, arm_statements);
    }
}

fn declarators(arena: &NodeArena, statement: NodeIndex) -> Vec<NodeIndex> {
    arena
        .get(statement)
        .and_then(|node| arena.get_variable(node))
        .map(|list| list.declarations.nodes.clone())
        .unwrap_or_default()
}

fn declarator_name(arena: &NodeArena, decl: NodeIndex) -> Option<String> {
    let data = arena.get(decl).and_then(|node| arena.get_variable_declaration(node))?;
    arena.get_identifier_text(data.name).map(str::to_string)
}

/// Remove `decl` from its variable statement, and the statement once empty.
/// Returns whether the whole statement went away.
fn remove_declarator(arena: &mut NodeArena, decl: NodeIndex) -> bool {
    let statement = arena.get_parent(decl);
    let remaining: Vec<NodeIndex> = declarators(arena, statement)
        .into_iter()
        .filter(|&other| other != decl)
        .collect();
    if remaining.is_empty() && arena.is_kind(statement, syntax_kind_ext::VARIABLE_STATEMENT) {
        arena.replace_statement_with(statement, Vec::new());
        return true;
    }
    arena.set_declarations(statement, remaining);
    false
}

/// Prelude declarators nothing reads any more, until none is left to drop.
fn remove_unused_prelude(arena: &mut NodeArena, root: NodeIndex, key: &KeyInfo) {
    let Some(prelude) = key.prelude else {
        return;
    };
    loop {
        let unused = declarators(arena, prelude).into_iter().find(|&decl| {
            declarator_name(arena, decl).is_some_and(|name| name_references(arena, root, &name).is_empty())
        });
        let Some(decl) = unused else {
            return;
        };
        if remove_declarator(arena, decl) {
            return;
        }
    }
}

/// The key declarator and its dead `K = <literal>;` writes, when the key is
/// never read.
fn remove_unused_key(arena: &mut NodeArena, root: NodeIndex, key: &KeyInfo) {
    let name = key.key_name.as_str();
    let mut writes = Vec::new();
    for reference in name_references(arena, root, name) {
        if !is_write_position(arena, reference) {
            return;
        }
        let statement = arena.get_parent(arena.get_parent(reference));
        let literal = key_assignment_value(arena, statement, name).is_some()
            || is_key_exit_assignment(arena, statement, name);
        if !literal || arena.statement_position(statement).is_none() {
            return;
        }
        writes.push(statement);
    }
    for statement in writes {
        arena.replace_statement_with(statement, Vec::new());
    }
    if key.key_declaration.is_some() {
        remove_declarator(arena, key.key_declaration);
    }
}
