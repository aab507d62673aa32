//! Dispatch classification.
//!
//! Finds the loops that drive a flattened state machine and records them in
//! the `DeobContext`:
//!
//! - masked form: `for (var K = 0; ...) { var a = 7 & K, ...; <dispatcher> }`
//!   where `a` is a constant binding. `a` becomes a dispatch variable with
//!   domain `0..=7` and `K` the loop key.
//! - direct form: `for (...) { switch (K) { ... } }` with `K` initialized to
//!   a numeric literal by the loop header or by the statement just before
//!   the loop.

use crate::context::{DeobContext, DispatchVariable, KeyInfo};
use crate::eval::Value;
use crate::walk::pre_order;
use deflat_binder::{BinderState, is_reference_position};
use deflat_common::diagnostics::diagnostic_messages;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use tracing::{debug, debug_span, info};

pub struct DispatchClassifier<'a> {
    arena: &'a NodeArena,
    root: NodeIndex,
    binder: BinderState,
}

impl<'a> DispatchClassifier<'a> {
    pub fn new(arena: &'a NodeArena, root: NodeIndex) -> Self {
        DispatchClassifier {
            arena,
            root,
            binder: BinderState::bind(arena, root),
        }
    }

    pub fn run(&self, ctx: &mut DeobContext) {
        let _span = debug_span!("classify").entered();
        for idx in pre_order(self.arena, self.root) {
            match self.arena.kind(idx) {
                Some(syntax_kind_ext::VARIABLE_DECLARATION) => self.classify_masked(idx, ctx),
                Some(syntax_kind_ext::FOR_STATEMENT) => self.classify_direct(idx, ctx),
                _ => {}
            }
        }
        for var in ctx.dispatch_vars.values() {
            info!(
                name = %var.name,
                domain = var.domain_size,
                key = %var.root_key,
                parent = var.parent.as_deref().unwrap_or("-"),
                "dispatch variable"
            );
        }
        for key in ctx.keys.values() {
            info!(
                key = %key.key_name,
                start = key.start_value,
                children = key.child_vars.len(),
                "dispatch key"
            );
        }
    }

    // =========================================================================
    // Masked form
    // =========================================================================

    fn classify_masked(&self, decl: NodeIndex, ctx: &mut DeobContext) {
        let arena = self.arena;
        let Some(data) = arena.get(decl).and_then(|node| arena.get_variable_declaration(node)) else {
            return;
        };
        let Some(name) = arena.get_identifier_text(data.name) else {
            return;
        };
        let Some((mask, operand)) = self.mask_of(data.initializer) else {
            return;
        };
        if ctx.dispatch_vars.contains_key(name) {
            return;
        }
        if !self.binder.is_constant(data.name) {
            debug!(name, "masked declarator is reassigned; not a dispatch variable");
            return;
        }
        let statement = arena.get_parent(decl);
        if !arena.is_kind(statement, syntax_kind_ext::VARIABLE_STATEMENT) {
            return;
        }
        let Some(loop_node) = enclosing_for(arena, statement) else {
            return;
        };
        let Some((key_name, start, key_declaration)) = self.key_in_initializer(loop_node) else {
            debug!(name, "enclosing loop declares no numeric key");
            return;
        };

        let body_len = loop_body(arena, loop_node).len();
        if body_len != 2 {
            ctx.report_once(
                arena,
                &diagnostic_messages::UNEXPECTED_LOOP_BODY,
                loop_node,
                &[&key_name, &body_len.to_string()],
            );
        }

        let parent = first_reference(arena, operand);
        let domain_size = mask + 1;
        let range = format!("0..{domain_size}");
        ctx.report(
            arena,
            &diagnostic_messages::DISPATCH_VARIABLE,
            decl,
            &[name, &range, &key_name, parent.as_deref().unwrap_or("-")],
        );
        ctx.dispatch_vars.insert(
            name.to_string(),
            DispatchVariable {
                name: name.to_string(),
                domain_size,
                root_key: key_name.clone(),
                parent,
                declaration: decl,
            },
        );

        if !ctx.keys.contains_key(&key_name) {
            let mut key = KeyInfo::new(&key_name, start, loop_node);
            key.prelude = Some(statement);
            key.dispatch_slot = 1;
            key.key_declaration = key_declaration;
            ctx.report(
                arena,
                &diagnostic_messages::DISPATCH_KEY,
                key_declaration,
                &[&key_name, &start.to_string()],
            );
            ctx.keys.insert(key_name.clone(), key);
        }
        if let Some(key) = ctx.keys.get_mut(&key_name) {
            key.child_vars.insert(name.to_string());
        }
    }

    /// `<integer literal> & <expr>`: the mask and the masked operand.
    fn mask_of(&self, initializer: NodeIndex) -> Option<(i64, NodeIndex)> {
        let arena = self.arena;
        let binary = arena.get(initializer).and_then(|node| arena.get_binary_expr(node))?;
        if binary.operator_token != SyntaxKind::AmpersandToken {
            return None;
        }
        let mask = arena.get_numeric_value(binary.left)?;
        if mask.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&mask) {
            return None;
        }
        Some((mask as i64, binary.right))
    }

    /// The first declarator of a `for (var K = <number>; ...)` header.
    fn key_in_initializer(&self, loop_node: NodeIndex) -> Option<(String, i64, NodeIndex)> {
        let arena = self.arena;
        let init = arena.get(loop_node).and_then(|node| arena.get_loop(node))?.initializer;
        let list = arena
            .get(init)
            .filter(|node| node.kind == syntax_kind_ext::VARIABLE_DECLARATION_LIST)
            .and_then(|node| arena.get_variable(node))?;
        let decl = list.declarations.first()?;
        let (name, start) = numeric_declarator(arena, decl)?;
        Some((name, start, decl))
    }

    // =========================================================================
    // Direct form
    // =========================================================================

    fn classify_direct(&self, loop_node: NodeIndex, ctx: &mut DeobContext) {
        let arena = self.arena;
        let body = loop_body(arena, loop_node);
        let [dispatcher] = body.as_slice() else {
            return;
        };
        let Some(discriminant) = arena
            .get(*dispatcher)
            .filter(|node| node.kind == syntax_kind_ext::SWITCH_STATEMENT)
            .and_then(|node| arena.get_switch(node))
            .map(|switch| switch.expression)
        else {
            return;
        };
        let Some(key_name) = arena.get_identifier_text(discriminant) else {
            return;
        };
        if ctx.keys.contains_key(key_name) {
            return;
        }
        let Some((start, key_declaration)) = self.direct_key_declaration(loop_node, key_name) else {
            return;
        };
        let declared = arena
            .get(key_declaration)
            .and_then(|node| arena.get_variable_declaration(node))
            .map(|data| data.name);
        let same_binding = match (declared, self.binder.resolve_identifier(discriminant)) {
            (Some(name), Some(symbol)) => self.binder.resolve_identifier(name) == Some(symbol),
            _ => false,
        };
        if !same_binding {
            debug!(key = key_name, "switch discriminant does not resolve to the loop key");
            return;
        }

        ctx.report(
            arena,
            &diagnostic_messages::DISPATCH_KEY,
            key_declaration,
            &[key_name, &start.to_string()],
        );
        let mut key = KeyInfo::new(key_name, start, loop_node);
        key.key_declaration = key_declaration;
        ctx.keys.insert(key_name.to_string(), key);
    }

    /// Where `K` gets its start value: a declarator of the loop header, or
    /// `var K = <number>;` right before a loop without a header initializer.
    fn direct_key_declaration(&self, loop_node: NodeIndex, key_name: &str) -> Option<(i64, NodeIndex)> {
        let arena = self.arena;
        let init = arena.get(loop_node).and_then(|node| arena.get_loop(node))?.initializer;
        if init.is_some() {
            let list = arena
                .get(init)
                .filter(|node| node.kind == syntax_kind_ext::VARIABLE_DECLARATION_LIST)
                .and_then(|node| arena.get_variable(node))?;
            return list.declarations.iter().find_map(|&decl| {
                numeric_declarator(arena, decl)
                    .filter(|(name, _)| name == key_name)
                    .map(|(_, start)| (start, decl))
            });
        }

        let (container, index) = arena.statement_position(loop_node)?;
        let previous = *arena.get_statements(container)?.nodes.get(index.checked_sub(1)?)?;
        let list = arena
            .get(previous)
            .filter(|node| node.kind == syntax_kind_ext::VARIABLE_STATEMENT)
            .and_then(|node| arena.get_variable(node))?;
        let [decl] = list.declarations.nodes.as_slice() else {
            return None;
        };
        let (name, start) = numeric_declarator(arena, *decl)?;
        (name == key_name).then_some((start, *decl))
    }
}

/// Classify the tree under `root` into `ctx`.
pub fn classify(arena: &NodeArena, root: NodeIndex, ctx: &mut DeobContext) {
    DispatchClassifier::new(arena, root).run(ctx);
}

/// Nearest `for` statement above `node` inside the same function.
fn enclosing_for(arena: &NodeArena, node: NodeIndex) -> Option<NodeIndex> {
    let mut current = arena.get_parent(node);
    while current.is_some() {
        if arena.is_function_like(current) {
            return None;
        }
        if arena.is_kind(current, syntax_kind_ext::FOR_STATEMENT) {
            return Some(current);
        }
        current = arena.get_parent(current);
    }
    None
}

/// Statements of a loop's body block.
pub(crate) fn loop_body(arena: &NodeArena, loop_node: NodeIndex) -> Vec<NodeIndex> {
    arena
        .get(loop_node)
        .and_then(|node| arena.get_loop(node))
        .and_then(|data| arena.get_statements(data.statement))
        .map(|list| list.nodes.clone())
        .unwrap_or_default()
}

/// `name = <integer literal>` declarator.
fn numeric_declarator(arena: &NodeArena, decl: NodeIndex) -> Option<(String, i64)> {
    let data = arena.get(decl).and_then(|node| arena.get_variable_declaration(node))?;
    let name = arena.get_identifier_text(data.name)?;
    let value = Value::Number(arena.get_numeric_value(data.initializer)?).as_key().ok()?;
    Some((name.to_string(), value))
}

/// Leftmost identifier referenced under `root`.
fn first_reference(arena: &NodeArena, root: NodeIndex) -> Option<String> {
    pre_order(arena, root)
        .into_iter()
        .find(|&idx| {
            arena.is_kind(idx, SyntaxKind::Identifier as u16) && is_reference_position(arena, idx)
        })
        .and_then(|idx| arena.get_identifier_text(idx))
        .map(str::to_string)
}
