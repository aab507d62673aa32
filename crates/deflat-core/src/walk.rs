//! Tree walks and structural queries shared by the passes.
//!
//! Rewrite rules collect the nodes of one walk up front (pre-order for
//! "enter" rules, post-order for "exit" rules) and then visit them in that
//! order, skipping nodes an earlier rewrite has already detached.

use crate::eval::Value;
use deflat_binder::is_reference_position;
use deflat_common::limits::MAX_NORMALIZE_ITERATIONS;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use tracing::{trace, warn};

/// Every node under `root` (root included), parents before children.
pub fn pre_order(arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
    arena.descendants(root)
}

/// Every node under `root` (root included), children before parents.
pub fn post_order(arena: &NodeArena, root: NodeIndex) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut stack = vec![(root, false)];
    while let Some((node, expanded)) = stack.pop() {
        if node.is_none() {
            continue;
        }
        if expanded {
            out.push(node);
            continue;
        }
        stack.push((node, true));
        for child in arena.children(node).into_iter().rev() {
            stack.push((child, false));
        }
    }
    out
}

/// Whether `node` is still reachable from `root`.
///
/// Arena mutations clear the parent link of every child they remove, so
/// following parent links is enough.
pub fn is_attached(arena: &NodeArena, root: NodeIndex, node: NodeIndex) -> bool {
    let mut current = node;
    while current != root {
        current = arena.get_parent(current);
        if current.is_none() {
            return false;
        }
    }
    true
}

/// Run `rule` until it reports no change, at most
/// `MAX_NORMALIZE_ITERATIONS` times. Returns whether anything changed.
pub fn run_to_fixpoint(name: &str, mut rule: impl FnMut() -> bool) -> bool {
    let mut changed_any = false;
    for iteration in 0..MAX_NORMALIZE_ITERATIONS {
        if !rule() {
            trace!(rule = name, iteration, "fixpoint reached");
            return changed_any;
        }
        changed_any = true;
    }
    warn!(rule = name, "rule still changing after {MAX_NORMALIZE_ITERATIONS} walks");
    changed_any
}

pub fn is_terminator(arena: &NodeArena, statement: NodeIndex) -> bool {
    matches!(
        arena.kind(statement),
        Some(
            syntax_kind_ext::BREAK_STATEMENT
                | syntax_kind_ext::CONTINUE_STATEMENT
                | syntax_kind_ext::RETURN_STATEMENT
                | syntax_kind_ext::THROW_STATEMENT
        )
    )
}

pub fn is_return_or_throw(arena: &NodeArena, statement: NodeIndex) -> bool {
    matches!(
        arena.kind(statement),
        Some(syntax_kind_ext::RETURN_STATEMENT | syntax_kind_ext::THROW_STATEMENT)
    )
}

pub fn is_unlabeled_break(arena: &NodeArena, statement: NodeIndex) -> bool {
    is_unlabeled_jump(arena, statement, syntax_kind_ext::BREAK_STATEMENT)
}

pub fn is_unlabeled_continue(arena: &NodeArena, statement: NodeIndex) -> bool {
    is_unlabeled_jump(arena, statement, syntax_kind_ext::CONTINUE_STATEMENT)
}

fn is_unlabeled_jump(arena: &NodeArena, statement: NodeIndex, kind: u16) -> bool {
    arena
        .get(statement)
        .filter(|node| node.kind == kind)
        .and_then(|node| arena.get_jump_data(node))
        .is_some_and(|jump| jump.label.is_none())
}

/// Jumps under `roots` that would leave the enclosing loop or switch:
/// unlabeled `break` outside nested loops and switches, unlabeled
/// `continue` outside nested loops, and every labeled jump. Nested functions
/// are not searched.
pub fn find_escaping_jumps(
    arena: &NodeArena,
    roots: &[NodeIndex],
    include_continue: bool,
) -> Vec<NodeIndex> {
    let mut found = Vec::new();
    // (node, inside a nested loop, inside a nested switch)
    let mut stack: Vec<(NodeIndex, bool, bool)> = roots.iter().map(|&r| (r, false, false)).collect();
    while let Some((idx, in_loop, in_switch)) = stack.pop() {
        let Some(node) = arena.get(idx) else {
            continue;
        };
        match node.kind {
            syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => continue,
            syntax_kind_ext::BREAK_STATEMENT => {
                let labeled = !is_unlabeled_jump(arena, idx, syntax_kind_ext::BREAK_STATEMENT);
                if labeled || !(in_loop || in_switch) {
                    found.push(idx);
                }
                continue;
            }
            syntax_kind_ext::CONTINUE_STATEMENT => {
                let labeled = !is_unlabeled_jump(arena, idx, syntax_kind_ext::CONTINUE_STATEMENT);
                if include_continue && (labeled || !in_loop) {
                    found.push(idx);
                }
                continue;
            }
            _ => {}
        }
        let nested_loop = in_loop || arena.is_loop(idx);
        let nested_switch = in_switch || node.kind == syntax_kind_ext::SWITCH_STATEMENT;
        for child in arena.children(idx) {
            stack.push((child, nested_loop, nested_switch));
        }
    }
    found
}

/// Identifier nodes named `name` in reference position under `root`,
/// declaration names excluded.
pub fn name_references(arena: &NodeArena, root: NodeIndex, name: &str) -> Vec<NodeIndex> {
    arena
        .descendants(root)
        .into_iter()
        .filter(|&idx| {
            arena.is_identifier_named(idx, name)
                && is_reference_position(arena, idx)
                && !is_declaration_name(arena, idx)
        })
        .collect()
}

/// Declared names: variable declarators, function names and parameters,
/// catch variables.
pub fn is_declaration_name(arena: &NodeArena, idx: NodeIndex) -> bool {
    let parent = arena.get_parent(idx);
    let Some(parent_node) = arena.get(parent) else {
        return false;
    };
    match parent_node.kind {
        syntax_kind_ext::VARIABLE_DECLARATION => arena
            .get_variable_declaration(parent_node)
            .is_some_and(|decl| decl.name == idx),
        syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => arena
            .get_function(parent_node)
            .is_some_and(|func| func.name == idx || func.parameters.nodes.contains(&idx)),
        syntax_kind_ext::CATCH_CLAUSE => arena
            .get_catch_clause(parent_node)
            .is_some_and(|clause| clause.variable_declaration == idx),
        _ => false,
    }
}

/// Whether any identifier under `root` (references and declarations alike)
/// reads `name`.
pub fn mentions_name(arena: &NodeArena, root: NodeIndex, name: &str) -> bool {
    arena
        .descendants(root)
        .into_iter()
        .any(|idx| arena.is_identifier_named(idx, name) && is_reference_position(arena, idx))
}

/// `name = <value>` as an expression statement: the assignment's operands.
pub fn simple_assignment(arena: &NodeArena, statement: NodeIndex) -> Option<(NodeIndex, NodeIndex)> {
    let node = arena.get(statement)?;
    if node.kind != syntax_kind_ext::EXPRESSION_STATEMENT {
        return None;
    }
    let expr = arena.get_expression_statement(node)?.expression;
    let binary = arena.get_binary_expr(arena.get(expr)?)?;
    (binary.operator_token == SyntaxKind::EqualsToken).then_some((binary.left, binary.right))
}

/// The numeric value a `key = N;` statement assigns, for the given key.
pub fn key_assignment_value(arena: &NodeArena, statement: NodeIndex, key: &str) -> Option<i64> {
    let (left, right) = simple_assignment(arena, statement)?;
    if !arena.is_identifier_named(left, key) {
        return None;
    }
    Value::Number(arena.get_numeric_value(right)?).as_key().ok()
}

/// Whether a `key = undefined;` / `key = void 0;` statement leaves the loop.
pub fn is_key_exit_assignment(arena: &NodeArena, statement: NodeIndex, key: &str) -> bool {
    let Some((left, right)) = simple_assignment(arena, statement) else {
        return false;
    };
    arena.is_identifier_named(left, key) && is_undefined_value(arena, right)
}

/// `undefined` or `void <literal>`.
pub fn is_undefined_value(arena: &NodeArena, expr: NodeIndex) -> bool {
    if arena.is_identifier_named(expr, "undefined") {
        return true;
    }
    arena
        .get(expr)
        .filter(|node| node.kind == syntax_kind_ext::PREFIX_UNARY_EXPRESSION)
        .and_then(|node| arena.get_unary_expr(node))
        .is_some_and(|unary| {
            unary.operator == SyntaxKind::VoidKeyword && arena.get_numeric_value(unary.operand).is_some()
        })
}

/// Statements of a block, or the single statement itself.
pub fn block_statements(arena: &NodeArena, statement: NodeIndex) -> Vec<NodeIndex> {
    match arena.get_statements(statement) {
        Some(list) if arena.is_kind(statement, syntax_kind_ext::BLOCK) => list.nodes.clone(),
        _ if statement.is_some() => vec![statement],
        _ => Vec::new(),
    }
}

/// Human-readable node kind, for diagnostics.
pub fn kind_name(kind: u16) -> &'static str {
    match kind {
        syntax_kind_ext::SOURCE_FILE => "SourceFile",
        syntax_kind_ext::VARIABLE_STATEMENT => "VariableStatement",
        syntax_kind_ext::VARIABLE_DECLARATION_LIST => "VariableDeclarationList",
        syntax_kind_ext::VARIABLE_DECLARATION => "VariableDeclaration",
        syntax_kind_ext::FUNCTION_DECLARATION => "FunctionDeclaration",
        syntax_kind_ext::BLOCK => "Block",
        syntax_kind_ext::EMPTY_STATEMENT => "EmptyStatement",
        syntax_kind_ext::EXPRESSION_STATEMENT => "ExpressionStatement",
        syntax_kind_ext::IF_STATEMENT => "IfStatement",
        syntax_kind_ext::FOR_STATEMENT => "ForStatement",
        syntax_kind_ext::FOR_IN_STATEMENT => "ForInStatement",
        syntax_kind_ext::WHILE_STATEMENT => "WhileStatement",
        syntax_kind_ext::DO_STATEMENT => "DoStatement",
        syntax_kind_ext::SWITCH_STATEMENT => "SwitchStatement",
        syntax_kind_ext::CASE_CLAUSE => "CaseClause",
        syntax_kind_ext::DEFAULT_CLAUSE => "DefaultClause",
        syntax_kind_ext::BREAK_STATEMENT => "BreakStatement",
        syntax_kind_ext::CONTINUE_STATEMENT => "ContinueStatement",
        syntax_kind_ext::RETURN_STATEMENT => "ReturnStatement",
        syntax_kind_ext::THROW_STATEMENT => "ThrowStatement",
        syntax_kind_ext::TRY_STATEMENT => "TryStatement",
        syntax_kind_ext::CATCH_CLAUSE => "CatchClause",
        syntax_kind_ext::LABELED_STATEMENT => "LabeledStatement",
        syntax_kind_ext::DEBUGGER_STATEMENT => "DebuggerStatement",
        syntax_kind_ext::PREFIX_UNARY_EXPRESSION => "PrefixUnaryExpression",
        syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => "PostfixUnaryExpression",
        syntax_kind_ext::BINARY_EXPRESSION => "BinaryExpression",
        syntax_kind_ext::CONDITIONAL_EXPRESSION => "ConditionalExpression",
        syntax_kind_ext::SEQUENCE_EXPRESSION => "SequenceExpression",
        syntax_kind_ext::CALL_EXPRESSION => "CallExpression",
        syntax_kind_ext::NEW_EXPRESSION => "NewExpression",
        syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION => "PropertyAccessExpression",
        syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => "ElementAccessExpression",
        syntax_kind_ext::ARRAY_LITERAL_EXPRESSION => "ArrayLiteralExpression",
        syntax_kind_ext::OBJECT_LITERAL_EXPRESSION => "ObjectLiteralExpression",
        syntax_kind_ext::PROPERTY_ASSIGNMENT => "PropertyAssignment",
        syntax_kind_ext::FUNCTION_EXPRESSION => "FunctionExpression",
        syntax_kind_ext::OMITTED_EXPRESSION => "OmittedExpression",
        k if k == SyntaxKind::Identifier as u16 => "Identifier",
        k if k == SyntaxKind::NumericLiteral as u16 => "NumericLiteral",
        k if k == SyntaxKind::StringLiteral as u16 => "StringLiteral",
        _ => "Token",
    }
}
