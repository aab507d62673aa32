//! Hoisting compound assignments out of element accesses.
//!
//! `obj[x += 2] = v;` reads better as `x += 2; obj[x] = v;`. The rewrite is
//! only done where the assignment runs unconditionally and first: not under
//! a function, a conditional or a short-circuit operator, and with nothing
//! evaluated before it that could observe or change `x`.

use crate::walk::pre_order;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use tracing::{debug, debug_span};

pub struct MemberAssignHoister<'a> {
    arena: &'a mut NodeArena,
    root: NodeIndex,
}

impl<'a> MemberAssignHoister<'a> {
    pub fn new(arena: &'a mut NodeArena, root: NodeIndex) -> Self {
        MemberAssignHoister { arena, root }
    }

    /// Returns the number of assignments hoisted.
    pub fn run(&mut self) -> usize {
        let _span = debug_span!("hoist_member_assign").entered();
        let accesses: Vec<NodeIndex> = pre_order(self.arena, self.root)
            .into_iter()
            .filter(|&idx| self.arena.is_kind(idx, syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION))
            .collect();
        let mut hoisted = 0;
        for access in accesses {
            if self.hoist(access) {
                hoisted += 1;
            }
        }
        debug!(hoisted, "member assignments hoisted");
        hoisted
    }

    fn hoist(&mut self, access: NodeIndex) -> bool {
        let arena = &*self.arena;
        let Some(argument) = arena
            .get(access)
            .and_then(|node| arena.get_access_expr(node))
            .map(|data| data.name_or_argument)
        else {
            return false;
        };
        let Some(binary) = arena.get(argument).and_then(|node| arena.get_binary_expr(node)) else {
            return false;
        };
        let operator = binary.operator_token;
        if operator.compound_assignment_operator().is_none() || is_logical_assignment(operator) {
            return false;
        }
        let Some(name) = arena.get_identifier_text(binary.left).map(str::to_string) else {
            return false;
        };
        let Some(statement) = enclosing_expression_statement(arena, access) else {
            return false;
        };
        if arena.statement_position(statement).is_none() {
            return false;
        }
        if !runs_first(arena, statement, access, &name) {
            return false;
        }

        let replacement = self.arena.create_identifier(&name);
        if !self.arena.replace_child(access, argument, replacement) {
            return false;
        }
        let assignment = self.arena.create_expression_statement(argument);
        self.arena.insert_statements_before(statement, vec![assignment]);
        debug!(name, "hoisted compound assignment out of element access");
        true
    }
}

/// Hoist every eligible `obj[x op= n]` under `root`.
pub fn hoist_member_assignments(arena: &mut NodeArena, root: NodeIndex) -> usize {
    MemberAssignHoister::new(arena, root).run()
}

fn is_logical_assignment(operator: SyntaxKind) -> bool {
    matches!(
        operator,
        SyntaxKind::AmpersandAmpersandEqualsToken
            | SyntaxKind::BarBarEqualsToken
            | SyntaxKind::QuestionQuestionEqualsToken
    )
}

/// The expression statement `node` is evaluated by unconditionally.
fn enclosing_expression_statement(arena: &NodeArena, node: NodeIndex) -> Option<NodeIndex> {
    let mut current = arena.get_parent(node);
    while current.is_some() {
        let parent = arena.get(current)?;
        match parent.kind {
            syntax_kind_ext::EXPRESSION_STATEMENT => return Some(current),
            syntax_kind_ext::CONDITIONAL_EXPRESSION
            | syntax_kind_ext::FUNCTION_EXPRESSION
            | syntax_kind_ext::FUNCTION_DECLARATION => return None,
            syntax_kind_ext::BINARY_EXPRESSION => {
                let binary = arena.get_binary_expr(parent)?;
                if matches!(
                    binary.operator_token,
                    SyntaxKind::AmpersandAmpersandToken | SyntaxKind::BarBarToken | SyntaxKind::QuestionQuestionToken
                ) || is_logical_assignment(binary.operator_token)
                {
                    return None;
                }
            }
            _ if arena.is_statement_list_container(current) => return None,
            _ => {}
        }
        current = arena.get_parent(current);
    }
    None
}

/// Nothing evaluated before the index of `access` inside `statement` has
/// side effects or reads `name`. That covers the access's own object.
fn runs_first(arena: &NodeArena, statement: NodeIndex, access: NodeIndex, name: &str) -> bool {
    for idx in pre_order(arena, statement) {
        if idx == access {
            let Some(object) = arena
                .get(access)
                .and_then(|node| arena.get_access_expr(node))
                .map(|data| data.expression)
            else {
                return false;
            };
            return !pre_order(arena, object)
                .into_iter()
                .any(|inner| observes(arena, inner, name));
        }
        if arena.is_ancestor_or_self(idx, access) {
            continue;
        }
        if observes(arena, idx, name) {
            return false;
        }
    }
    false
}

/// `idx` reads `name` or has a side effect of its own.
fn observes(arena: &NodeArena, idx: NodeIndex, name: &str) -> bool {
    if arena.is_identifier_named(idx, name) {
        return true;
    }
    let Some(node) = arena.get(idx) else {
        return false;
    };
    match node.kind {
        syntax_kind_ext::CALL_EXPRESSION | syntax_kind_ext::NEW_EXPRESSION => true,
        syntax_kind_ext::BINARY_EXPRESSION => arena
            .get_binary_expr(node)
            .is_some_and(|binary| binary.operator_token.is_assignment_operator()),
        syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => {
            arena.get_unary_expr(node).is_some_and(|unary| {
                matches!(
                    unary.operator,
                    SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken | SyntaxKind::DeleteKeyword
                )
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflat_emitter::{PrinterOptions, print};
    use deflat_parser::ParserState;

    fn hoist_source(source: &str) -> (String, usize) {
        let (mut arena, root, diagnostics) = ParserState::parse("test.js", source);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let count = hoist_member_assignments(&mut arena, root);
        (print(&arena, root, &PrinterOptions::default()), count)
    }

    #[test]
    fn assignment_target_access_is_hoisted() {
        let (out, count) = hoist_source("obj[x += 2] = 5;");
        assert_eq!(count, 1);
        assert_eq!(out, "x += 2;\nobj[x] = 5;\n");
    }

    #[test]
    fn plain_assignment_is_left_alone() {
        let (out, count) = hoist_source("obj[x = 2] = 5;");
        assert_eq!(count, 0);
        assert_eq!(out, "obj[x = 2] = 5;\n");
    }

    #[test]
    fn conditional_path_blocks_the_hoist() {
        let (out, count) = hoist_source("f(c ? obj[x += 1] : 0);");
        assert_eq!(count, 0);
        assert_eq!(out, "f(c ? obj[x += 1] : 0);\n");
    }

    #[test]
    fn plain_object_still_hoists() {
        let (out, count) = hoist_source("a.b[i += 1] = 1;");
        assert_eq!(count, 1);
        assert_eq!(out, "i += 1;\na.b[i] = 1;\n");
    }
}
