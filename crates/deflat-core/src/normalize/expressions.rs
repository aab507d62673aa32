//! Expression-level rules: `void`, conditionals, `&&` statements and
//! literal-first comparisons.

use super::Normalizer;
use crate::walk::kind_name;
use deflat_common::diagnostics::diagnostic_messages;
use deflat_parser::NodeIndex;
use deflat_parser::parser::operator_precedence::mirrored_comparison;
use deflat_parser::parser::syntax_kind_ext;
use deflat_scanner::SyntaxKind;
use tracing::trace;

impl<'a> Normalizer<'a> {
    // =========================================================================
    // RemoveVoid
    // =========================================================================

    /// `void <number>` is `undefined`. `void e` whose value is discarded is
    /// just `e`; a used `void <literal>` is `undefined` as well.
    pub(super) fn remove_void(&mut self, idx: NodeIndex) -> bool {
        let Some(operand) = self.void_operand(idx) else {
            return false;
        };
        if self.arena.get_numeric_value(operand).is_some()
            || (self.is_literal(operand) && self.value_is_used(idx))
        {
            let undefined = self.arena.create_identifier("undefined");
            return self.arena.replace_node(idx, undefined);
        }
        if !self.value_is_used(idx) {
            trace!(node = idx.0, "dropping discarded void");
            return self.arena.replace_node(idx, operand);
        }
        false
    }

    fn void_operand(&self, idx: NodeIndex) -> Option<NodeIndex> {
        let node = self.arena.get(idx)?;
        if node.kind != syntax_kind_ext::PREFIX_UNARY_EXPRESSION {
            return None;
        }
        let unary = self.arena.get_unary_expr(node)?;
        (unary.operator == SyntaxKind::VoidKeyword).then_some(unary.operand)
    }

    fn is_literal(&self, idx: NodeIndex) -> bool {
        matches!(
            self.arena.kind(idx),
            Some(k) if k == SyntaxKind::NumericLiteral as u16
                || k == SyntaxKind::StringLiteral as u16
                || k == SyntaxKind::TrueKeyword as u16
                || k == SyntaxKind::FalseKeyword as u16
                || k == SyntaxKind::NullKeyword as u16
        )
    }

    /// Whether the value of expression `idx` is observed by its parent.
    fn value_is_used(&self, idx: NodeIndex) -> bool {
        let parent = self.arena.get_parent(idx);
        let Some(parent_node) = self.arena.get(parent) else {
            return true;
        };
        match parent_node.kind {
            syntax_kind_ext::EXPRESSION_STATEMENT => false,
            syntax_kind_ext::SEQUENCE_EXPRESSION => self
                .arena
                .get_literal_expr(parent_node)
                .is_none_or(|seq| seq.elements.last() == Some(idx)),
            syntax_kind_ext::FOR_STATEMENT => self
                .arena
                .get_loop(parent_node)
                .is_none_or(|data| data.incrementor != idx && data.initializer != idx),
            _ => true,
        }
    }

    // =========================================================================
    // ConditionalAssign
    // =========================================================================

    /// `l op= (t ? a : b)` becomes `t ? (l op= a) : (l op= b)`.
    pub(super) fn conditional_assign(&mut self, idx: NodeIndex) -> bool {
        let Some(node) = self.arena.get(idx) else {
            return false;
        };
        if node.kind != syntax_kind_ext::CONDITIONAL_EXPRESSION {
            return false;
        }
        let Some(cond) = self.arena.get_conditional_expr(node) else {
            return false;
        };
        let (condition, when_true, when_false) = (cond.condition, cond.when_true, cond.when_false);
        let assignment = self.arena.get_parent(idx);
        let Some(binary) = self
            .arena
            .get(assignment)
            .filter(|n| n.kind == syntax_kind_ext::BINARY_EXPRESSION)
            .and_then(|n| self.arena.get_binary_expr(n))
        else {
            return false;
        };
        let (target, operator) = (binary.left, binary.operator_token);
        if !operator.is_assignment_operator() || binary.right != idx {
            return false;
        }
        // The target is evaluated after the test once rewritten.
        if !self.is_simple_target(target) {
            return false;
        }
        let target_copy = self.arena.clone_subtree(target);
        let then_assign = self.arena.create_binary(target, operator, when_true);
        let else_assign = self.arena.create_binary(target_copy, operator, when_false);
        let replacement = self.arena.create_conditional(condition, then_assign, else_assign);
        self.arena.replace_node(assignment, replacement)
    }

    /// An identifier, or a property access chain rooted at one.
    fn is_simple_target(&self, idx: NodeIndex) -> bool {
        let mut current = idx;
        loop {
            let Some(node) = self.arena.get(current) else {
                return false;
            };
            if node.kind == SyntaxKind::Identifier as u16 || node.kind == SyntaxKind::ThisKeyword as u16 {
                return true;
            }
            if node.kind != syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION {
                return false;
            }
            match self.arena.get_access_expr(node) {
                Some(access) => current = access.expression,
                None => return false,
            }
        }
    }

    // =========================================================================
    // ConditionalIf
    // =========================================================================

    /// A conditional used as a statement becomes an `if`/`else`.
    pub(super) fn conditional_if(&mut self, idx: NodeIndex) -> bool {
        if !self.arena.is_kind(idx, syntax_kind_ext::CONDITIONAL_EXPRESSION) {
            return false;
        }
        let parent = self.arena.get_parent(idx);
        let Some(parent_kind) = self.arena.kind(parent) else {
            return false;
        };
        match parent_kind {
            syntax_kind_ext::EXPRESSION_STATEMENT => self.conditional_statement_to_if(idx, parent),
            syntax_kind_ext::SEQUENCE_EXPRESSION => self.split_sequence_statement(parent, idx),
            syntax_kind_ext::BINARY_EXPRESSION => self.logical_statement_to_if(parent, idx),
            _ => {
                self.report_unexpected_parent(parent, idx, "conditional expression");
                false
            }
        }
    }

    fn conditional_statement_to_if(&mut self, idx: NodeIndex, statement: NodeIndex) -> bool {
        let Some(cond) = self
            .arena
            .get(idx)
            .and_then(|node| self.arena.get_conditional_expr(node))
        else {
            return false;
        };
        let (condition, when_true, when_false) = (cond.condition, cond.when_true, cond.when_false);
        let then_statement = self.arena.create_expression_statement(when_true);
        let else_statement = self.arena.create_expression_statement(when_false);
        let replacement = self
            .arena
            .create_if_statement(condition, then_statement, else_statement);
        self.arena.replace_node(statement, replacement)
    }

    /// A sequence holding a conditional: split it into statements when it is
    /// a statement itself, or lower the `&&` it sits in.
    fn split_sequence_statement(&mut self, sequence: NodeIndex, conditional: NodeIndex) -> bool {
        let parent = self.arena.get_parent(sequence);
        match self.arena.kind(parent) {
            Some(syntax_kind_ext::BINARY_EXPRESSION) => self.logical_statement_to_if(parent, conditional),
            Some(syntax_kind_ext::EXPRESSION_STATEMENT) => self.sequence_statement_to_block(sequence, parent),
            _ => {
                self.report_unexpected_parent(parent, conditional, "sequence expression");
                false
            }
        }
    }

    /// `a, b, c;` becomes `{ a; b; c; }`.
    pub(super) fn sequence_statement_to_block(&mut self, sequence: NodeIndex, statement: NodeIndex) -> bool {
        let Some(elements) = self
            .arena
            .get(sequence)
            .and_then(|node| self.arena.get_literal_expr(node))
            .map(|seq| seq.elements.nodes.clone())
        else {
            return false;
        };
        let statements = elements
            .into_iter()
            .map(|element| self.arena.create_expression_statement(element))
            .collect();
        let block = self.arena.create_block(statements);
        self.arena.replace_node(statement, block)
    }

    /// `l && r;` (where `r` holds the conditional) becomes `if (l) r;`.
    fn logical_statement_to_if(&mut self, logical: NodeIndex, origin: NodeIndex) -> bool {
        let Some(binary) = self
            .arena
            .get(logical)
            .and_then(|node| self.arena.get_binary_expr(node))
        else {
            return false;
        };
        let (left, operator, right) = (binary.left, binary.operator_token, binary.right);
        if operator != SyntaxKind::AmpersandAmpersandToken {
            self.report_unexpected_parent(logical, origin, "conditional expression");
            return false;
        }
        let statement = self.arena.get_parent(logical);
        if !self.arena.is_kind(statement, syntax_kind_ext::EXPRESSION_STATEMENT) {
            self.report_unexpected_parent(statement, origin, "logical expression");
            return false;
        }
        let then_statement = self.arena.create_expression_statement(right);
        let replacement = self
            .arena
            .create_if_statement(left, then_statement, NodeIndex::NONE);
        self.arena.replace_node(statement, replacement)
    }

    fn report_unexpected_parent(&mut self, parent: NodeIndex, origin: NodeIndex, what: &str) {
        let parent_kind = self.arena.kind(parent).map_or("none", kind_name);
        self.ctx.report_once(
            self.arena,
            &diagnostic_messages::UNEXPECTED_PARENT_TYPE,
            origin,
            &[parent_kind, what],
        );
    }

    // =========================================================================
    // LogicalIf
    // =========================================================================

    /// Statement `l && r;` becomes `if (l) r;`.
    pub(super) fn logical_if(&mut self, idx: NodeIndex) -> bool {
        let Some(binary) = self
            .arena
            .get(idx)
            .filter(|node| node.kind == syntax_kind_ext::BINARY_EXPRESSION)
            .and_then(|node| self.arena.get_binary_expr(node))
        else {
            return false;
        };
        if binary.operator_token != SyntaxKind::AmpersandAmpersandToken {
            return false;
        }
        let (left, right) = (binary.left, binary.right);
        let statement = self.arena.get_parent(idx);
        if !self.arena.is_kind(statement, syntax_kind_ext::EXPRESSION_STATEMENT) {
            return false;
        }
        let then_statement = self.arena.create_expression_statement(right);
        let replacement = self
            .arena
            .create_if_statement(left, then_statement, NodeIndex::NONE);
        self.arena.replace_node(statement, replacement)
    }

    // =========================================================================
    // IfTestBinary
    // =========================================================================

    /// `if (3 == x)` becomes `if (x == 3)`; relational operators are mirrored.
    pub(super) fn if_test_binary(&mut self, idx: NodeIndex) -> bool {
        let Some(test) = self
            .arena
            .get(idx)
            .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
            .and_then(|node| self.arena.get_if_statement(node))
            .map(|stmt| stmt.expression)
        else {
            return false;
        };
        let Some(binary) = self
            .arena
            .get(test)
            .filter(|node| node.kind == syntax_kind_ext::BINARY_EXPRESSION)
            .and_then(|node| self.arena.get_binary_expr(node))
        else {
            return false;
        };
        let (left, operator, right) = (binary.left, binary.operator_token, binary.right);
        if self.arena.get_numeric_value(left).is_none()
            || !self.arena.is_kind(right, SyntaxKind::Identifier as u16)
        {
            return false;
        }
        let Some(mirrored) = mirrored_comparison(operator) else {
            return false;
        };
        self.arena.swap_binary_operands(test);
        self.arena.set_binary_operator(test, mirrored);
        true
    }
}
