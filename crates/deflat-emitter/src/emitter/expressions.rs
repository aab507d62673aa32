use super::{Printer, get_operator_text};
use deflat_parser::NodeIndex;
use deflat_parser::parser::node::Node;
use deflat_parser::parser::operator_precedence::{self as precedence, binary_expression_precedence};
use deflat_parser::parser::{NodeFlags, syntax_kind_ext};
use deflat_scanner::{SyntaxKind, token_to_string};

impl<'a> Printer<'a> {
    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Emit an expression in a context that accepts any expression.
    pub(super) fn emit_expression(&mut self, idx: NodeIndex) {
        self.emit_expression_with_precedence(idx, precedence::COMMA);
    }

    /// Variable initializers, arguments, elements: a bare comma would split them.
    pub(super) fn emit_initializer(&mut self, idx: NodeIndex) {
        self.emit_expression_with_precedence(idx, precedence::ASSIGNMENT);
    }

    /// Emit `idx`, parenthesized when it binds looser than `min_precedence`.
    pub(super) fn emit_expression_with_precedence(&mut self, idx: NodeIndex, min_precedence: u8) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        let needs_parens = self.expression_precedence(node) < min_precedence;
        if needs_parens {
            self.write("(");
        }
        self.emit_expression_node(idx, node);
        if needs_parens {
            self.write(")");
        }
    }

    fn expression_precedence(&self, node: &Node) -> u8 {
        match node.kind {
            syntax_kind_ext::SEQUENCE_EXPRESSION => precedence::COMMA,
            syntax_kind_ext::BINARY_EXPRESSION => self
                .arena
                .get_binary_expr(node)
                .map_or(precedence::PRIMARY, |b| binary_expression_precedence(b.operator_token)),
            syntax_kind_ext::CONDITIONAL_EXPRESSION => precedence::CONDITIONAL,
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION => precedence::UNARY,
            syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => precedence::POSTFIX,
            syntax_kind_ext::CALL_EXPRESSION
            | syntax_kind_ext::NEW_EXPRESSION
            | syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
            | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => precedence::MEMBER,
            // A synthesized negative number prints with its sign.
            k if k == SyntaxKind::NumericLiteral as u16
                && self
                    .arena
                    .get_literal(node)
                    .is_some_and(|lit| lit.value.is_some_and(|v| v.is_sign_negative() && v != 0.0)) =>
            {
                precedence::UNARY
            }
            _ => precedence::PRIMARY,
        }
    }

    fn emit_expression_node(&mut self, idx: NodeIndex, node: &Node) {
        match node.kind {
            k if k == SyntaxKind::Identifier as u16 => self.write_identifier_text(idx),
            k if k == SyntaxKind::NumericLiteral as u16 => self.emit_numeric_literal(node),
            k if k == SyntaxKind::StringLiteral as u16 => self.emit_string_literal(node),
            k if k == SyntaxKind::RegularExpressionLiteral as u16 => self.emit_regex_literal(node),
            k if k == SyntaxKind::ThisKeyword as u16 => self.write(token_to_string(SyntaxKind::ThisKeyword)),
            k if k == SyntaxKind::TrueKeyword as u16 => self.write(token_to_string(SyntaxKind::TrueKeyword)),
            k if k == SyntaxKind::FalseKeyword as u16 => self.write(token_to_string(SyntaxKind::FalseKeyword)),
            k if k == SyntaxKind::NullKeyword as u16 => self.write(token_to_string(SyntaxKind::NullKeyword)),
            syntax_kind_ext::SEQUENCE_EXPRESSION => self.emit_sequence(node),
            syntax_kind_ext::BINARY_EXPRESSION => self.emit_binary_expression(node),
            syntax_kind_ext::CONDITIONAL_EXPRESSION => self.emit_conditional(node),
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION => self.emit_prefix_unary(node),
            syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => self.emit_postfix_unary(node),
            syntax_kind_ext::CALL_EXPRESSION => self.emit_call_expression(node),
            syntax_kind_ext::NEW_EXPRESSION => self.emit_new_expression(node),
            syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION => self.emit_property_access(node),
            syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => self.emit_element_access(node),
            syntax_kind_ext::ARRAY_LITERAL_EXPRESSION => self.emit_array_literal(node),
            syntax_kind_ext::OBJECT_LITERAL_EXPRESSION => self.emit_object_literal(node),
            syntax_kind_ext::PROPERTY_ASSIGNMENT => self.emit_property_assignment(node),
            syntax_kind_ext::FUNCTION_EXPRESSION => self.emit_function(node),
            syntax_kind_ext::OMITTED_EXPRESSION => {}
            _ => {}
        }
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn emit_sequence(&mut self, node: &Node) {
        let Some(seq) = self.arena.get_literal_expr(node) else {
            return;
        };
        self.emit_comma_list(&seq.elements, Self::emit_initializer);
    }

    pub(super) fn emit_binary_expression(&mut self, node: &Node) {
        let Some(binary) = self.arena.get_binary_expr(node) else {
            return;
        };
        let operator = binary.operator_token;
        let prec = binary_expression_precedence(operator);

        let (left_min, right_min) = if operator.is_assignment_operator() {
            (precedence::MEMBER, precedence::ASSIGNMENT)
        } else if operator == SyntaxKind::AsteriskAsteriskToken {
            // `-a ** b` is a syntax error; the left operand must be postfix or tighter.
            (precedence::POSTFIX, prec)
        } else if precedence::is_right_associative(operator) {
            (prec + 1, prec)
        } else {
            (prec, prec + 1)
        };

        self.emit_binary_operand(binary.left, operator, left_min);
        self.write_space();
        self.write(get_operator_text(operator));
        self.write_space();
        self.emit_binary_operand(binary.right, operator, right_min);
    }

    /// `??` cannot be mixed with `&&`/`||` without parentheses.
    fn emit_binary_operand(&mut self, operand: NodeIndex, parent_operator: SyntaxKind, min: u8) {
        let min = if parent_operator == SyntaxKind::QuestionQuestionToken
            && let Some(child) = self.arena.get(operand)
            && let Some(child_binary) = self.arena.get_binary_expr(child)
            && matches!(
                child_binary.operator_token,
                SyntaxKind::AmpersandAmpersandToken | SyntaxKind::BarBarToken
            ) {
            precedence::PRIMARY
        } else {
            min
        };
        self.emit_expression_with_precedence(operand, min);
    }

    pub(super) fn emit_conditional(&mut self, node: &Node) {
        let Some(cond) = self.arena.get_conditional_expr(node) else {
            return;
        };
        self.emit_expression_with_precedence(cond.condition, precedence::COALESCE);
        self.write(" ? ");
        self.emit_expression_with_precedence(cond.when_true, precedence::ASSIGNMENT);
        self.write(" : ");
        self.emit_expression_with_precedence(cond.when_false, precedence::ASSIGNMENT);
    }

    pub(super) fn emit_prefix_unary(&mut self, node: &Node) {
        let Some(unary) = self.arena.get_unary_expr(node) else {
            return;
        };
        self.write(get_operator_text(unary.operator));
        if unary.operator.is_keyword() || self.operand_starts_with_sign(unary.operator, unary.operand) {
            self.write_space();
        }
        self.emit_expression_with_precedence(unary.operand, precedence::UNARY);
    }

    /// `- -a`, `+ +a`, `- --a`: adjacent signs would merge into another token.
    fn operand_starts_with_sign(&self, operator: SyntaxKind, operand: NodeIndex) -> bool {
        let Some(node) = self.arena.get(operand) else {
            return false;
        };
        let (same, same_update) = match operator {
            SyntaxKind::MinusToken => (SyntaxKind::MinusToken, SyntaxKind::MinusMinusToken),
            SyntaxKind::PlusToken => (SyntaxKind::PlusToken, SyntaxKind::PlusPlusToken),
            _ => return false,
        };
        if node.kind == syntax_kind_ext::PREFIX_UNARY_EXPRESSION {
            return self
                .arena
                .get_unary_expr(node)
                .is_some_and(|u| u.operator == same || u.operator == same_update);
        }
        operator == SyntaxKind::MinusToken
            && node.kind == SyntaxKind::NumericLiteral as u16
            && self.expression_precedence(node) == precedence::UNARY
    }

    pub(super) fn emit_postfix_unary(&mut self, node: &Node) {
        let Some(unary) = self.arena.get_unary_expr(node) else {
            return;
        };
        self.emit_expression_with_precedence(unary.operand, precedence::MEMBER);
        self.write(get_operator_text(unary.operator));
    }

    // =========================================================================
    // Calls and Member Access
    // =========================================================================

    pub(super) fn emit_call_expression(&mut self, node: &Node) {
        let Some(call) = self.arena.get_call_expr(node) else {
            return;
        };
        self.emit_expression_with_precedence(call.expression, precedence::MEMBER);
        self.write("(");
        self.emit_comma_list(&call.arguments, Self::emit_initializer);
        self.write(")");
    }

    pub(super) fn emit_new_expression(&mut self, node: &Node) {
        let Some(call) = self.arena.get_call_expr(node) else {
            return;
        };
        self.write("new ");
        // `new a().b()` would call the result of `new a()`.
        if self.member_chain_contains_call(call.expression) {
            self.write("(");
            self.emit_expression(call.expression);
            self.write(")");
        } else {
            self.emit_expression_with_precedence(call.expression, precedence::MEMBER);
        }
        self.write("(");
        self.emit_comma_list(&call.arguments, Self::emit_initializer);
        self.write(")");
    }

    fn member_chain_contains_call(&self, mut idx: NodeIndex) -> bool {
        while let Some(node) = self.arena.get(idx) {
            match node.kind {
                syntax_kind_ext::CALL_EXPRESSION => return true,
                syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
                | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => {
                    let Some(access) = self.arena.get_access_expr(node) else {
                        return false;
                    };
                    idx = access.expression;
                }
                _ => return false,
            }
        }
        false
    }

    pub(super) fn emit_property_access(&mut self, node: &Node) {
        let Some(access) = self.arena.get_access_expr(node) else {
            return;
        };
        if self.is_integer_literal_text(access.expression) {
            // `1.toString()` would scan as a malformed number.
            self.write("(");
            self.emit_expression(access.expression);
            self.write(")");
        } else {
            self.emit_expression_with_precedence(access.expression, precedence::MEMBER);
        }
        self.write(".");
        self.write_identifier_text(access.name_or_argument);
    }

    fn is_integer_literal_text(&self, idx: NodeIndex) -> bool {
        let Some(node) = self.arena.get(idx) else {
            return false;
        };
        if node.kind != SyntaxKind::NumericLiteral as u16 {
            return false;
        }
        self.arena
            .get_literal(node)
            .is_some_and(|lit| lit.text.is_empty() || lit.text.bytes().all(|b| b.is_ascii_digit()))
    }

    pub(super) fn emit_element_access(&mut self, node: &Node) {
        let Some(access) = self.arena.get_access_expr(node) else {
            return;
        };
        self.emit_expression_with_precedence(access.expression, precedence::MEMBER);
        self.write("[");
        self.emit_expression(access.name_or_argument);
        self.write("]");
    }

    // =========================================================================
    // Literals with Children
    // =========================================================================

    pub(super) fn emit_array_literal(&mut self, node: &Node) {
        let Some(array) = self.arena.get_literal_expr(node) else {
            return;
        };
        self.write("[");
        self.emit_comma_list(&array.elements, Self::emit_initializer);
        // A trailing hole needs its own comma: `[a, ,]` has length 2.
        if array
            .elements
            .last()
            .is_some_and(|last| self.arena.is_kind(last, syntax_kind_ext::OMITTED_EXPRESSION))
        {
            self.write(",");
        }
        self.write("]");
    }

    pub(super) fn emit_object_literal(&mut self, node: &Node) {
        let Some(object) = self.arena.get_literal_expr(node) else {
            return;
        };
        if object.elements.is_empty() {
            self.write("{}");
            return;
        }

        let multi_line = NodeFlags::from_bits_truncate(node.flags).contains(NodeFlags::MULTI_LINE);
        if !multi_line {
            self.write("{ ");
            self.emit_comma_list(&object.elements, Self::emit_initializer);
            self.write(" }");
            return;
        }

        self.write("{");
        self.write_line();
        self.increase_indent();
        let count = object.elements.len();
        for (i, &property) in object.elements.iter().enumerate() {
            self.emit_initializer(property);
            if i + 1 < count {
                self.write(",");
            }
            self.write_line();
        }
        self.decrease_indent();
        self.write("}");
    }

    pub(super) fn emit_property_assignment(&mut self, node: &Node) {
        let Some(prop) = self.arena.get_property_assignment(node) else {
            return;
        };
        self.emit_expression_with_precedence(prop.name, precedence::PRIMARY);
        self.write(": ");
        self.emit_initializer(prop.initializer);
    }
}
