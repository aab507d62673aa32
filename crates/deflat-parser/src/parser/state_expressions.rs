//! Parser state - expression parsing methods

use super::state::{CONTEXT_FLAG_DISALLOW_IN, DIAG_EXPECTED, DIAG_EXPRESSION_EXPECTED, ParserState};
use crate::parser::{
    NodeIndex, NodeList,
    flags::NodeFlags,
    node::{
        AccessExprData, BinaryExprData, CallExprData, ConditionalExprData, FunctionData, LiteralData,
        LiteralExprData, PropertyAssignmentData, UnaryExprData,
    },
    operator_precedence::{COALESCE, binary_operator_precedence},
    syntax_kind_ext,
};
use deflat_scanner::{SyntaxKind, parse_numeric_text};

impl ParserState {
    // =========================================================================
    // Parse Methods - Expressions
    // =========================================================================

    /// Parse an expression (including comma operator)
    pub fn parse_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let first = self.parse_assignment_expression();
        if !self.is_token(SyntaxKind::CommaToken) || first.is_none() {
            return first;
        }

        let mut elements = vec![first];
        while self.parse_optional(SyntaxKind::CommaToken) {
            let next = self.parse_assignment_expression();
            if next.is_none() {
                self.error_expression_expected();
                break;
            }
            elements.push(next);
        }
        self.arena.add_literal_expr(
            syntax_kind_ext::SEQUENCE_EXPRESSION,
            start,
            self.last_token_end,
            LiteralExprData {
                elements: NodeList::with_nodes(elements),
            },
        )
    }

    /// Parse assignment expression
    pub(crate) fn parse_assignment_expression(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            return NodeIndex::NONE;
        }
        let start = self.token_pos();
        let left = self.parse_conditional_expression();
        let operator = self.token();
        let result = if operator.is_assignment_operator() && left.is_some() {
            if !self.is_left_hand_side(left) {
                self.parse_error_at_current_token(
                    "The left-hand side of an assignment expression must be a variable or a property access.",
                    DIAG_EXPECTED,
                );
            }
            self.next_token();
            let right = self.parse_assignment_expression();
            self.arena.add_binary_expr(
                syntax_kind_ext::BINARY_EXPRESSION,
                start,
                self.last_token_end,
                BinaryExprData {
                    left,
                    operator_token: operator,
                    right,
                },
            )
        } else {
            left
        };
        self.exit_nesting();
        result
    }

    fn is_left_hand_side(&self, node: NodeIndex) -> bool {
        matches!(
            self.arena.kind(node),
            Some(k) if k == SyntaxKind::Identifier as u16
                || k == syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
                || k == syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION
        )
    }

    fn parse_conditional_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let condition = self.parse_binary_expression(COALESCE);
        if !self.is_token(SyntaxKind::QuestionToken) || condition.is_none() {
            return condition;
        }
        self.next_token();
        let when_true = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_assignment_expression());
        self.parse_expected(SyntaxKind::ColonToken);
        let when_false = self.parse_assignment_expression();
        self.arena.add_conditional_expr(
            syntax_kind_ext::CONDITIONAL_EXPRESSION,
            start,
            self.last_token_end,
            ConditionalExprData {
                condition,
                when_true,
                when_false,
            },
        )
    }

    /// Precedence climbing over binary operators binding at least `min_precedence`.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_unary_expression();
        loop {
            let operator = self.token();
            let Some(precedence) = binary_operator_precedence(operator) else {
                break;
            };
            if precedence < min_precedence
                || (operator == SyntaxKind::InKeyword && self.in_context(CONTEXT_FLAG_DISALLOW_IN))
            {
                break;
            }
            self.next_token();
            let right = if operator == SyntaxKind::AsteriskAsteriskToken {
                self.parse_binary_expression(precedence)
            } else {
                self.parse_binary_expression(precedence + 1)
            };
            if right.is_none() {
                self.error_expression_expected();
            }
            left = self.arena.add_binary_expr(
                syntax_kind_ext::BINARY_EXPRESSION,
                start,
                self.last_token_end,
                BinaryExprData {
                    left,
                    operator_token: operator,
                    right,
                },
            );
        }
        left
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let operator = self.token();
        match operator {
            SyntaxKind::ExclamationToken
            | SyntaxKind::TildeToken
            | SyntaxKind::MinusToken
            | SyntaxKind::PlusToken
            | SyntaxKind::TypeOfKeyword
            | SyntaxKind::VoidKeyword
            | SyntaxKind::DeleteKeyword
            | SyntaxKind::PlusPlusToken
            | SyntaxKind::MinusMinusToken => {
                if !self.enter_nesting() {
                    return NodeIndex::NONE;
                }
                self.next_token();
                let operand = self.parse_unary_expression();
                self.exit_nesting();
                if operand.is_none() {
                    self.error_expression_expected();
                }
                self.arena.add_unary_expr(
                    syntax_kind_ext::PREFIX_UNARY_EXPRESSION,
                    start,
                    self.last_token_end,
                    UnaryExprData { operator, operand },
                )
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let operand = self.parse_left_hand_side_expression();
        let operator = self.token();
        if operand.is_some()
            && matches!(operator, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken)
            && !self.scanner.has_preceding_line_break()
        {
            self.next_token();
            return self.arena.add_unary_expr(
                syntax_kind_ext::POSTFIX_UNARY_EXPRESSION,
                start,
                self.last_token_end,
                UnaryExprData { operator, operand },
            );
        }
        operand
    }

    fn parse_left_hand_side_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = if self.is_token(SyntaxKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        if expression.is_none() {
            return expression;
        }
        self.parse_member_expression_rest(start, expression, true)
    }

    /// `new Callee(args)`; member accesses bind to the callee, the first
    /// argument list belongs to `new`.
    fn parse_new_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::NewKeyword);
        let callee_start = self.token_pos();
        let callee = if self.is_token(SyntaxKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        let callee = if callee.is_some() {
            self.parse_member_expression_rest(callee_start, callee, false)
        } else {
            callee
        };
        let arguments = if self.is_token(SyntaxKind::OpenParenToken) {
            self.parse_arguments()
        } else {
            NodeList::new()
        };
        self.arena.add_call_expr(
            syntax_kind_ext::NEW_EXPRESSION,
            start,
            self.last_token_end,
            CallExprData {
                expression: callee,
                arguments,
            },
        )
    }

    fn parse_member_expression_rest(&mut self, start: u32, mut expression: NodeIndex, allow_call: bool) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::DotToken => {
                    self.next_token();
                    if !self.token().is_identifier_or_keyword() {
                        self.parse_error_at_current_token("Identifier expected.", DIAG_EXPECTED);
                        return expression;
                    }
                    let name = self.parse_identifier();
                    expression = self.arena.add_access_expr(
                        syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION,
                        start,
                        self.last_token_end,
                        AccessExprData {
                            expression,
                            name_or_argument: name,
                        },
                    );
                }
                SyntaxKind::OpenBracketToken => {
                    self.next_token();
                    let argument = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression());
                    self.parse_expected(SyntaxKind::CloseBracketToken);
                    expression = self.arena.add_access_expr(
                        syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION,
                        start,
                        self.last_token_end,
                        AccessExprData {
                            expression,
                            name_or_argument: argument,
                        },
                    );
                }
                SyntaxKind::OpenParenToken if allow_call => {
                    let arguments = self.parse_arguments();
                    expression = self.arena.add_call_expr(
                        syntax_kind_ext::CALL_EXPRESSION,
                        start,
                        self.last_token_end,
                        CallExprData {
                            expression,
                            arguments,
                        },
                    );
                }
                _ => return expression,
            }
        }
    }

    fn parse_arguments(&mut self) -> NodeList {
        self.parse_expected(SyntaxKind::OpenParenToken);
        let mut arguments = Vec::new();
        self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| {
            while !p.is_token(SyntaxKind::CloseParenToken) && !p.is_token(SyntaxKind::EndOfFileToken) {
                let argument = p.parse_assignment_expression();
                if argument.is_none() {
                    break;
                }
                arguments.push(argument);
                if !p.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        });
        self.parse_expected(SyntaxKind::CloseParenToken);
        NodeList::with_nodes(arguments)
    }

    // =========================================================================
    // Parse Methods - Primary Expressions
    // =========================================================================

    fn parse_primary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::Identifier => self.parse_identifier(),
            SyntaxKind::NumericLiteral => {
                let text = self.token_value();
                let value = parse_numeric_text(&text);
                let end = self.token_end();
                self.next_token();
                self.arena.add_literal(
                    SyntaxKind::NumericLiteral as u16,
                    start,
                    end,
                    LiteralData { text, value },
                )
            }
            SyntaxKind::StringLiteral => {
                let text = self.token_value();
                let end = self.token_end();
                self.next_token();
                self.arena.add_literal(
                    SyntaxKind::StringLiteral as u16,
                    start,
                    end,
                    LiteralData { text, value: None },
                )
            }
            SyntaxKind::SlashToken | SyntaxKind::SlashEqualsToken => {
                self.current_token = self.scanner.re_scan_slash_token();
                let text = self.token_value();
                let end = self.token_end();
                self.next_token();
                self.arena.add_literal(
                    SyntaxKind::RegularExpressionLiteral as u16,
                    start,
                    end,
                    LiteralData { text, value: None },
                )
            }
            SyntaxKind::ThisKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NullKeyword => {
                let kind = self.token() as u16;
                let end = self.token_end();
                self.next_token();
                self.arena.add_token(kind, start, end)
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let expression = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression());
                self.parse_expected(SyntaxKind::CloseParenToken);
                expression
            }
            SyntaxKind::OpenBracketToken => self.parse_array_literal(),
            SyntaxKind::OpenBraceToken => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => self.parse_function_expression(),
            _ => {
                self.error_expression_expected();
                NodeIndex::NONE
            }
        }
    }

    fn parse_array_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBracketToken);
        let mut elements = Vec::new();
        let mut multi_line = false;
        self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| {
            while !p.is_token(SyntaxKind::CloseBracketToken) && !p.is_token(SyntaxKind::EndOfFileToken) {
                multi_line |= p.scanner.has_preceding_line_break();
                if p.is_token(SyntaxKind::CommaToken) {
                    let pos = p.token_pos();
                    elements.push(p.arena.add_token(syntax_kind_ext::OMITTED_EXPRESSION, pos, pos));
                    p.next_token();
                    continue;
                }
                let element = p.parse_assignment_expression();
                if element.is_none() {
                    break;
                }
                elements.push(element);
                if !p.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
        });
        self.parse_expected(SyntaxKind::CloseBracketToken);
        let node = self.arena.add_literal_expr(
            syntax_kind_ext::ARRAY_LITERAL_EXPRESSION,
            start,
            self.last_token_end,
            LiteralExprData {
                elements: NodeList::with_nodes(elements),
            },
        );
        if multi_line {
            self.arena.nodes[node.0 as usize].flags |= NodeFlags::MULTI_LINE.bits();
        }
        node
    }

    fn parse_object_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let mut properties = Vec::new();
        let mut multi_line = false;
        while !self.is_token(SyntaxKind::CloseBraceToken) && !self.is_token(SyntaxKind::EndOfFileToken) {
            multi_line |= self.scanner.has_preceding_line_break();
            let property_start = self.token_pos();
            let name = match self.token() {
                SyntaxKind::StringLiteral | SyntaxKind::NumericLiteral => self.parse_primary_expression(),
                kind if kind.is_identifier_or_keyword() => self.parse_identifier(),
                _ => {
                    self.parse_error_at_current_token("Property assignment expected.", DIAG_EXPECTED);
                    break;
                }
            };
            if !self.parse_expected(SyntaxKind::ColonToken) {
                break;
            }
            let initializer = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_assignment_expression());
            properties.push(self.arena.add_property_assignment(
                syntax_kind_ext::PROPERTY_ASSIGNMENT,
                property_start,
                self.last_token_end,
                PropertyAssignmentData { name, initializer },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        multi_line |= self.scanner.has_preceding_line_break();
        self.parse_expected(SyntaxKind::CloseBraceToken);
        let node = self.arena.add_literal_expr(
            syntax_kind_ext::OBJECT_LITERAL_EXPRESSION,
            start,
            self.last_token_end,
            LiteralExprData {
                elements: NodeList::with_nodes(properties),
            },
        );
        if multi_line {
            self.arena.nodes[node.0 as usize].flags |= NodeFlags::MULTI_LINE.bits();
        }
        node
    }

    fn parse_function_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::FunctionKeyword);
        let name = if self.is_token(SyntaxKind::Identifier) {
            self.parse_identifier()
        } else {
            NodeIndex::NONE
        };
        let (parameters, body) = self.parse_function_signature_and_body();
        self.arena.add_function(
            syntax_kind_ext::FUNCTION_EXPRESSION,
            start,
            self.last_token_end,
            FunctionData {
                name,
                parameters,
                body,
            },
        )
    }

    fn error_expression_expected(&mut self) {
        self.parse_error_at_current_token("Expression expected.", DIAG_EXPRESSION_EXPECTED);
    }
}
