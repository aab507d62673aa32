use super::Printer;
use deflat_parser::parser::node::Node;
use deflat_parser::parser::{NodeFlags, syntax_kind_ext};
use deflat_parser::{NodeIndex, NodeList};
use deflat_scanner::SyntaxKind;

impl<'a> Printer<'a> {
    // =========================================================================
    // Containers
    // =========================================================================

    pub(super) fn emit_source_file(&mut self, node: &Node) {
        let Some(file) = self.arena.get_source_file(node) else {
            return;
        };
        self.emit_statement_lines(&file.statements);
    }

    pub(super) fn emit_block(&mut self, node: &Node) {
        let Some(block) = self.arena.get_block(node) else {
            return;
        };
        self.emit_braced_statements(&block.statements);
    }

    fn emit_braced_statements(&mut self, statements: &NodeList) {
        if statements.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.write_line();
        self.increase_indent();
        self.emit_statement_lines(statements);
        self.decrease_indent();
        self.write("}");
    }

    /// Emit a non-block statement wrapped in braces.
    fn emit_statement_as_block(&mut self, idx: NodeIndex) {
        if self.arena.is_kind(idx, syntax_kind_ext::BLOCK) {
            self.emit(idx);
            return;
        }
        self.write("{");
        self.write_line();
        self.increase_indent();
        self.emit(idx);
        self.write_line();
        self.decrease_indent();
        self.write("}");
    }

    // =========================================================================
    // Simple Statements
    // =========================================================================

    pub(super) fn emit_expression_statement(&mut self, node: &Node) {
        let Some(stmt) = self.arena.get_expression_statement(node) else {
            return;
        };
        // `function` or `{` at statement start would parse as a declaration or block.
        if self.starts_with_function_or_object(stmt.expression) {
            self.write("(");
            self.emit_expression(stmt.expression);
            self.write(")");
        } else {
            self.emit_expression(stmt.expression);
        }
        self.write(";");
    }

    fn starts_with_function_or_object(&self, expr: NodeIndex) -> bool {
        let mut current = expr;
        loop {
            let Some(node) = self.arena.get(current) else {
                return false;
            };
            current = match node.kind {
                syntax_kind_ext::FUNCTION_EXPRESSION | syntax_kind_ext::OBJECT_LITERAL_EXPRESSION => {
                    return true;
                }
                syntax_kind_ext::BINARY_EXPRESSION => match self.arena.get_binary_expr(node) {
                    Some(binary) => binary.left,
                    None => return false,
                },
                syntax_kind_ext::CONDITIONAL_EXPRESSION => match self.arena.get_conditional_expr(node) {
                    Some(cond) => cond.condition,
                    None => return false,
                },
                syntax_kind_ext::SEQUENCE_EXPRESSION => {
                    match self.arena.get_literal_expr(node).and_then(|s| s.elements.first()) {
                        Some(first) => first,
                        None => return false,
                    }
                }
                syntax_kind_ext::CALL_EXPRESSION => match self.arena.get_call_expr(node) {
                    Some(call) => call.expression,
                    None => return false,
                },
                syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
                | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => match self.arena.get_access_expr(node) {
                    Some(access) => access.expression,
                    None => return false,
                },
                syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => match self.arena.get_unary_expr(node) {
                    Some(unary) => unary.operand,
                    None => return false,
                },
                _ => return false,
            };
        }
    }

    pub(super) fn emit_variable_statement(&mut self, node: &Node) {
        self.emit_variable_declaration_list(node);
        self.write(";");
    }

    pub(super) fn emit_variable_declaration_list(&mut self, node: &Node) {
        self.emit_declarations(node, false);
    }

    /// `var a = 1, b`. Inside a `for` header, initializers containing `in`
    /// are parenthesized.
    fn emit_declarations(&mut self, node: &Node, guard_in: bool) {
        let Some(list) = self.arena.get_variable(node) else {
            return;
        };
        let flags = NodeFlags::from_bits_truncate(node.flags);
        let keyword = if flags.contains(NodeFlags::CONST) {
            "const"
        } else if flags.contains(NodeFlags::LET) {
            "let"
        } else {
            "var"
        };
        self.write(keyword);
        self.write_space();
        for (i, &decl) in list.declarations.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            let Some(decl_node) = self.arena.get(decl) else {
                continue;
            };
            let Some(data) = self.arena.get_variable_declaration(decl_node) else {
                continue;
            };
            self.write_identifier_text(data.name);
            if data.initializer.is_some() {
                self.write(" = ");
                if guard_in && self.contains_in_operator(data.initializer) {
                    self.write("(");
                    self.emit_expression(data.initializer);
                    self.write(")");
                } else {
                    self.emit_initializer(data.initializer);
                }
            }
        }
    }

    pub(super) fn emit_variable_declaration(&mut self, node: &Node) {
        let Some(data) = self.arena.get_variable_declaration(node) else {
            return;
        };
        self.write_identifier_text(data.name);
        if data.initializer.is_some() {
            self.write(" = ");
            self.emit_initializer(data.initializer);
        }
    }

    /// Any `in` operator outside nested functions.
    fn contains_in_operator(&self, root: NodeIndex) -> bool {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            if node.kind == syntax_kind_ext::FUNCTION_EXPRESSION {
                continue;
            }
            if node.kind == syntax_kind_ext::BINARY_EXPRESSION
                && let Some(binary) = self.arena.get_binary_expr(node)
                && binary.operator_token == SyntaxKind::InKeyword
            {
                return true;
            }
            stack.extend(self.arena.children(idx));
        }
        false
    }

    pub(super) fn emit_jump_statement(&mut self, node: &Node, keyword: &str) {
        self.write(keyword);
        if let Some(jump) = self.arena.get_jump_data(node)
            && jump.label.is_some()
        {
            self.write_space();
            self.write_identifier_text(jump.label);
        }
        self.write(";");
    }

    pub(super) fn emit_return_statement(&mut self, node: &Node, keyword: &str) {
        self.write(keyword);
        if let Some(ret) = self.arena.get_return_statement(node)
            && ret.expression.is_some()
        {
            self.write_space();
            self.emit_expression(ret.expression);
        }
        self.write(";");
    }

    pub(super) fn emit_labeled_statement(&mut self, node: &Node) {
        let Some(labeled) = self.arena.get_labeled_statement(node) else {
            return;
        };
        self.write_identifier_text(labeled.label);
        self.write(": ");
        self.emit(labeled.statement);
    }

    // =========================================================================
    // Functions
    // =========================================================================

    pub(super) fn emit_function(&mut self, node: &Node) {
        let Some(func) = self.arena.get_function(node) else {
            return;
        };
        self.write("function");
        if func.name.is_some() {
            self.write_space();
            self.write_identifier_text(func.name);
        } else {
            self.write_space();
        }
        self.write("(");
        self.emit_comma_list(&func.parameters, Self::write_identifier_text);
        self.write(") ");
        self.emit(func.body);
    }

    // =========================================================================
    // Control Flow
    // =========================================================================

    pub(super) fn emit_if_statement(&mut self, node: &Node) {
        let Some(stmt) = self.arena.get_if_statement(node) else {
            return;
        };
        self.write("if (");
        self.emit_expression(stmt.expression);
        self.write(")");

        if stmt.else_statement.is_none() {
            self.emit_embedded_statement(stmt.then_statement);
            return;
        }

        // Braces keep a nested `if` from capturing the `else`.
        self.write_space();
        self.emit_statement_as_block(stmt.then_statement);
        self.write(" else ");
        if self.arena.is_kind(stmt.else_statement, syntax_kind_ext::IF_STATEMENT) {
            self.emit(stmt.else_statement);
        } else {
            self.emit_statement_as_block(stmt.else_statement);
        }
    }

    pub(super) fn emit_for_statement(&mut self, node: &Node) {
        let Some(data) = self.arena.get_loop(node) else {
            return;
        };
        self.write("for (");
        if let Some(init) = self.arena.get(data.initializer) {
            if init.kind == syntax_kind_ext::VARIABLE_DECLARATION_LIST {
                self.emit_declarations(init, true);
            } else if self.contains_in_operator(data.initializer) {
                self.write("(");
                self.emit_expression(data.initializer);
                self.write(")");
            } else {
                self.emit_expression(data.initializer);
            }
        }
        self.write(";");
        if data.condition.is_some() {
            self.write_space();
            self.emit_expression(data.condition);
        }
        self.write(";");
        if data.incrementor.is_some() {
            self.write_space();
            self.emit_expression(data.incrementor);
        }
        self.write(")");
        self.emit_embedded_statement(data.statement);
    }

    pub(super) fn emit_for_in_statement(&mut self, node: &Node) {
        let Some(data) = self.arena.get_for_in(node) else {
            return;
        };
        self.write("for (");
        self.emit(data.initializer);
        self.write(" in ");
        self.emit_expression(data.expression);
        self.write(")");
        self.emit_embedded_statement(data.statement);
    }

    pub(super) fn emit_while_statement(&mut self, node: &Node) {
        let Some(data) = self.arena.get_loop(node) else {
            return;
        };
        self.write("while (");
        self.emit_expression(data.condition);
        self.write(")");
        self.emit_embedded_statement(data.statement);
    }

    pub(super) fn emit_do_statement(&mut self, node: &Node) {
        let Some(data) = self.arena.get_loop(node) else {
            return;
        };
        self.write("do");
        self.emit_embedded_statement(data.statement);
        if self.arena.is_kind(data.statement, syntax_kind_ext::BLOCK) {
            self.write_space();
        } else {
            self.write_line();
        }
        self.write("while (");
        self.emit_expression(data.condition);
        self.write(");");
    }

    pub(super) fn emit_switch_statement(&mut self, node: &Node) {
        let Some(data) = self.arena.get_switch(node) else {
            return;
        };
        self.write("switch (");
        self.emit_expression(data.expression);
        self.write(") {");
        self.write_line();
        self.increase_indent();
        for &clause in data.clauses.iter() {
            self.emit_leading_comments(clause);
            self.emit(clause);
            self.write_line();
        }
        self.decrease_indent();
        self.write("}");
    }

    /// `case v: { ... }` when the clause holds exactly one block, otherwise
    /// the statements follow on indented lines.
    pub(super) fn emit_case_clause(&mut self, node: &Node) {
        let Some(clause) = self.arena.get_case_clause(node) else {
            return;
        };
        if node.kind == syntax_kind_ext::DEFAULT_CLAUSE {
            self.write("default:");
        } else {
            self.write("case ");
            self.emit_expression(clause.expression);
            self.write(":");
        }

        if clause.statements.len() == 1
            && let Some(only) = clause.statements.first()
            && self.arena.is_kind(only, syntax_kind_ext::BLOCK)
        {
            self.write_space();
            self.emit(only);
            return;
        }
        if clause.statements.is_empty() {
            return;
        }
        self.write_line();
        self.increase_indent();
        self.emit_statement_lines(&clause.statements);
        self.decrease_indent();
    }

    pub(super) fn emit_try_statement(&mut self, node: &Node) {
        let Some(data) = self.arena.get_try(node) else {
            return;
        };
        self.write("try ");
        self.emit(data.try_block);
        if data.catch_clause.is_some() {
            self.write_space();
            self.emit(data.catch_clause);
        }
        if data.finally_block.is_some() {
            self.write(" finally ");
            self.emit(data.finally_block);
        }
    }

    pub(super) fn emit_catch_clause(&mut self, node: &Node) {
        let Some(data) = self.arena.get_catch_clause(node) else {
            return;
        };
        self.write("catch (");
        self.write_identifier_text(data.variable_declaration);
        self.write(") ");
        self.emit(data.block);
    }
}
