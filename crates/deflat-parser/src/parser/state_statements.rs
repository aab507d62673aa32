//! Parser state - statement and declaration parsing methods

use super::state::{
    CONTEXT_FLAG_DISALLOW_IN, CONTEXT_FLAG_IN_FUNCTION, DIAG_DECLARATION_OR_STATEMENT_EXPECTED,
    DIAG_EXPECTED, DIAG_RETURN_OUTSIDE_FUNCTION, ParseDiagnostic, ParserState,
};
use crate::parser::{
    NodeIndex, NodeList,
    flags::NodeFlags,
    node::{
        BlockData, CaseClauseData, CatchClauseData, ExprStatementData, ForInData, FunctionData,
        IdentifierData, IfStatementData, JumpData, LabeledData, LoopData, ReturnData,
        SourceFileData, SwitchData, TryData, VariableData, VariableDeclarationData,
    },
    syntax_kind_ext,
};
use deflat_scanner::SyntaxKind;
use std::sync::Arc;

impl ParserState {
    // =========================================================================
    // Parse Methods - Source File
    // =========================================================================

    /// Parse a source file
    pub fn parse_source_file(&mut self) -> NodeIndex {
        self.next_token();

        let statements = self.parse_statement_list(|p| p.is_token(SyntaxKind::EndOfFileToken));

        for diag in self.scanner.get_scanner_diagnostics().to_vec() {
            self.parse_diagnostics.push(ParseDiagnostic {
                start: diag.pos as u32,
                length: diag.length as u32,
                message: diag.message.to_string(),
                code: diag.code,
            });
        }
        self.parse_diagnostics.sort_by_key(|d| d.start);

        let end_pos = self.token_end();
        let comments = self.scanner.take_comment_ranges();
        let text: Arc<str> = Arc::from(self.scanner.source_text());

        self.arena.add_source_file(
            0,
            end_pos,
            SourceFileData {
                statements,
                file_name: self.file_name.clone(),
                text,
                comments,
            },
        )
    }

    /// Parse statements until `is_end` holds (or end of file).
    fn parse_statement_list(&mut self, is_end: fn(&ParserState) -> bool) -> NodeList {
        let mut statements = Vec::new();
        while !is_end(self) && !self.is_token(SyntaxKind::EndOfFileToken) {
            let start = self.token_pos();
            let token = self.token();
            let statement = self.parse_statement();
            if statement.is_some() {
                statements.push(statement);
            }
            if self.token_pos() == start && self.token() == token {
                // No progress: skip the offending token.
                self.next_token();
            }
        }
        NodeList::with_nodes(statements)
    }

    // =========================================================================
    // Parse Methods - Statements
    // =========================================================================

    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            return NodeIndex::NONE;
        }
        let statement = match self.token() {
            SyntaxKind::OpenBraceToken => self.parse_block(),
            SyntaxKind::SemicolonToken => {
                let start = self.token_pos();
                self.next_token();
                self.arena
                    .add_token(syntax_kind_ext::EMPTY_STATEMENT, start, self.last_token_end)
            }
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_statement()
            }
            SyntaxKind::FunctionKeyword => self.parse_function_declaration(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_statement(),
            SyntaxKind::SwitchKeyword => self.parse_switch_statement(),
            SyntaxKind::BreakKeyword => self.parse_jump_statement(syntax_kind_ext::BREAK_STATEMENT),
            SyntaxKind::ContinueKeyword => self.parse_jump_statement(syntax_kind_ext::CONTINUE_STATEMENT),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::ThrowKeyword => self.parse_throw_statement(),
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::DebuggerKeyword => {
                let start = self.token_pos();
                self.next_token();
                self.parse_semicolon();
                self.arena
                    .add_token(syntax_kind_ext::DEBUGGER_STATEMENT, start, self.last_token_end)
            }
            SyntaxKind::Identifier if self.next_token_is(SyntaxKind::ColonToken) => {
                self.parse_labeled_statement()
            }
            SyntaxKind::CloseBraceToken
            | SyntaxKind::CaseKeyword
            | SyntaxKind::DefaultKeyword
            | SyntaxKind::ElseKeyword
            | SyntaxKind::CatchKeyword
            | SyntaxKind::FinallyKeyword => {
                self.parse_error_at_current_token(
                    "Declaration or statement expected.",
                    DIAG_DECLARATION_OR_STATEMENT_EXPECTED,
                );
                NodeIndex::NONE
            }
            _ => self.parse_expression_statement(),
        };
        self.exit_nesting();
        statement
    }

    /// Parse a block statement
    pub(crate) fn parse_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::OpenBraceToken);
        let statements = self.parse_statement_list(|p| p.is_token(SyntaxKind::CloseBraceToken));
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.arena.add_block(
            syntax_kind_ext::BLOCK,
            start,
            self.last_token_end,
            BlockData { statements },
        )
    }

    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = self.parse_expression();
        if expression.is_none() {
            return NodeIndex::NONE;
        }
        self.parse_semicolon();
        self.arena.add_expr_statement(
            syntax_kind_ext::EXPRESSION_STATEMENT,
            start,
            self.last_token_end,
            ExprStatementData { expression },
        )
    }

    fn parse_labeled_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let label = self.parse_identifier();
        self.parse_expected(SyntaxKind::ColonToken);
        let statement = self.parse_statement();
        self.arena.add_labeled(
            syntax_kind_ext::LABELED_STATEMENT,
            start,
            self.last_token_end,
            LabeledData { label, statement },
        )
    }

    // =========================================================================
    // Parse Methods - Declarations
    // =========================================================================

    fn parse_variable_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let (flags, declarations) = self.parse_variable_declarations();
        self.parse_semicolon();
        let node = self.arena.add_variable(
            syntax_kind_ext::VARIABLE_STATEMENT,
            start,
            self.last_token_end,
            VariableData { declarations },
        );
        self.arena.nodes[node.0 as usize].flags |= flags.bits();
        node
    }

    /// Parse `var|let|const a = 1, b` (the keyword is the current token).
    fn parse_variable_declarations(&mut self) -> (NodeFlags, NodeList) {
        let flags = match self.token() {
            SyntaxKind::LetKeyword => NodeFlags::LET,
            SyntaxKind::ConstKeyword => NodeFlags::CONST,
            _ => NodeFlags::empty(),
        };
        self.next_token();

        let mut declarations = Vec::new();
        loop {
            let start = self.token_pos();
            let name = self.parse_binding_identifier();
            let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
                self.parse_assignment_expression()
            } else {
                NodeIndex::NONE
            };
            declarations.push(self.arena.add_variable_declaration(
                syntax_kind_ext::VARIABLE_DECLARATION,
                start,
                self.last_token_end,
                VariableDeclarationData { name, initializer },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        (flags, NodeList::with_nodes(declarations))
    }

    fn parse_function_declaration(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::FunctionKeyword);
        let name = self.parse_binding_identifier();
        let (parameters, body) = self.parse_function_signature_and_body();
        self.arena.add_function(
            syntax_kind_ext::FUNCTION_DECLARATION,
            start,
            self.last_token_end,
            FunctionData {
                name,
                parameters,
                body,
            },
        )
    }

    /// Parse `(a, b) { ... }` after a function keyword and optional name.
    pub(crate) fn parse_function_signature_and_body(&mut self) -> (NodeList, NodeIndex) {
        self.parse_expected(SyntaxKind::OpenParenToken);
        let mut parameters = Vec::new();
        while !self.is_token(SyntaxKind::CloseParenToken) && !self.is_token(SyntaxKind::EndOfFileToken) {
            let parameter = self.parse_binding_identifier();
            if parameter.is_none() {
                break;
            }
            parameters.push(parameter);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        let body = self.with_context(CONTEXT_FLAG_IN_FUNCTION, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_block());
        (NodeList::with_nodes(parameters), body)
    }

    /// Parse an identifier in a binding position.
    pub(crate) fn parse_binding_identifier(&mut self) -> NodeIndex {
        if !self.is_token(SyntaxKind::Identifier) {
            self.parse_error_at_current_token("Identifier expected.", DIAG_EXPECTED);
            return NodeIndex::NONE;
        }
        self.parse_identifier()
    }

    /// Consume the current token as an identifier node (keywords included,
    /// for property names).
    pub(crate) fn parse_identifier(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let end = self.token_end();
        let text = self.token_value();
        self.next_token();
        self.arena.add_identifier(
            SyntaxKind::Identifier as u16,
            start,
            end,
            IdentifierData { escaped_text: text },
        )
    }

    // =========================================================================
    // Parse Methods - Control Flow
    // =========================================================================

    fn parse_parenthesized_condition(&mut self) -> NodeIndex {
        self.parse_expected(SyntaxKind::OpenParenToken);
        let expression = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression());
        self.parse_expected(SyntaxKind::CloseParenToken);
        expression
    }

    fn parse_if_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::IfKeyword);
        let expression = self.parse_parenthesized_condition();
        let then_statement = self.parse_statement();
        let else_statement = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_statement()
        } else {
            NodeIndex::NONE
        };
        self.arena.add_if_statement(
            syntax_kind_ext::IF_STATEMENT,
            start,
            self.last_token_end,
            IfStatementData {
                expression,
                then_statement,
                else_statement,
            },
        )
    }

    fn parse_for_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::ForKeyword);
        self.parse_expected(SyntaxKind::OpenParenToken);

        let initializer = self.with_context(CONTEXT_FLAG_DISALLOW_IN, 0, |p| {
            if matches!(
                p.token(),
                SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword
            ) {
                let list_start = p.token_pos();
                let (flags, declarations) = p.parse_variable_declarations();
                let list = p.arena.add_variable(
                    syntax_kind_ext::VARIABLE_DECLARATION_LIST,
                    list_start,
                    p.last_token_end,
                    VariableData { declarations },
                );
                p.arena.nodes[list.0 as usize].flags |= flags.bits();
                list
            } else if p.is_token(SyntaxKind::SemicolonToken) {
                NodeIndex::NONE
            } else {
                p.parse_expression()
            }
        });

        if initializer.is_some() && self.parse_optional(SyntaxKind::InKeyword) {
            let expression = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression());
            self.parse_expected(SyntaxKind::CloseParenToken);
            let statement = self.parse_statement();
            return self.arena.add_for_in(
                syntax_kind_ext::FOR_IN_STATEMENT,
                start,
                self.last_token_end,
                ForInData {
                    initializer,
                    expression,
                    statement,
                },
            );
        }

        self.parse_expected(SyntaxKind::SemicolonToken);
        let condition = if self.is_token(SyntaxKind::SemicolonToken) {
            NodeIndex::NONE
        } else {
            self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression())
        };
        self.parse_expected(SyntaxKind::SemicolonToken);
        let incrementor = if self.is_token(SyntaxKind::CloseParenToken) {
            NodeIndex::NONE
        } else {
            self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression())
        };
        self.parse_expected(SyntaxKind::CloseParenToken);
        let statement = self.parse_statement();

        self.arena.add_loop(
            syntax_kind_ext::FOR_STATEMENT,
            start,
            self.last_token_end,
            LoopData {
                initializer,
                condition,
                incrementor,
                statement,
            },
        )
    }

    fn parse_while_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::WhileKeyword);
        let condition = self.parse_parenthesized_condition();
        let statement = self.parse_statement();
        self.arena.add_loop(
            syntax_kind_ext::WHILE_STATEMENT,
            start,
            self.last_token_end,
            LoopData {
                initializer: NodeIndex::NONE,
                condition,
                incrementor: NodeIndex::NONE,
                statement,
            },
        )
    }

    fn parse_do_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::DoKeyword);
        let statement = self.parse_statement();
        self.parse_expected(SyntaxKind::WhileKeyword);
        let condition = self.parse_parenthesized_condition();
        // ASI always applies after the closing paren of a do-while.
        self.parse_optional(SyntaxKind::SemicolonToken);
        self.arena.add_loop(
            syntax_kind_ext::DO_STATEMENT,
            start,
            self.last_token_end,
            LoopData {
                initializer: NodeIndex::NONE,
                condition,
                incrementor: NodeIndex::NONE,
                statement,
            },
        )
    }

    fn parse_switch_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::SwitchKeyword);
        let expression = self.parse_parenthesized_condition();
        self.parse_expected(SyntaxKind::OpenBraceToken);

        let mut clauses = Vec::new();
        while !self.is_token(SyntaxKind::CloseBraceToken) && !self.is_token(SyntaxKind::EndOfFileToken) {
            let clause_start = self.token_pos();
            let (kind, test) = match self.token() {
                SyntaxKind::CaseKeyword => {
                    self.next_token();
                    let test = self.with_context(0, CONTEXT_FLAG_DISALLOW_IN, |p| p.parse_expression());
                    (syntax_kind_ext::CASE_CLAUSE, test)
                }
                SyntaxKind::DefaultKeyword => {
                    self.next_token();
                    (syntax_kind_ext::DEFAULT_CLAUSE, NodeIndex::NONE)
                }
                _ => {
                    self.parse_error_at_current_token("'case' or 'default' expected.", DIAG_EXPECTED);
                    self.next_token();
                    continue;
                }
            };
            self.parse_expected(SyntaxKind::ColonToken);
            let statements = self.parse_statement_list(|p| {
                matches!(
                    p.token(),
                    SyntaxKind::CaseKeyword | SyntaxKind::DefaultKeyword | SyntaxKind::CloseBraceToken
                )
            });
            clauses.push(self.arena.add_case_clause(
                kind,
                clause_start,
                self.last_token_end,
                CaseClauseData {
                    expression: test,
                    statements,
                },
            ));
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);

        self.arena.add_switch(
            syntax_kind_ext::SWITCH_STATEMENT,
            start,
            self.last_token_end,
            SwitchData {
                expression,
                clauses: NodeList::with_nodes(clauses),
            },
        )
    }

    fn parse_jump_statement(&mut self, kind: u16) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let label = if self.is_token(SyntaxKind::Identifier) && !self.scanner.has_preceding_line_break() {
            self.parse_identifier()
        } else {
            NodeIndex::NONE
        };
        self.parse_semicolon();
        self.arena
            .add_jump(kind, start, self.last_token_end, JumpData { label })
    }

    fn parse_return_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if !self.in_context(CONTEXT_FLAG_IN_FUNCTION) {
            self.parse_error_at_current_token(
                "A 'return' statement can only be used within a function body.",
                DIAG_RETURN_OUTSIDE_FUNCTION,
            );
        }
        self.next_token();
        let expression = if self.can_parse_semicolon() {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_semicolon();
        self.arena.add_return(
            syntax_kind_ext::RETURN_STATEMENT,
            start,
            self.last_token_end,
            ReturnData { expression },
        )
    }

    fn parse_throw_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        if self.scanner.has_preceding_line_break() {
            self.parse_error_at_current_token("Line break not permitted here.", DIAG_EXPECTED);
        }
        let expression = self.parse_expression();
        self.parse_semicolon();
        self.arena.add_return(
            syntax_kind_ext::THROW_STATEMENT,
            start,
            self.last_token_end,
            ReturnData { expression },
        )
    }

    fn parse_try_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected(SyntaxKind::TryKeyword);
        let try_block = self.parse_block();

        let catch_clause = if self.is_token(SyntaxKind::CatchKeyword) {
            let catch_start = self.token_pos();
            self.next_token();
            self.parse_expected(SyntaxKind::OpenParenToken);
            let variable_declaration = self.parse_binding_identifier();
            self.parse_expected(SyntaxKind::CloseParenToken);
            let block = self.parse_block();
            self.arena.add_catch_clause(
                syntax_kind_ext::CATCH_CLAUSE,
                catch_start,
                self.last_token_end,
                CatchClauseData {
                    variable_declaration,
                    block,
                },
            )
        } else {
            NodeIndex::NONE
        };

        let finally_block = if self.parse_optional(SyntaxKind::FinallyKeyword) {
            self.parse_block()
        } else {
            NodeIndex::NONE
        };

        if catch_clause.is_none() && finally_block.is_none() {
            self.parse_error_at_current_token("'catch' or 'finally' expected.", DIAG_EXPECTED);
        }

        self.arena.add_try(
            syntax_kind_ext::TRY_STATEMENT,
            start,
            self.last_token_end,
            TryData {
                try_block,
                catch_clause,
                finally_block,
            },
        )
    }
}
