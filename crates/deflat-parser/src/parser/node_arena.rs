//! NodeArena creation methods (add_* and create_* methods).
//!
//! `add_*` methods are used by the parser and take explicit positions.
//! `create_*` methods build synthesized nodes for the rewrite passes: they
//! carry `pos = end = 0` and the `SYNTHESIZED` flag.

use super::base::{NodeIndex, NodeList};
use super::flags::NodeFlags;
use super::node::*;
use super::syntax_kind_ext;
use deflat_scanner::SyntaxKind;

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Number of nodes ever allocated (detached nodes included).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ============================================================================
    // Parent Links
    // ============================================================================

    #[inline]
    pub fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        if let Some(info) = self.extended_info.get_mut(child.0 as usize) {
            info.parent = parent;
        }
    }

    pub fn set_parent_list(&mut self, list: &NodeList, parent: NodeIndex) {
        for &child in &list.nodes {
            self.set_parent(child, parent);
        }
    }

    fn push_node(&mut self, kind: u16, pos: u32, end: u32, data_index: u32) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(Node::with_data(kind, pos, end, data_index));
        self.extended_info.push(ExtendedNodeInfo::default());
        NodeIndex(index)
    }

    // ============================================================================
    // Node Creation Methods
    // ============================================================================

    /// Add a token node (no additional data)
    pub fn add_token(&mut self, kind: u16, pos: u32, end: u32) -> NodeIndex {
        self.push_node(kind, pos, end, Node::NO_DATA)
    }

    pub fn add_identifier(&mut self, kind: u16, pos: u32, end: u32, data: IdentifierData) -> NodeIndex {
        let data_index = self.identifiers.len() as u32;
        self.identifiers.push(data);
        self.push_node(kind, pos, end, data_index)
    }

    pub fn add_literal(&mut self, kind: u16, pos: u32, end: u32, data: LiteralData) -> NodeIndex {
        let data_index = self.literals.len() as u32;
        self.literals.push(data);
        self.push_node(kind, pos, end, data_index)
    }

    pub fn add_binary_expr(&mut self, kind: u16, pos: u32, end: u32, data: BinaryExprData) -> NodeIndex {
        let (left, right) = (data.left, data.right);
        let data_index = self.binary_exprs.len() as u32;
        self.binary_exprs.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(left, parent);
        self.set_parent(right, parent);
        parent
    }

    pub fn add_unary_expr(&mut self, kind: u16, pos: u32, end: u32, data: UnaryExprData) -> NodeIndex {
        let operand = data.operand;
        let data_index = self.unary_exprs.len() as u32;
        self.unary_exprs.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(operand, parent);
        parent
    }

    pub fn add_conditional_expr(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: ConditionalExprData,
    ) -> NodeIndex {
        let children = [data.condition, data.when_true, data.when_false];
        let data_index = self.conditional_exprs.len() as u32;
        self.conditional_exprs.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        for child in children {
            self.set_parent(child, parent);
        }
        parent
    }

    /// Array literal, object literal or comma sequence
    pub fn add_literal_expr(&mut self, kind: u16, pos: u32, end: u32, data: LiteralExprData) -> NodeIndex {
        let elements = data.elements.clone();
        let data_index = self.literal_exprs.len() as u32;
        self.literal_exprs.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent_list(&elements, parent);
        parent
    }

    /// Call or `new` expression
    pub fn add_call_expr(&mut self, kind: u16, pos: u32, end: u32, data: CallExprData) -> NodeIndex {
        let expression = data.expression;
        let arguments = data.arguments.clone();
        let data_index = self.call_exprs.len() as u32;
        self.call_exprs.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(expression, parent);
        self.set_parent_list(&arguments, parent);
        parent
    }

    pub fn add_access_expr(&mut self, kind: u16, pos: u32, end: u32, data: AccessExprData) -> NodeIndex {
        let (expression, name) = (data.expression, data.name_or_argument);
        let data_index = self.access_exprs.len() as u32;
        self.access_exprs.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(expression, parent);
        self.set_parent(name, parent);
        parent
    }

    pub fn add_property_assignment(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: PropertyAssignmentData,
    ) -> NodeIndex {
        let (name, initializer) = (data.name, data.initializer);
        let data_index = self.property_assignments.len() as u32;
        self.property_assignments.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(name, parent);
        self.set_parent(initializer, parent);
        parent
    }

    pub fn add_function(&mut self, kind: u16, pos: u32, end: u32, data: FunctionData) -> NodeIndex {
        let (name, body) = (data.name, data.body);
        let parameters = data.parameters.clone();
        let data_index = self.functions.len() as u32;
        self.functions.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(name, parent);
        self.set_parent_list(&parameters, parent);
        self.set_parent(body, parent);
        parent
    }

    pub fn add_block(&mut self, kind: u16, pos: u32, end: u32, data: BlockData) -> NodeIndex {
        let statements = data.statements.clone();
        let data_index = self.blocks.len() as u32;
        self.blocks.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent_list(&statements, parent);
        parent
    }

    pub fn add_expr_statement(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: ExprStatementData,
    ) -> NodeIndex {
        let expression = data.expression;
        let data_index = self.expr_statements.len() as u32;
        self.expr_statements.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(expression, parent);
        parent
    }

    /// Variable statement or `for` initializer declaration list
    pub fn add_variable(&mut self, kind: u16, pos: u32, end: u32, data: VariableData) -> NodeIndex {
        let declarations = data.declarations.clone();
        let data_index = self.variables.len() as u32;
        self.variables.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent_list(&declarations, parent);
        parent
    }

    pub fn add_variable_declaration(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: VariableDeclarationData,
    ) -> NodeIndex {
        let (name, initializer) = (data.name, data.initializer);
        let data_index = self.variable_declarations.len() as u32;
        self.variable_declarations.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(name, parent);
        self.set_parent(initializer, parent);
        parent
    }

    pub fn add_if_statement(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: IfStatementData,
    ) -> NodeIndex {
        let children = [data.expression, data.then_statement, data.else_statement];
        let data_index = self.if_statements.len() as u32;
        self.if_statements.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        for child in children {
            self.set_parent(child, parent);
        }
        parent
    }

    pub fn add_loop(&mut self, kind: u16, pos: u32, end: u32, data: LoopData) -> NodeIndex {
        let children = [data.initializer, data.condition, data.incrementor, data.statement];
        let data_index = self.loops.len() as u32;
        self.loops.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        for child in children {
            self.set_parent(child, parent);
        }
        parent
    }

    pub fn add_for_in(&mut self, kind: u16, pos: u32, end: u32, data: ForInData) -> NodeIndex {
        let children = [data.initializer, data.expression, data.statement];
        let data_index = self.for_in_data.len() as u32;
        self.for_in_data.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        for child in children {
            self.set_parent(child, parent);
        }
        parent
    }

    pub fn add_switch(&mut self, kind: u16, pos: u32, end: u32, data: SwitchData) -> NodeIndex {
        let expression = data.expression;
        let clauses = data.clauses.clone();
        let data_index = self.switch_data.len() as u32;
        self.switch_data.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(expression, parent);
        self.set_parent_list(&clauses, parent);
        parent
    }

    pub fn add_case_clause(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: CaseClauseData,
    ) -> NodeIndex {
        let expression = data.expression;
        let statements = data.statements.clone();
        let data_index = self.case_clauses.len() as u32;
        self.case_clauses.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(expression, parent);
        self.set_parent_list(&statements, parent);
        parent
    }

    /// `return` or `throw`
    pub fn add_return(&mut self, kind: u16, pos: u32, end: u32, data: ReturnData) -> NodeIndex {
        let expression = data.expression;
        let data_index = self.return_data.len() as u32;
        self.return_data.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(expression, parent);
        parent
    }

    /// `break` or `continue`
    pub fn add_jump(&mut self, kind: u16, pos: u32, end: u32, data: JumpData) -> NodeIndex {
        let label = data.label;
        let data_index = self.jump_data.len() as u32;
        self.jump_data.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(label, parent);
        parent
    }

    pub fn add_labeled(&mut self, kind: u16, pos: u32, end: u32, data: LabeledData) -> NodeIndex {
        let (label, statement) = (data.label, data.statement);
        let data_index = self.labeled_data.len() as u32;
        self.labeled_data.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(label, parent);
        self.set_parent(statement, parent);
        parent
    }

    pub fn add_try(&mut self, kind: u16, pos: u32, end: u32, data: TryData) -> NodeIndex {
        let children = [data.try_block, data.catch_clause, data.finally_block];
        let data_index = self.try_data.len() as u32;
        self.try_data.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        for child in children {
            self.set_parent(child, parent);
        }
        parent
    }

    pub fn add_catch_clause(
        &mut self,
        kind: u16,
        pos: u32,
        end: u32,
        data: CatchClauseData,
    ) -> NodeIndex {
        let (variable, block) = (data.variable_declaration, data.block);
        let data_index = self.catch_clauses.len() as u32;
        self.catch_clauses.push(data);
        let parent = self.push_node(kind, pos, end, data_index);
        self.set_parent(variable, parent);
        self.set_parent(block, parent);
        parent
    }

    pub fn add_source_file(&mut self, pos: u32, end: u32, data: SourceFileData) -> NodeIndex {
        let statements = data.statements.clone();
        let data_index = self.source_files.len() as u32;
        self.source_files.push(data);
        let parent = self.push_node(syntax_kind_ext::SOURCE_FILE, pos, end, data_index);
        self.set_parent_list(&statements, parent);
        parent
    }

    // ============================================================================
    // Synthesized Node Factories
    // ============================================================================

    fn mark_synthesized(&mut self, node: NodeIndex) -> NodeIndex {
        if let Some(header) = self.nodes.get_mut(node.0 as usize) {
            header.flags |= NodeFlags::SYNTHESIZED.bits();
        }
        node
    }

    pub fn create_token(&mut self, kind: SyntaxKind) -> NodeIndex {
        let node = self.add_token(kind as u16, 0, 0);
        self.mark_synthesized(node)
    }

    pub fn create_identifier(&mut self, text: &str) -> NodeIndex {
        let node = self.add_identifier(
            SyntaxKind::Identifier as u16,
            0,
            0,
            IdentifierData {
                escaped_text: text.to_string(),
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_numeric_literal(&mut self, value: f64) -> NodeIndex {
        let node = self.add_literal(
            SyntaxKind::NumericLiteral as u16,
            0,
            0,
            LiteralData {
                text: format_number(value),
                value: Some(value),
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_string_literal(&mut self, text: &str) -> NodeIndex {
        let node = self.add_literal(
            SyntaxKind::StringLiteral as u16,
            0,
            0,
            LiteralData {
                text: text.to_string(),
                value: None,
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_binary(&mut self, left: NodeIndex, operator_token: SyntaxKind, right: NodeIndex) -> NodeIndex {
        let node = self.add_binary_expr(
            syntax_kind_ext::BINARY_EXPRESSION,
            0,
            0,
            BinaryExprData {
                left,
                operator_token,
                right,
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_prefix_unary(&mut self, operator: SyntaxKind, operand: NodeIndex) -> NodeIndex {
        let node = self.add_unary_expr(
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION,
            0,
            0,
            UnaryExprData { operator, operand },
        );
        self.mark_synthesized(node)
    }

    pub fn create_expression_statement(&mut self, expression: NodeIndex) -> NodeIndex {
        let node = self.add_expr_statement(
            syntax_kind_ext::EXPRESSION_STATEMENT,
            0,
            0,
            ExprStatementData { expression },
        );
        self.mark_synthesized(node)
    }

    pub fn create_block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        let node = self.add_block(
            syntax_kind_ext::BLOCK,
            0,
            0,
            BlockData {
                statements: NodeList::with_nodes(statements),
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_if_statement(
        &mut self,
        expression: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    ) -> NodeIndex {
        let node = self.add_if_statement(
            syntax_kind_ext::IF_STATEMENT,
            0,
            0,
            IfStatementData {
                expression,
                then_statement,
                else_statement,
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_while_statement(&mut self, condition: NodeIndex, statement: NodeIndex) -> NodeIndex {
        let node = self.add_loop(
            syntax_kind_ext::WHILE_STATEMENT,
            0,
            0,
            LoopData {
                initializer: NodeIndex::NONE,
                condition,
                incrementor: NodeIndex::NONE,
                statement,
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_switch(&mut self, expression: NodeIndex, clauses: Vec<NodeIndex>) -> NodeIndex {
        let node = self.add_switch(
            syntax_kind_ext::SWITCH_STATEMENT,
            0,
            0,
            SwitchData {
                expression,
                clauses: NodeList::with_nodes(clauses),
            },
        );
        self.mark_synthesized(node)
    }

    /// `case expression:` clause, or a default clause when `expression` is NONE.
    pub fn create_case_clause(&mut self, expression: NodeIndex, statements: Vec<NodeIndex>) -> NodeIndex {
        let kind = if expression.is_none() {
            syntax_kind_ext::DEFAULT_CLAUSE
        } else {
            syntax_kind_ext::CASE_CLAUSE
        };
        let node = self.add_case_clause(
            kind,
            0,
            0,
            CaseClauseData {
                expression,
                statements: NodeList::with_nodes(statements),
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_conditional(
        &mut self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> NodeIndex {
        let node = self.add_conditional_expr(
            syntax_kind_ext::CONDITIONAL_EXPRESSION,
            0,
            0,
            ConditionalExprData {
                condition,
                when_true,
                when_false,
            },
        );
        self.mark_synthesized(node)
    }

    pub fn create_sequence(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        let node = self.add_literal_expr(
            syntax_kind_ext::SEQUENCE_EXPRESSION,
            0,
            0,
            LiteralExprData {
                elements: NodeList::with_nodes(elements),
            },
        );
        self.mark_synthesized(node)
    }

    /// `return expression;` (a NONE expression gives a bare `return;`)
    pub fn create_return(&mut self, expression: NodeIndex) -> NodeIndex {
        let node = self.add_return(syntax_kind_ext::RETURN_STATEMENT, 0, 0, ReturnData { expression });
        self.mark_synthesized(node)
    }

    pub fn create_variable_declaration(&mut self, name: &str, initializer: NodeIndex) -> NodeIndex {
        let name = self.create_identifier(name);
        let node = self.add_variable_declaration(
            syntax_kind_ext::VARIABLE_DECLARATION,
            0,
            0,
            VariableDeclarationData { name, initializer },
        );
        self.mark_synthesized(node)
    }

    /// Variable statement over `declarations`. `flags` carries `LET`/`CONST`
    /// for block-scoped lists.
    pub fn create_variable_statement(&mut self, declarations: Vec<NodeIndex>, flags: NodeFlags) -> NodeIndex {
        let node = self.add_variable(
            syntax_kind_ext::VARIABLE_STATEMENT,
            0,
            0,
            VariableData {
                declarations: NodeList::with_nodes(declarations),
            },
        );
        if let Some(header) = self.nodes.get_mut(node.0 as usize) {
            header.flags |= (flags & NodeFlags::BLOCK_SCOPED).bits();
        }
        self.mark_synthesized(node)
    }

    pub fn create_break(&mut self) -> NodeIndex {
        let node = self.add_jump(
            syntax_kind_ext::BREAK_STATEMENT,
            0,
            0,
            JumpData {
                label: NodeIndex::NONE,
            },
        );
        self.mark_synthesized(node)
    }
}

/// Render a number the way JavaScript's `Number.prototype.toString` does for
/// the values the rewrite passes synthesize (integers and simple fractions).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == value.trunc() && value.abs() < 1e21 {
        return format!("{}", value as i128);
    }
    format!("{value}")
}
