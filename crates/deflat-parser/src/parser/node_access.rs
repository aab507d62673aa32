//! NodeArena accessor methods (get_* methods) and child enumeration.

use super::base::{NodeIndex, NodeList};
use super::flags::NodeFlags;
use super::node::*;
use super::syntax_kind_ext;
use deflat_scanner::SyntaxKind;
use smallvec::SmallVec;

/// Direct children of a node, in source order.
pub type NodeChildren = SmallVec<[NodeIndex; 4]>;

impl NodeArena {
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<u16> {
        self.get(index).map(|node| node.kind)
    }

    #[inline]
    pub fn is_kind(&self, index: NodeIndex, kind: u16) -> bool {
        self.kind(index) == Some(kind)
    }

    #[inline]
    pub fn get_parent(&self, index: NodeIndex) -> NodeIndex {
        if index.is_none() {
            return NodeIndex::NONE;
        }
        self.extended_info
            .get(index.0 as usize)
            .map(|info| info.parent)
            .unwrap_or(NodeIndex::NONE)
    }

    pub fn flags(&self, index: NodeIndex) -> NodeFlags {
        self.get(index)
            .map(|node| NodeFlags::from_bits_truncate(node.flags))
            .unwrap_or_default()
    }

    pub fn is_synthesized(&self, index: NodeIndex) -> bool {
        self.flags(index).contains(NodeFlags::SYNTHESIZED)
    }

    // =========================================================================
    // Typed Data Access
    // =========================================================================

    #[inline]
    pub fn get_identifier(&self, node: &Node) -> Option<&IdentifierData> {
        if node.kind == SyntaxKind::Identifier as u16 && node.has_data() {
            self.identifiers.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_literal(&self, node: &Node) -> Option<&LiteralData> {
        let is_literal = node.kind == SyntaxKind::NumericLiteral as u16
            || node.kind == SyntaxKind::StringLiteral as u16
            || node.kind == SyntaxKind::RegularExpressionLiteral as u16;
        if is_literal && node.has_data() {
            self.literals.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_binary_expr(&self, node: &Node) -> Option<&BinaryExprData> {
        if node.kind == syntax_kind_ext::BINARY_EXPRESSION {
            self.binary_exprs.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_unary_expr(&self, node: &Node) -> Option<&UnaryExprData> {
        if node.kind == syntax_kind_ext::PREFIX_UNARY_EXPRESSION
            || node.kind == syntax_kind_ext::POSTFIX_UNARY_EXPRESSION
        {
            self.unary_exprs.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_conditional_expr(&self, node: &Node) -> Option<&ConditionalExprData> {
        if node.kind == syntax_kind_ext::CONDITIONAL_EXPRESSION {
            self.conditional_exprs.get(node.data_index as usize)
        } else {
            None
        }
    }

    /// Array literal, object literal or sequence elements
    #[inline]
    pub fn get_literal_expr(&self, node: &Node) -> Option<&LiteralExprData> {
        match node.kind {
            syntax_kind_ext::ARRAY_LITERAL_EXPRESSION
            | syntax_kind_ext::OBJECT_LITERAL_EXPRESSION
            | syntax_kind_ext::SEQUENCE_EXPRESSION => self.literal_exprs.get(node.data_index as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn get_call_expr(&self, node: &Node) -> Option<&CallExprData> {
        match node.kind {
            syntax_kind_ext::CALL_EXPRESSION | syntax_kind_ext::NEW_EXPRESSION => {
                self.call_exprs.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_access_expr(&self, node: &Node) -> Option<&AccessExprData> {
        match node.kind {
            syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => {
                self.access_exprs.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_property_assignment(&self, node: &Node) -> Option<&PropertyAssignmentData> {
        if node.kind == syntax_kind_ext::PROPERTY_ASSIGNMENT {
            self.property_assignments.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_function(&self, node: &Node) -> Option<&FunctionData> {
        match node.kind {
            syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => {
                self.functions.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_block(&self, node: &Node) -> Option<&BlockData> {
        if node.kind == syntax_kind_ext::BLOCK {
            self.blocks.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_expression_statement(&self, node: &Node) -> Option<&ExprStatementData> {
        if node.kind == syntax_kind_ext::EXPRESSION_STATEMENT {
            self.expr_statements.get(node.data_index as usize)
        } else {
            None
        }
    }

    /// Variable statement or declaration list
    #[inline]
    pub fn get_variable(&self, node: &Node) -> Option<&VariableData> {
        match node.kind {
            syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST => {
                self.variables.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_variable_declaration(&self, node: &Node) -> Option<&VariableDeclarationData> {
        if node.kind == syntax_kind_ext::VARIABLE_DECLARATION {
            self.variable_declarations.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_if_statement(&self, node: &Node) -> Option<&IfStatementData> {
        if node.kind == syntax_kind_ext::IF_STATEMENT {
            self.if_statements.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_loop(&self, node: &Node) -> Option<&LoopData> {
        match node.kind {
            syntax_kind_ext::FOR_STATEMENT
            | syntax_kind_ext::WHILE_STATEMENT
            | syntax_kind_ext::DO_STATEMENT => self.loops.get(node.data_index as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn get_for_in(&self, node: &Node) -> Option<&ForInData> {
        if node.kind == syntax_kind_ext::FOR_IN_STATEMENT {
            self.for_in_data.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_switch(&self, node: &Node) -> Option<&SwitchData> {
        if node.kind == syntax_kind_ext::SWITCH_STATEMENT {
            self.switch_data.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_case_clause(&self, node: &Node) -> Option<&CaseClauseData> {
        match node.kind {
            syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => {
                self.case_clauses.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    /// `return` or `throw`
    #[inline]
    pub fn get_return_statement(&self, node: &Node) -> Option<&ReturnData> {
        match node.kind {
            syntax_kind_ext::RETURN_STATEMENT | syntax_kind_ext::THROW_STATEMENT => {
                self.return_data.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    /// `break` or `continue`
    #[inline]
    pub fn get_jump_data(&self, node: &Node) -> Option<&JumpData> {
        match node.kind {
            syntax_kind_ext::BREAK_STATEMENT | syntax_kind_ext::CONTINUE_STATEMENT => {
                self.jump_data.get(node.data_index as usize)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_labeled_statement(&self, node: &Node) -> Option<&LabeledData> {
        if node.kind == syntax_kind_ext::LABELED_STATEMENT {
            self.labeled_data.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_try(&self, node: &Node) -> Option<&TryData> {
        if node.kind == syntax_kind_ext::TRY_STATEMENT {
            self.try_data.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_catch_clause(&self, node: &Node) -> Option<&CatchClauseData> {
        if node.kind == syntax_kind_ext::CATCH_CLAUSE {
            self.catch_clauses.get(node.data_index as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get_source_file(&self, node: &Node) -> Option<&SourceFileData> {
        if node.kind == syntax_kind_ext::SOURCE_FILE {
            self.source_files.get(node.data_index as usize)
        } else {
            None
        }
    }

    // =========================================================================
    // Convenience Helpers
    // =========================================================================

    /// Text of an identifier node.
    pub fn get_identifier_text(&self, index: NodeIndex) -> Option<&str> {
        let node = self.get(index)?;
        self.get_identifier(node).map(|data| data.escaped_text.as_str())
    }

    pub fn is_identifier_named(&self, index: NodeIndex, name: &str) -> bool {
        self.get_identifier_text(index) == Some(name)
    }

    /// Numeric value of a numeric literal node.
    pub fn get_numeric_value(&self, index: NodeIndex) -> Option<f64> {
        let node = self.get(index)?;
        if node.kind != SyntaxKind::NumericLiteral as u16 {
            return None;
        }
        self.get_literal(node).and_then(|data| data.value)
    }

    /// Statement list of a block-like container (source file, block, case clause).
    pub fn get_statements(&self, index: NodeIndex) -> Option<&NodeList> {
        let node = self.get(index)?;
        match node.kind {
            syntax_kind_ext::SOURCE_FILE => self.get_source_file(node).map(|d| &d.statements),
            syntax_kind_ext::BLOCK => self.get_block(node).map(|d| &d.statements),
            syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => {
                self.get_case_clause(node).map(|d| &d.statements)
            }
            _ => None,
        }
    }

    pub fn is_statement_list_container(&self, index: NodeIndex) -> bool {
        matches!(
            self.kind(index),
            Some(
                syntax_kind_ext::SOURCE_FILE
                    | syntax_kind_ext::BLOCK
                    | syntax_kind_ext::CASE_CLAUSE
                    | syntax_kind_ext::DEFAULT_CLAUSE
            )
        )
    }

    pub fn is_function_like(&self, index: NodeIndex) -> bool {
        matches!(
            self.kind(index),
            Some(syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION)
        )
    }

    pub fn is_loop(&self, index: NodeIndex) -> bool {
        matches!(
            self.kind(index),
            Some(
                syntax_kind_ext::FOR_STATEMENT
                    | syntax_kind_ext::FOR_IN_STATEMENT
                    | syntax_kind_ext::WHILE_STATEMENT
                    | syntax_kind_ext::DO_STATEMENT
            )
        )
    }

    /// Position of `child` in its parent's statement list.
    pub fn statement_position(&self, child: NodeIndex) -> Option<(NodeIndex, usize)> {
        let parent = self.get_parent(child);
        let statements = self.get_statements(parent)?;
        statements
            .iter()
            .position(|&s| s == child)
            .map(|index| (parent, index))
    }

    /// Direct children of `index`, in source order. Absent slots are skipped.
    pub fn children(&self, index: NodeIndex) -> NodeChildren {
        let mut out = NodeChildren::new();
        let Some(node) = self.get(index) else {
            return out;
        };
        let mut push = |child: NodeIndex| {
            if child.is_some() {
                out.push(child);
            }
        };
        match node.kind {
            syntax_kind_ext::SOURCE_FILE
            | syntax_kind_ext::BLOCK => {
                if let Some(list) = self.get_statements(index) {
                    list.iter().for_each(|&c| push(c));
                }
            }
            syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => {
                if let Some(data) = self.get_case_clause(node) {
                    push(data.expression);
                    data.statements.iter().for_each(|&c| push(c));
                }
            }
            syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST => {
                if let Some(data) = self.get_variable(node) {
                    data.declarations.iter().for_each(|&c| push(c));
                }
            }
            syntax_kind_ext::VARIABLE_DECLARATION => {
                if let Some(data) = self.get_variable_declaration(node) {
                    push(data.name);
                    push(data.initializer);
                }
            }
            syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => {
                if let Some(data) = self.get_function(node) {
                    push(data.name);
                    data.parameters.iter().for_each(|&c| push(c));
                    push(data.body);
                }
            }
            syntax_kind_ext::EXPRESSION_STATEMENT => {
                if let Some(data) = self.get_expression_statement(node) {
                    push(data.expression);
                }
            }
            syntax_kind_ext::IF_STATEMENT => {
                if let Some(data) = self.get_if_statement(node) {
                    push(data.expression);
                    push(data.then_statement);
                    push(data.else_statement);
                }
            }
            syntax_kind_ext::FOR_STATEMENT => {
                if let Some(data) = self.get_loop(node) {
                    push(data.initializer);
                    push(data.condition);
                    push(data.incrementor);
                    push(data.statement);
                }
            }
            syntax_kind_ext::WHILE_STATEMENT => {
                if let Some(data) = self.get_loop(node) {
                    push(data.condition);
                    push(data.statement);
                }
            }
            syntax_kind_ext::DO_STATEMENT => {
                if let Some(data) = self.get_loop(node) {
                    push(data.statement);
                    push(data.condition);
                }
            }
            syntax_kind_ext::FOR_IN_STATEMENT => {
                if let Some(data) = self.get_for_in(node) {
                    push(data.initializer);
                    push(data.expression);
                    push(data.statement);
                }
            }
            syntax_kind_ext::SWITCH_STATEMENT => {
                if let Some(data) = self.get_switch(node) {
                    push(data.expression);
                    data.clauses.iter().for_each(|&c| push(c));
                }
            }
            syntax_kind_ext::RETURN_STATEMENT | syntax_kind_ext::THROW_STATEMENT => {
                if let Some(data) = self.get_return_statement(node) {
                    push(data.expression);
                }
            }
            syntax_kind_ext::BREAK_STATEMENT | syntax_kind_ext::CONTINUE_STATEMENT => {
                if let Some(data) = self.get_jump_data(node) {
                    push(data.label);
                }
            }
            syntax_kind_ext::LABELED_STATEMENT => {
                if let Some(data) = self.get_labeled_statement(node) {
                    push(data.label);
                    push(data.statement);
                }
            }
            syntax_kind_ext::TRY_STATEMENT => {
                if let Some(data) = self.get_try(node) {
                    push(data.try_block);
                    push(data.catch_clause);
                    push(data.finally_block);
                }
            }
            syntax_kind_ext::CATCH_CLAUSE => {
                if let Some(data) = self.get_catch_clause(node) {
                    push(data.variable_declaration);
                    push(data.block);
                }
            }
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => {
                if let Some(data) = self.get_unary_expr(node) {
                    push(data.operand);
                }
            }
            syntax_kind_ext::BINARY_EXPRESSION => {
                if let Some(data) = self.get_binary_expr(node) {
                    push(data.left);
                    push(data.right);
                }
            }
            syntax_kind_ext::CONDITIONAL_EXPRESSION => {
                if let Some(data) = self.get_conditional_expr(node) {
                    push(data.condition);
                    push(data.when_true);
                    push(data.when_false);
                }
            }
            syntax_kind_ext::SEQUENCE_EXPRESSION
            | syntax_kind_ext::ARRAY_LITERAL_EXPRESSION
            | syntax_kind_ext::OBJECT_LITERAL_EXPRESSION => {
                if let Some(data) = self.get_literal_expr(node) {
                    data.elements.iter().for_each(|&c| push(c));
                }
            }
            syntax_kind_ext::CALL_EXPRESSION | syntax_kind_ext::NEW_EXPRESSION => {
                if let Some(data) = self.get_call_expr(node) {
                    push(data.expression);
                    data.arguments.iter().for_each(|&c| push(c));
                }
            }
            syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
            | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => {
                if let Some(data) = self.get_access_expr(node) {
                    push(data.expression);
                    push(data.name_or_argument);
                }
            }
            syntax_kind_ext::PROPERTY_ASSIGNMENT => {
                if let Some(data) = self.get_property_assignment(node) {
                    push(data.name);
                    push(data.initializer);
                }
            }
            _ => {}
        }
        out
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        let mut current = node;
        while current.is_some() {
            if current == ancestor {
                return true;
            }
            current = self.get_parent(current);
        }
        false
    }

    /// Nearest enclosing function declaration or expression.
    pub fn enclosing_function(&self, node: NodeIndex) -> Option<NodeIndex> {
        let mut current = self.get_parent(node);
        while current.is_some() {
            if self.is_function_like(current) {
                return Some(current);
            }
            current = self.get_parent(current);
        }
        None
    }

    /// All descendants of `root` (root included) in pre-order.
    pub fn descendants(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.is_none() {
                continue;
            }
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }
}
