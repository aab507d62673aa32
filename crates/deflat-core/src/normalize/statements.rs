//! Statement-level rules: block bodies, sequence splitting, IIFE inlining
//! and block flattening.

use super::Normalizer;
use deflat_common::diagnostics::diagnostic_messages;
use deflat_parser::NodeIndex;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::parser::NodeFlags;
use deflat_scanner::SyntaxKind;

impl<'a> Normalizer<'a> {
    // =========================================================================
    // IfBody
    // =========================================================================

    /// Wrap non-block `if`/`else` branches and loop bodies in blocks.
    pub(super) fn if_body(&mut self, idx: NodeIndex) -> bool {
        let Some(node) = self.arena.get(idx) else {
            return false;
        };
        let bodies: Vec<NodeIndex> = match node.kind {
            syntax_kind_ext::IF_STATEMENT => match self.arena.get_if_statement(node) {
                Some(stmt) => vec![stmt.then_statement, stmt.else_statement],
                None => return false,
            },
            syntax_kind_ext::FOR_STATEMENT
            | syntax_kind_ext::WHILE_STATEMENT
            | syntax_kind_ext::DO_STATEMENT => match self.arena.get_loop(node) {
                Some(data) => vec![data.statement],
                None => return false,
            },
            syntax_kind_ext::FOR_IN_STATEMENT => match self.arena.get_for_in(node) {
                Some(data) => vec![data.statement],
                None => return false,
            },
            _ => return false,
        };
        let mut changed = false;
        for body in bodies {
            if body.is_none() || self.arena.is_kind(body, syntax_kind_ext::BLOCK) {
                continue;
            }
            let block = if self.arena.is_kind(body, syntax_kind_ext::EMPTY_STATEMENT) {
                self.arena.create_block(Vec::new())
            } else {
                self.arena.create_block(vec![body])
            };
            changed |= self.arena.replace_child(idx, body, block);
        }
        changed
    }

    // =========================================================================
    // IfTestSequence / ReturnSequence
    // =========================================================================

    /// `if ((a, b, c))` in a statement list becomes `a, b; if (c)`.
    pub(super) fn if_test_sequence(&mut self, idx: NodeIndex) -> bool {
        let Some(test) = self
            .arena
            .get(idx)
            .filter(|node| node.kind == syntax_kind_ext::IF_STATEMENT)
            .and_then(|node| self.arena.get_if_statement(node))
            .map(|stmt| stmt.expression)
        else {
            return false;
        };
        self.hoist_leading_sequence(idx, test)
    }

    /// `return a, b;` in a statement list becomes `a; return b;`.
    pub(super) fn return_sequence(&mut self, idx: NodeIndex) -> bool {
        let Some(argument) = self
            .arena
            .get(idx)
            .filter(|node| node.kind == syntax_kind_ext::RETURN_STATEMENT)
            .and_then(|node| self.arena.get_return_statement(node))
            .map(|ret| ret.expression)
        else {
            return false;
        };
        self.hoist_leading_sequence(idx, argument)
    }

    /// Move all but the last element of the sequence `expr` (a child of
    /// `statement`) into an expression statement before `statement`.
    fn hoist_leading_sequence(&mut self, statement: NodeIndex, expr: NodeIndex) -> bool {
        if !self.arena.is_kind(expr, syntax_kind_ext::SEQUENCE_EXPRESSION)
            || self.arena.statement_position(statement).is_none()
        {
            return false;
        }
        let Some(mut elements) = self
            .arena
            .get(expr)
            .and_then(|node| self.arena.get_literal_expr(node))
            .map(|seq| seq.elements.nodes.clone())
        else {
            return false;
        };
        let Some(last) = elements.pop() else {
            return false;
        };
        let leading = match elements.len() {
            0 => return self.arena.replace_child(statement, expr, last),
            1 => elements[0],
            _ => self.arena.create_sequence(elements),
        };
        let before = self.arena.create_expression_statement(leading);
        self.arena.insert_statements_before(statement, vec![before]);
        self.arena.replace_child(statement, expr, last)
    }

    // =========================================================================
    // SwitchCase
    // =========================================================================

    /// Every case clause holds exactly one block.
    pub(super) fn switch_case(&mut self, idx: NodeIndex) -> bool {
        if !matches!(
            self.arena.kind(idx),
            Some(syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE)
        ) {
            return false;
        }
        let Some(statements) = self.arena.get_statements(idx).map(|list| list.nodes.clone()) else {
            return false;
        };
        if let [only] = statements.as_slice()
            && self.arena.is_kind(*only, syntax_kind_ext::BLOCK)
        {
            return false;
        }
        let block = self.arena.create_block(statements);
        self.arena.set_statements(idx, vec![block])
    }

    // =========================================================================
    // Sequence
    // =========================================================================

    /// A sequence used as a statement becomes a block of statements.
    pub(super) fn sequence(&mut self, idx: NodeIndex) -> bool {
        if !self.arena.is_kind(idx, syntax_kind_ext::SEQUENCE_EXPRESSION) {
            return false;
        }
        let statement = self.arena.get_parent(idx);
        if !self.arena.is_kind(statement, syntax_kind_ext::EXPRESSION_STATEMENT) {
            return false;
        }
        self.sequence_statement_to_block(idx, statement)
    }

    // =========================================================================
    // InlineIife
    // =========================================================================

    /// `!function () { ... }();` inside a function becomes its body block.
    pub(super) fn inline_iife(&mut self, idx: NodeIndex) -> bool {
        let Some(body) = self.inlinable_iife_body(idx) else {
            return false;
        };
        if let Some(reason) = self.iife_blocker(body) {
            self.ctx.report_once(
                self.arena,
                &diagnostic_messages::INLINE_SKIPPED,
                idx,
                &[reason],
            );
            return false;
        }
        self.arena.replace_node(idx, body)
    }

    /// Body of `!function () {...}();` used as a statement in a statement
    /// list inside a function, with no name, parameters or arguments.
    fn inlinable_iife_body(&self, statement: NodeIndex) -> Option<NodeIndex> {
        let arena = &*self.arena;
        let node = arena.get(statement)?;
        if node.kind != syntax_kind_ext::EXPRESSION_STATEMENT {
            return None;
        }
        arena.statement_position(statement)?;
        arena.enclosing_function(statement)?;
        let not = arena.get_expression_statement(node)?.expression;
        let unary = arena.get_unary_expr(arena.get(not)?)?;
        if unary.operator != SyntaxKind::ExclamationToken {
            return None;
        }
        let call_node = arena.get(unary.operand)?;
        if call_node.kind != syntax_kind_ext::CALL_EXPRESSION {
            return None;
        }
        let call = arena.get_call_expr(call_node)?;
        if !call.arguments.is_empty() {
            return None;
        }
        let func_node = arena.get(call.expression)?;
        if func_node.kind != syntax_kind_ext::FUNCTION_EXPRESSION {
            return None;
        }
        let func = arena.get_function(func_node)?;
        if func.name.is_some() || !func.parameters.is_empty() {
            return None;
        }
        Some(func.body)
    }

    /// Why the body cannot run in the enclosing function's frame.
    fn iife_blocker(&self, body: NodeIndex) -> Option<&'static str> {
        let arena = &*self.arena;
        let mut stack: Vec<NodeIndex> = arena.children(body).into_vec();
        while let Some(idx) = stack.pop() {
            let Some(node) = arena.get(idx) else {
                continue;
            };
            match node.kind {
                syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => continue,
                syntax_kind_ext::RETURN_STATEMENT => return Some("body returns"),
                k if k == SyntaxKind::ThisKeyword as u16 => return Some("body uses 'this'"),
                _ if arena.is_identifier_named(idx, "arguments") => {
                    return Some("body uses 'arguments'");
                }
                _ => stack.extend(arena.children(idx)),
            }
        }
        None
    }

    // =========================================================================
    // FlattenBlock
    // =========================================================================

    /// Splice blocks nested directly in a block or the source file into the
    /// parent list. Blocks declaring `let`/`const` keep their scope.
    pub(super) fn flatten_block(&mut self, idx: NodeIndex) -> bool {
        if !matches!(
            self.arena.kind(idx),
            Some(syntax_kind_ext::BLOCK | syntax_kind_ext::SOURCE_FILE)
        ) {
            return false;
        }
        let Some(statements) = self.arena.get_statements(idx).map(|list| list.nodes.clone()) else {
            return false;
        };
        let mut flattened = Vec::with_capacity(statements.len());
        let mut changed = false;
        for statement in statements {
            if self.arena.is_kind(statement, syntax_kind_ext::BLOCK) && !self.declares_block_scoped(statement) {
                if let Some(inner) = self.arena.get_statements(statement) {
                    flattened.extend(inner.iter().copied());
                }
                changed = true;
            } else {
                flattened.push(statement);
            }
        }
        if !changed {
            return false;
        }
        self.arena.set_statements(idx, flattened)
    }

    fn declares_block_scoped(&self, block: NodeIndex) -> bool {
        self.arena.get_statements(block).is_some_and(|list| {
            list.iter().any(|&statement| {
                self.arena.is_kind(statement, syntax_kind_ext::VARIABLE_STATEMENT)
                    && self.arena.flags(statement).intersects(NodeFlags::BLOCK_SCOPED)
            })
        })
    }
}
