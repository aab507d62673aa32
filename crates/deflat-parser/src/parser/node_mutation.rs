//! NodeArena mutation helpers used by the rewrite passes.
//!
//! Nodes are never freed: a replaced or removed subtree simply becomes
//! unreachable from the root. Every helper here keeps the child slot in the
//! parent's data and the child's `parent` link consistent, and clears the
//! link of a child it removes, so a node is attached exactly when its parent
//! chain reaches the root.

use super::base::{NodeIndex, NodeList};
use super::flags::NodeFlags;
use super::node::*;
use super::syntax_kind_ext;
use deflat_scanner::SyntaxKind;
use rustc_hash::FxHashMap;

impl NodeArena {
    /// Visit every child slot of `index` mutably (absent slots included).
    fn for_each_slot_mut(&mut self, index: NodeIndex, mut f: impl FnMut(&mut NodeIndex)) {
        let Some(node) = self.get(index).copied() else {
            return;
        };
        let data = node.data_index as usize;
        let list = |list: &mut NodeList, f: &mut dyn FnMut(&mut NodeIndex)| {
            list.nodes.iter_mut().for_each(|slot| f(slot));
        };
        match node.kind {
            syntax_kind_ext::SOURCE_FILE => {
                if let Some(d) = self.source_files.get_mut(data) {
                    list(&mut d.statements, &mut f);
                }
            }
            syntax_kind_ext::BLOCK => {
                if let Some(d) = self.blocks.get_mut(data) {
                    list(&mut d.statements, &mut f);
                }
            }
            syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => {
                if let Some(d) = self.case_clauses.get_mut(data) {
                    f(&mut d.expression);
                    list(&mut d.statements, &mut f);
                }
            }
            syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST => {
                if let Some(d) = self.variables.get_mut(data) {
                    list(&mut d.declarations, &mut f);
                }
            }
            syntax_kind_ext::VARIABLE_DECLARATION => {
                if let Some(d) = self.variable_declarations.get_mut(data) {
                    f(&mut d.name);
                    f(&mut d.initializer);
                }
            }
            syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => {
                if let Some(d) = self.functions.get_mut(data) {
                    f(&mut d.name);
                    list(&mut d.parameters, &mut f);
                    f(&mut d.body);
                }
            }
            syntax_kind_ext::EXPRESSION_STATEMENT => {
                if let Some(d) = self.expr_statements.get_mut(data) {
                    f(&mut d.expression);
                }
            }
            syntax_kind_ext::IF_STATEMENT => {
                if let Some(d) = self.if_statements.get_mut(data) {
                    f(&mut d.expression);
                    f(&mut d.then_statement);
                    f(&mut d.else_statement);
                }
            }
            syntax_kind_ext::FOR_STATEMENT
            | syntax_kind_ext::WHILE_STATEMENT
            | syntax_kind_ext::DO_STATEMENT => {
                if let Some(d) = self.loops.get_mut(data) {
                    f(&mut d.initializer);
                    f(&mut d.condition);
                    f(&mut d.incrementor);
                    f(&mut d.statement);
                }
            }
            syntax_kind_ext::FOR_IN_STATEMENT => {
                if let Some(d) = self.for_in_data.get_mut(data) {
                    f(&mut d.initializer);
                    f(&mut d.expression);
                    f(&mut d.statement);
                }
            }
            syntax_kind_ext::SWITCH_STATEMENT => {
                if let Some(d) = self.switch_data.get_mut(data) {
                    f(&mut d.expression);
                    list(&mut d.clauses, &mut f);
                }
            }
            syntax_kind_ext::RETURN_STATEMENT | syntax_kind_ext::THROW_STATEMENT => {
                if let Some(d) = self.return_data.get_mut(data) {
                    f(&mut d.expression);
                }
            }
            syntax_kind_ext::BREAK_STATEMENT | syntax_kind_ext::CONTINUE_STATEMENT => {
                if let Some(d) = self.jump_data.get_mut(data) {
                    f(&mut d.label);
                }
            }
            syntax_kind_ext::LABELED_STATEMENT => {
                if let Some(d) = self.labeled_data.get_mut(data) {
                    f(&mut d.label);
                    f(&mut d.statement);
                }
            }
            syntax_kind_ext::TRY_STATEMENT => {
                if let Some(d) = self.try_data.get_mut(data) {
                    f(&mut d.try_block);
                    f(&mut d.catch_clause);
                    f(&mut d.finally_block);
                }
            }
            syntax_kind_ext::CATCH_CLAUSE => {
                if let Some(d) = self.catch_clauses.get_mut(data) {
                    f(&mut d.variable_declaration);
                    f(&mut d.block);
                }
            }
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => {
                if let Some(d) = self.unary_exprs.get_mut(data) {
                    f(&mut d.operand);
                }
            }
            syntax_kind_ext::BINARY_EXPRESSION => {
                if let Some(d) = self.binary_exprs.get_mut(data) {
                    f(&mut d.left);
                    f(&mut d.right);
                }
            }
            syntax_kind_ext::CONDITIONAL_EXPRESSION => {
                if let Some(d) = self.conditional_exprs.get_mut(data) {
                    f(&mut d.condition);
                    f(&mut d.when_true);
                    f(&mut d.when_false);
                }
            }
            syntax_kind_ext::SEQUENCE_EXPRESSION
            | syntax_kind_ext::ARRAY_LITERAL_EXPRESSION
            | syntax_kind_ext::OBJECT_LITERAL_EXPRESSION => {
                if let Some(d) = self.literal_exprs.get_mut(data) {
                    list(&mut d.elements, &mut f);
                }
            }
            syntax_kind_ext::CALL_EXPRESSION | syntax_kind_ext::NEW_EXPRESSION => {
                if let Some(d) = self.call_exprs.get_mut(data) {
                    f(&mut d.expression);
                    list(&mut d.arguments, &mut f);
                }
            }
            syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
            | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => {
                if let Some(d) = self.access_exprs.get_mut(data) {
                    f(&mut d.expression);
                    f(&mut d.name_or_argument);
                }
            }
            syntax_kind_ext::PROPERTY_ASSIGNMENT => {
                if let Some(d) = self.property_assignments.get_mut(data) {
                    f(&mut d.name);
                    f(&mut d.initializer);
                }
            }
            _ => {}
        }
    }

    /// Clear the parent link of each removed child that still points at
    /// `parent`. A child already re-parented elsewhere keeps its new link.
    fn detach_removed(&mut self, removed: &[NodeIndex], parent: NodeIndex) {
        for &child in removed {
            if self.get_parent(child) == parent {
                self.set_parent(child, NodeIndex::NONE);
            }
        }
    }

    // =========================================================================
    // Slot Replacement
    // =========================================================================

    /// Replace the child slot of `parent` holding `old` with `new`.
    ///
    /// `new` may be `NONE` for optional slots (else branch, initializer).
    /// Returns false when `old` is not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeIndex, old: NodeIndex, new: NodeIndex) -> bool {
        let mut found = false;
        self.for_each_slot_mut(parent, |slot| {
            if !found && *slot == old {
                *slot = new;
                found = true;
            }
        });
        if found {
            if self.get_parent(old) == parent {
                self.set_parent(old, NodeIndex::NONE);
            }
            self.set_parent(new, parent);
        }
        found
    }

    /// Put `new` where `old` currently sits in its parent.
    ///
    /// When `new` wraps `old`, capture the parent first and call
    /// `replace_child` instead: building the wrapper re-parents `old`.
    pub fn replace_node(&mut self, old: NodeIndex, new: NodeIndex) -> bool {
        let parent = self.get_parent(old);
        if parent.is_none() {
            return false;
        }
        self.replace_child(parent, old, new)
    }

    // =========================================================================
    // Statement Lists
    // =========================================================================

    fn statements_mut(&mut self, container: NodeIndex) -> Option<&mut NodeList> {
        let node = self.get(container).copied()?;
        let data = node.data_index as usize;
        match node.kind {
            syntax_kind_ext::SOURCE_FILE => self.source_files.get_mut(data).map(|d| &mut d.statements),
            syntax_kind_ext::BLOCK => self.blocks.get_mut(data).map(|d| &mut d.statements),
            syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => {
                self.case_clauses.get_mut(data).map(|d| &mut d.statements)
            }
            _ => None,
        }
    }

    /// Replace the whole statement list of a block-like container.
    pub fn set_statements(&mut self, container: NodeIndex, statements: Vec<NodeIndex>) -> bool {
        let Some(list) = self.statements_mut(container) else {
            return false;
        };
        let removed = std::mem::replace(&mut list.nodes, statements);
        let list = list.clone();
        self.detach_removed(&removed, container);
        self.set_parent_list(&list, container);
        true
    }

    /// Remove `remove` statements at `index` and insert `insert` in their place.
    pub fn splice_statements(
        &mut self,
        container: NodeIndex,
        index: usize,
        remove: usize,
        insert: Vec<NodeIndex>,
    ) -> bool {
        let Some(list) = self.statements_mut(container) else {
            return false;
        };
        if index > list.nodes.len() {
            return false;
        }
        let end = (index + remove).min(list.nodes.len());
        let removed: Vec<NodeIndex> = list.nodes.splice(index..end, insert.iter().copied()).collect();
        self.detach_removed(&removed, container);
        let inserted = NodeList::with_nodes(insert);
        self.set_parent_list(&inserted, container);
        true
    }

    /// Replace one statement by a sequence of statements in its parent list.
    pub fn replace_statement_with(&mut self, statement: NodeIndex, replacement: Vec<NodeIndex>) -> bool {
        let Some((container, index)) = self.statement_position(statement) else {
            return false;
        };
        self.splice_statements(container, index, 1, replacement)
    }

    /// Insert statements immediately before `statement` in its parent list.
    pub fn insert_statements_before(&mut self, statement: NodeIndex, insert: Vec<NodeIndex>) -> bool {
        let Some((container, index)) = self.statement_position(statement) else {
            return false;
        };
        self.splice_statements(container, index, 0, insert)
    }

    /// Replace the declarator list of a variable statement or declaration list.
    pub fn set_declarations(&mut self, index: NodeIndex, declarations: Vec<NodeIndex>) -> bool {
        let Some(node) = self.get(index).copied() else {
            return false;
        };
        if !matches!(
            node.kind,
            syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST
        ) {
            return false;
        }
        let Some(data) = self.variables.get_mut(node.data_index as usize) else {
            return false;
        };
        let removed = std::mem::replace(&mut data.declarations, NodeList::with_nodes(declarations));
        let list = data.declarations.clone();
        self.detach_removed(&removed.nodes, index);
        self.set_parent_list(&list, index);
        true
    }

    // =========================================================================
    // Field Updates
    // =========================================================================

    pub fn set_binary_operator(&mut self, index: NodeIndex, operator: SyntaxKind) -> bool {
        let Some(node) = self.get(index).copied() else {
            return false;
        };
        if node.kind != syntax_kind_ext::BINARY_EXPRESSION {
            return false;
        }
        match self.binary_exprs.get_mut(node.data_index as usize) {
            Some(data) => {
                data.operator_token = operator;
                true
            }
            None => false,
        }
    }

    /// Swap the operands of a binary expression.
    pub fn swap_binary_operands(&mut self, index: NodeIndex) -> bool {
        let Some(node) = self.get(index).copied() else {
            return false;
        };
        if node.kind != syntax_kind_ext::BINARY_EXPRESSION {
            return false;
        }
        match self.binary_exprs.get_mut(node.data_index as usize) {
            Some(data) => {
                std::mem::swap(&mut data.left, &mut data.right);
                true
            }
            None => false,
        }
    }

    /// Set (or clear, with `NONE`) the else branch of an if statement.
    pub fn set_else_statement(&mut self, index: NodeIndex, else_statement: NodeIndex) -> bool {
        let Some(node) = self.get(index).copied() else {
            return false;
        };
        if node.kind != syntax_kind_ext::IF_STATEMENT {
            return false;
        }
        let Some(data) = self.if_statements.get_mut(node.data_index as usize) else {
            return false;
        };
        let removed = std::mem::replace(&mut data.else_statement, else_statement);
        self.detach_removed(&[removed], index);
        self.set_parent(else_statement, index);
        true
    }

    pub fn set_identifier_text(&mut self, index: NodeIndex, text: &str) -> bool {
        let Some(node) = self.get(index).copied() else {
            return false;
        };
        if node.kind != SyntaxKind::Identifier as u16 {
            return false;
        }
        match self.identifiers.get_mut(node.data_index as usize) {
            Some(data) => {
                data.escaped_text = text.to_string();
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Cloning
    // =========================================================================

    /// Copy the header and data of one node; children still point at the
    /// original subtree.
    fn clone_node_shallow(&mut self, index: NodeIndex) -> NodeIndex {
        let Some(node) = self.get(index).copied() else {
            return NodeIndex::NONE;
        };
        let data = node.data_index as usize;

        macro_rules! clone_into {
            ($pool:ident) => {{
                match self.$pool.get(data).cloned() {
                    Some(copy) => {
                        self.$pool.push(copy);
                        (self.$pool.len() - 1) as u32
                    }
                    None => Node::NO_DATA,
                }
            }};
        }

        let data_index = if !node.has_data() {
            Node::NO_DATA
        } else {
            match node.kind {
                k if k == SyntaxKind::Identifier as u16 => clone_into!(identifiers),
                k if k == SyntaxKind::NumericLiteral as u16
                    || k == SyntaxKind::StringLiteral as u16
                    || k == SyntaxKind::RegularExpressionLiteral as u16 =>
                {
                    clone_into!(literals)
                }
                syntax_kind_ext::SOURCE_FILE => clone_into!(source_files),
                syntax_kind_ext::BLOCK => clone_into!(blocks),
                syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => clone_into!(case_clauses),
                syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST => {
                    clone_into!(variables)
                }
                syntax_kind_ext::VARIABLE_DECLARATION => clone_into!(variable_declarations),
                syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => {
                    clone_into!(functions)
                }
                syntax_kind_ext::EXPRESSION_STATEMENT => clone_into!(expr_statements),
                syntax_kind_ext::IF_STATEMENT => clone_into!(if_statements),
                syntax_kind_ext::FOR_STATEMENT
                | syntax_kind_ext::WHILE_STATEMENT
                | syntax_kind_ext::DO_STATEMENT => clone_into!(loops),
                syntax_kind_ext::FOR_IN_STATEMENT => clone_into!(for_in_data),
                syntax_kind_ext::SWITCH_STATEMENT => clone_into!(switch_data),
                syntax_kind_ext::RETURN_STATEMENT | syntax_kind_ext::THROW_STATEMENT => {
                    clone_into!(return_data)
                }
                syntax_kind_ext::BREAK_STATEMENT | syntax_kind_ext::CONTINUE_STATEMENT => {
                    clone_into!(jump_data)
                }
                syntax_kind_ext::LABELED_STATEMENT => clone_into!(labeled_data),
                syntax_kind_ext::TRY_STATEMENT => clone_into!(try_data),
                syntax_kind_ext::CATCH_CLAUSE => clone_into!(catch_clauses),
                syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => {
                    clone_into!(unary_exprs)
                }
                syntax_kind_ext::BINARY_EXPRESSION => clone_into!(binary_exprs),
                syntax_kind_ext::CONDITIONAL_EXPRESSION => clone_into!(conditional_exprs),
                syntax_kind_ext::SEQUENCE_EXPRESSION
                | syntax_kind_ext::ARRAY_LITERAL_EXPRESSION
                | syntax_kind_ext::OBJECT_LITERAL_EXPRESSION => clone_into!(literal_exprs),
                syntax_kind_ext::CALL_EXPRESSION | syntax_kind_ext::NEW_EXPRESSION => clone_into!(call_exprs),
                syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION
                | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => clone_into!(access_exprs),
                syntax_kind_ext::PROPERTY_ASSIGNMENT => clone_into!(property_assignments),
                _ => Node::NO_DATA,
            }
        };

        let copy = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            flags: node.flags | NodeFlags::SYNTHESIZED.bits(),
            data_index,
            ..node
        });
        self.extended_info.push(ExtendedNodeInfo::default());
        copy
    }

    /// Deep copy of a subtree. The copy is detached (no parent).
    pub fn clone_subtree(&mut self, index: NodeIndex) -> NodeIndex {
        if index.is_none() {
            return NodeIndex::NONE;
        }
        let children = self.children(index);
        let mut mapping: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
        for child in children {
            let copy = self.clone_subtree(child);
            mapping.insert(child, copy);
        }
        let copy = self.clone_node_shallow(index);
        self.for_each_slot_mut(copy, |slot| {
            if let Some(&mapped) = mapping.get(slot) {
                *slot = mapped;
            }
        });
        for child in self.children(copy) {
            self.set_parent(child, copy);
        }
        copy
    }

    /// Deep copy of each statement in `statements`.
    pub fn clone_statements(&mut self, statements: &[NodeIndex]) -> Vec<NodeIndex> {
        statements.iter().map(|&s| self.clone_subtree(s)).collect()
    }
}
