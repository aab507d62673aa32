//! Declaration walk and reference resolution.

use crate::scopes::ContainerKind;
use crate::state::BinderState;
use crate::symbols::symbol_flags;
use deflat_parser::parser::flags::NodeFlags;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;

impl BinderState {
    // =========================================================================
    // Declarations
    // =========================================================================

    pub(crate) fn bind_node(&mut self, arena: &NodeArena, idx: NodeIndex) {
        let Some(node) = arena.get(idx) else {
            return;
        };
        match node.kind {
            syntax_kind_ext::FUNCTION_DECLARATION => {
                let Some(func) = arena.get_function(node) else {
                    return;
                };
                if let Some(name) = arena.get_identifier_text(func.name) {
                    let scope = self.hoisting_scope();
                    self.declare_symbol(scope, name, symbol_flags::FUNCTION, func.name);
                }
                self.bind_function_body(arena, idx);
            }
            syntax_kind_ext::FUNCTION_EXPRESSION => {
                self.bind_function_body(arena, idx);
            }
            syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST => {
                self.bind_variable_declarations(arena, idx);
            }
            syntax_kind_ext::BLOCK => {
                self.enter_scope(ContainerKind::Block, idx);
                self.bind_children(arena, idx);
                self.exit_scope();
            }
            syntax_kind_ext::CATCH_CLAUSE => {
                let Some(clause) = arena.get_catch_clause(node) else {
                    return;
                };
                self.enter_scope(ContainerKind::Block, idx);
                if let Some(name) = arena.get_identifier_text(clause.variable_declaration) {
                    let scope = self.current_scope_id;
                    self.declare_symbol(
                        scope,
                        name,
                        symbol_flags::CATCH_VARIABLE,
                        clause.variable_declaration,
                    );
                }
                self.bind_node(arena, clause.block);
                self.exit_scope();
            }
            syntax_kind_ext::FOR_STATEMENT
            | syntax_kind_ext::FOR_IN_STATEMENT
            | syntax_kind_ext::SWITCH_STATEMENT => {
                self.enter_scope(ContainerKind::Block, idx);
                self.bind_children(arena, idx);
                self.exit_scope();
            }
            _ => self.bind_children(arena, idx),
        }
    }

    fn bind_children(&mut self, arena: &NodeArena, idx: NodeIndex) {
        for child in arena.children(idx) {
            self.bind_node(arena, child);
        }
    }

    /// Parameters and body of a function declaration or expression. A
    /// function expression's own name is visible only inside it.
    fn bind_function_body(&mut self, arena: &NodeArena, idx: NodeIndex) {
        let Some(func) = arena.get(idx).and_then(|node| arena.get_function(node)) else {
            return;
        };
        self.enter_scope(ContainerKind::Function, idx);
        let scope = self.current_scope_id;

        if arena.is_kind(idx, syntax_kind_ext::FUNCTION_EXPRESSION)
            && let Some(name) = arena.get_identifier_text(func.name)
        {
            self.declare_symbol(scope, name, symbol_flags::FUNCTION, func.name);
        }
        for &parameter in func.parameters.iter() {
            if let Some(name) = arena.get_identifier_text(parameter) {
                self.declare_symbol(scope, name, symbol_flags::PARAMETER, parameter);
            }
        }
        // The body block shares the function scope.
        if let Some(statements) = arena.get_statements(func.body) {
            for &statement in statements.iter() {
                self.bind_node(arena, statement);
            }
        }
        self.exit_scope();
    }

    fn bind_variable_declarations(&mut self, arena: &NodeArena, idx: NodeIndex) {
        let Some(node) = arena.get(idx) else {
            return;
        };
        let Some(list) = arena.get_variable(node) else {
            return;
        };
        let block_scoped = NodeFlags::from_bits_truncate(node.flags)
            .intersects(NodeFlags::LET | NodeFlags::CONST);
        let (scope, flags) = if block_scoped {
            (self.current_scope_id, symbol_flags::BLOCK_SCOPED_VARIABLE)
        } else {
            (self.hoisting_scope(), symbol_flags::FUNCTION_SCOPED_VARIABLE)
        };
        // `for (var k in o)` assigns `k` on every iteration.
        let reassigned_by_loop = arena.is_kind(arena.get_parent(idx), syntax_kind_ext::FOR_IN_STATEMENT);

        for &declaration in list.declarations.iter() {
            let Some(data) = arena
                .get(declaration)
                .and_then(|n| arena.get_variable_declaration(n))
            else {
                continue;
            };
            if let Some(name) = arena.get_identifier_text(data.name) {
                let id = self.declare_symbol(scope, name, flags, data.name);
                if reassigned_by_loop && let Some(symbol) = self.symbols.get_mut(id) {
                    symbol.constant = false;
                    symbol.constant_violations.push(data.name);
                }
            }
            if data.initializer.is_some() {
                self.bind_node(arena, data.initializer);
            }
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Resolve every identifier in reference position under `root`.
    pub(crate) fn resolve_references(&mut self, arena: &NodeArena, root: NodeIndex) {
        for idx in arena.descendants(root) {
            if !arena.is_kind(idx, SyntaxKind::Identifier as u16)
                || self.node_symbols.contains_key(&idx.0)
                || !is_reference_position(arena, idx)
            {
                continue;
            }
            let Some(name) = arena.get_identifier_text(idx) else {
                continue;
            };
            let resolved = self
                .find_enclosing_scope(arena, idx)
                .and_then(|scope| self.lookup_in_chain(scope, name));
            let Some(id) = resolved else {
                self.unresolved.push(idx);
                continue;
            };
            self.node_symbols.insert(idx.0, id);
            let write = is_write_position(arena, idx);
            if let Some(symbol) = self.symbols.get_mut(id) {
                symbol.references.push(idx);
                if write {
                    symbol.constant = false;
                    symbol.constant_violations.push(idx);
                }
            }
        }
    }
}

/// Identifiers that name a property or a label are not variable references.
pub fn is_reference_position(arena: &NodeArena, idx: NodeIndex) -> bool {
    let parent = arena.get_parent(idx);
    let Some(parent_node) = arena.get(parent) else {
        return true;
    };
    match parent_node.kind {
        syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION => arena
            .get_access_expr(parent_node)
            .is_none_or(|access| access.name_or_argument != idx),
        syntax_kind_ext::PROPERTY_ASSIGNMENT => arena
            .get_property_assignment(parent_node)
            .is_none_or(|property| property.name != idx),
        syntax_kind_ext::LABELED_STATEMENT
        | syntax_kind_ext::BREAK_STATEMENT
        | syntax_kind_ext::CONTINUE_STATEMENT => false,
        _ => true,
    }
}

/// Assignment targets, `++`/`--` operands and `for (x in o)` heads.
pub fn is_write_position(arena: &NodeArena, idx: NodeIndex) -> bool {
    let parent = arena.get_parent(idx);
    let Some(parent_node) = arena.get(parent) else {
        return false;
    };
    match parent_node.kind {
        syntax_kind_ext::BINARY_EXPRESSION => arena
            .get_binary_expr(parent_node)
            .is_some_and(|bin| bin.left == idx && bin.operator_token.is_assignment_operator()),
        syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => arena
            .get_unary_expr(parent_node)
            .is_some_and(|unary| {
                matches!(unary.operator, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken)
            }),
        syntax_kind_ext::FOR_IN_STATEMENT => arena
            .get_for_in(parent_node)
            .is_some_and(|for_in| for_in.initializer == idx),
        _ => false,
    }
}
