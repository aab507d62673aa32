//! Binder state: scopes, symbols and the node-to-symbol map.

use crate::scopes::{ContainerKind, Scope, ScopeId};
use crate::symbols::{Symbol, SymbolArena, SymbolId};
use deflat_parser::{NodeArena, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span};

pub struct BinderState {
    pub symbols: SymbolArena,
    /// Persistent scopes; `scopes[0]` is the source file scope once bound.
    pub scopes: Vec<Scope>,
    /// Scope-creating node to its scope
    pub node_scope_ids: FxHashMap<u32, ScopeId>,
    /// Declaration and reference identifiers to their symbol
    pub node_symbols: FxHashMap<u32, SymbolId>,
    /// References that resolved to no declaration (globals), in source order.
    pub unresolved: Vec<NodeIndex>,
    pub(crate) current_scope_id: ScopeId,
}

impl Default for BinderState {
    fn default() -> Self {
        Self::new()
    }
}

impl BinderState {
    pub fn new() -> BinderState {
        BinderState {
            symbols: SymbolArena::new(),
            scopes: Vec::new(),
            node_scope_ids: FxHashMap::default(),
            node_symbols: FxHashMap::default(),
            unresolved: Vec::new(),
            current_scope_id: ScopeId::NONE,
        }
    }

    /// Bind a whole source file into a fresh binder.
    pub fn bind(arena: &NodeArena, root: NodeIndex) -> BinderState {
        let mut binder = BinderState::new();
        binder.bind_source_file(arena, root);
        binder
    }

    /// Declare every binding under `root`, then resolve every reference.
    pub fn bind_source_file(&mut self, arena: &NodeArena, root: NodeIndex) {
        let _span = debug_span!("bind_source_file", root = root.0).entered();

        self.enter_scope(ContainerKind::SourceFile, root);
        if let Some(statements) = arena.get_statements(root) {
            for &statement in statements.iter() {
                self.bind_node(arena, statement);
            }
        }
        self.exit_scope();

        self.resolve_references(arena, root);

        debug!(
            symbols = self.symbols.len(),
            scopes = self.scopes.len(),
            unresolved = self.unresolved.len(),
            "bound source file"
        );
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[inline]
    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Symbol an identifier declares or refers to.
    #[inline]
    pub fn resolve_identifier(&self, node: NodeIndex) -> Option<SymbolId> {
        self.node_symbols.get(&node.0).copied()
    }

    /// Symbol of an identifier, or `None` for globals and non-identifiers.
    pub fn symbol_of(&self, node: NodeIndex) -> Option<&Symbol> {
        self.resolve_identifier(node).and_then(|id| self.symbols.get(id))
    }

    /// Whether the binding an identifier declares or refers to is never
    /// reassigned. Unresolved names are never constant.
    pub fn is_constant(&self, node: NodeIndex) -> bool {
        self.symbol_of(node).is_some_and(|symbol| symbol.constant)
    }

    /// Innermost scope whose container is `node` or one of its ancestors.
    pub fn find_enclosing_scope(&self, arena: &NodeArena, node: NodeIndex) -> Option<ScopeId> {
        let mut current = node;
        while current.is_some() {
            if let Some(&scope_id) = self.node_scope_ids.get(&current.0) {
                return Some(scope_id);
            }
            current = arena.get_parent(current);
        }
        None
    }

    /// Resolve `name` as if it were referenced at `node`.
    pub fn lookup_name_at(&self, arena: &NodeArena, node: NodeIndex, name: &str) -> Option<SymbolId> {
        let scope_id = self.find_enclosing_scope(arena, node)?;
        self.lookup_in_chain(scope_id, name)
    }

    pub(crate) fn lookup_in_chain(&self, mut scope_id: ScopeId, name: &str) -> Option<SymbolId> {
        while scope_id.is_some() {
            let scope = self.scopes.get(scope_id.0 as usize)?;
            if let Some(symbol) = scope.table.get(name) {
                return Some(symbol);
            }
            scope_id = scope.parent;
        }
        None
    }

    // =========================================================================
    // Scope Management
    // =========================================================================

    pub(crate) fn enter_scope(&mut self, kind: ContainerKind, node: NodeIndex) {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(self.current_scope_id, kind, node));
        self.node_scope_ids.insert(node.0, id);
        self.current_scope_id = id;
    }

    pub(crate) fn exit_scope(&mut self) {
        if let Some(scope) = self.scopes.get(self.current_scope_id.0 as usize) {
            self.current_scope_id = scope.parent;
        }
    }

    /// Nearest function or source-file scope, where `var` hoists to.
    pub(crate) fn hoisting_scope(&self) -> ScopeId {
        let mut scope_id = self.current_scope_id;
        while let Some(scope) = self.scopes.get(scope_id.0 as usize) {
            if scope.is_function_scope() {
                return scope_id;
            }
            scope_id = scope.parent;
        }
        self.current_scope_id
    }

    /// Declare `name` in `scope_id` for the identifier `declaration`.
    /// A second declaration of the same name in the same scope joins the
    /// existing symbol and makes it non-constant.
    pub(crate) fn declare_symbol(
        &mut self,
        scope_id: ScopeId,
        name: &str,
        flags: u32,
        declaration: NodeIndex,
    ) -> SymbolId {
        let existing = self
            .scopes
            .get(scope_id.0 as usize)
            .and_then(|scope| scope.table.get(name));

        let id = match existing {
            Some(id) => {
                if let Some(symbol) = self.symbols.get_mut(id) {
                    symbol.flags |= flags;
                    symbol.constant = false;
                    symbol.declarations.push(declaration);
                }
                debug!(name, "redeclared binding");
                id
            }
            None => {
                let id = self.symbols.alloc(name.to_string(), flags, scope_id);
                if let Some(symbol) = self.symbols.get_mut(id) {
                    symbol.declarations.push(declaration);
                }
                if let Some(scope) = self.scopes.get_mut(scope_id.0 as usize) {
                    scope.table.set(name.to_string(), id);
                }
                id
            }
        };
        self.node_symbols.insert(declaration.0, id);
        id
    }
}
