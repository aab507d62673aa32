//! Symbols and symbol tables.

use crate::scopes::ScopeId;
use deflat_parser::NodeIndex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index into a `SymbolArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

pub mod symbol_flags {
    pub const NONE: u32 = 0;
    pub const FUNCTION_SCOPED_VARIABLE: u32 = 1 << 0;
    pub const BLOCK_SCOPED_VARIABLE: u32 = 1 << 1;
    pub const PARAMETER: u32 = 1 << 2;
    pub const FUNCTION: u32 = 1 << 3;
    pub const CATCH_VARIABLE: u32 = 1 << 4;

    pub const VARIABLE: u32 = FUNCTION_SCOPED_VARIABLE | BLOCK_SCOPED_VARIABLE;
}

/// A declared name.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub flags: u32,
    /// Scope the name is declared in.
    pub scope: ScopeId,
    /// Identifier nodes that declare the name (more than one on redeclaration).
    pub declarations: SmallVec<[NodeIndex; 1]>,
    /// Identifier nodes resolved to this symbol, in source order.
    pub references: Vec<NodeIndex>,
    /// Identifiers written after declaration (assignment targets, `++`/`--`
    /// operands, `for-in` heads).
    pub constant_violations: Vec<NodeIndex>,
    /// Never reassigned after its initialization.
    pub constant: bool,
}

impl Symbol {
    pub fn new(name: String, flags: u32, scope: ScopeId) -> Symbol {
        Symbol {
            name,
            flags,
            scope,
            declarations: SmallVec::new(),
            references: Vec::new(),
            constant_violations: Vec::new(),
            constant: true,
        }
    }

    #[inline]
    pub fn has_flags(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }
}

#[derive(Clone, Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> SymbolArena {
        SymbolArena::default()
    }

    pub fn alloc(&mut self, name: String, flags: u32, scope: ScopeId) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol::new(name, flags, scope));
        id
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (SymbolId(i as u32), symbol))
    }
}

/// Name to symbol map of one scope.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    table: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.table.get(name).copied()
    }

    pub fn set(&mut self, name: String, id: SymbolId) {
        self.table.insert(name, id);
    }

    pub fn has(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolId)> {
        self.table.iter()
    }
}
