//! Persistent scopes, one per scope-creating node.

use crate::symbols::SymbolTable;
use deflat_parser::NodeIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// What kind of node opened a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    SourceFile,
    /// Function declaration or expression: owns `var`s, parameters and
    /// nested function declarations.
    Function,
    /// Block, `for` head, `switch` body or catch clause: owns `let`/`const`
    /// and the catch parameter.
    Block,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub parent: ScopeId,
    pub kind: ContainerKind,
    pub container_node: NodeIndex,
    pub table: SymbolTable,
}

impl Scope {
    pub fn new(parent: ScopeId, kind: ContainerKind, container_node: NodeIndex) -> Scope {
        Scope {
            parent,
            kind,
            container_node,
            table: SymbolTable::new(),
        }
    }

    /// Function and source-file scopes receive hoisted `var` and function
    /// declarations.
    #[inline]
    pub fn is_function_scope(&self) -> bool {
        matches!(self.kind, ContainerKind::SourceFile | ContainerKind::Function)
    }
}
