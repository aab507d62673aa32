//! Binder for the deflat deobfuscator.
//!
//! Builds persistent scopes over a parsed `NodeArena`, declares a symbol for
//! every binding (functions, parameters, variables, catch parameters),
//! resolves identifier references against the scope chain and records which
//! bindings are never reassigned.
//!
//! Binding is a snapshot: the rewrite passes mutate the arena, so callers
//! re-bind before any pass that needs fresh answers.

pub mod scopes;
pub use scopes::{ContainerKind, Scope, ScopeId};

pub mod symbols;
pub use symbols::{Symbol, SymbolArena, SymbolId, SymbolTable, symbol_flags};

mod state;
mod state_node_binding;
pub use state_node_binding::{is_reference_position, is_write_position};
pub use state::BinderState;
