//! Parser module: arena AST, node builders/accessors, and the parser itself.

pub mod base;
pub mod flags;
pub mod node;
mod node_access;
mod node_arena;
mod node_mutation;
pub mod operator_precedence;
mod state;
mod state_expressions;
mod state_statements;
pub mod syntax_kind_ext;

pub use base::{NodeIndex, NodeList};
pub use flags::NodeFlags;
pub use node::{Node, NodeArena};
pub use node_arena::format_number;
pub use node_access::NodeChildren;
pub use state::{ParseDiagnostic, ParserState};
