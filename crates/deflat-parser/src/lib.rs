//! JavaScript parser and arena AST for the deflat deobfuscator.
//!
//! This crate provides:
//! - `NodeArena` - 16-byte node headers plus typed data pools, with parent links
//! - `ParserState` - recursive-descent parser producing a `NodeArena`
//! - mutation helpers used by the rewrite passes (slot replacement,
//!   statement-list splicing, deep cloning)

pub mod parser;

pub use parser::{NodeArena, NodeIndex, NodeList, ParseDiagnostic, ParserState};
