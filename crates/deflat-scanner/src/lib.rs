//! JavaScript scanner/tokenizer for the deflat deobfuscator.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine

pub mod syntax_kind;
pub use syntax_kind::{SyntaxKind, text_to_keyword, token_to_string};

pub mod scanner_impl;
pub use scanner_impl::{ScannerDiagnostic, ScannerSnapshot, ScannerState, parse_numeric_text};
