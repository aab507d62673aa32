//! Common types and utilities for the deflat deobfuscator.
//!
//! This crate provides foundational types used across all deflat crates:
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, message templates)
//! - Pass limits and thresholds
//! - Comment ranges recorded by the scanner

// Advisory diagnostics emitted by the passes
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticMessage};

// Centralized limits and thresholds
pub mod limits;

// Comment ranges (recorded while scanning, consumed by the printer)
pub mod comments;
pub use comments::CommentRange;
