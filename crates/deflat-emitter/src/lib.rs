//! Printer for the deflat deobfuscator.
//!
//! Turns a `NodeArena` tree back into JavaScript source. The parser drops
//! parentheses, so the printer re-derives them from operator precedence.

pub mod emitter;
pub use emitter::{Printer, PrinterOptions, print};

pub mod source_writer;
pub use source_writer::SourceWriter;
