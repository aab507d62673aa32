//! Printer - emits JavaScript source from a `NodeArena`.

use crate::source_writer::SourceWriter;
use deflat_common::CommentRange;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::{SyntaxKind, token_to_string};
use serde::{Deserialize, Serialize};

mod comments;
mod expressions;
mod helpers;
mod literals;
mod statements;

/// Printer configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterOptions {
    /// Drop all source comments.
    pub remove_comments: bool,
    /// Escape only what a double-quoted string literal requires; otherwise
    /// escape every non-ASCII character too.
    pub minimal_escape: bool,
    /// Spaces per indentation level.
    pub indent_width: u32,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        PrinterOptions {
            remove_comments: true,
            minimal_escape: true,
            indent_width: 4,
        }
    }
}

pub struct Printer<'a> {
    pub(super) arena: &'a NodeArena,
    pub(super) options: PrinterOptions,
    pub(super) writer: SourceWriter,
    pub(super) source_text: Option<&'a str>,
    pub(super) comments: &'a [CommentRange],
    /// Comments before this position have been emitted (or skipped).
    pub(super) comment_pos: u32,
}

/// Print `root` with `options`.
pub fn print(arena: &NodeArena, root: NodeIndex, options: &PrinterOptions) -> String {
    let mut printer = Printer::new(arena, options.clone());
    printer.print_root(root);
    printer.take_output()
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a NodeArena, options: PrinterOptions) -> Printer<'a> {
        Printer {
            arena,
            writer: SourceWriter::new(options.indent_width),
            options,
            source_text: None,
            comments: &[],
            comment_pos: 0,
        }
    }

    /// Emit a source file (or any single node) and finish the last line.
    pub fn print_root(&mut self, root: NodeIndex) {
        let arena = self.arena;
        if let Some(file) = arena.get(root).and_then(|n| arena.get_source_file(n)) {
            self.source_text = Some(&file.text);
            self.comments = &file.comments;
        }
        self.emit(root);
        self.emit_remaining_comments();
        self.write_line();
    }

    pub fn get_output(&self) -> &str {
        self.writer.get_output()
    }

    pub fn take_output(self) -> String {
        self.writer.take_output()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub fn emit(&mut self, idx: NodeIndex) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        match node.kind {
            syntax_kind_ext::SOURCE_FILE => self.emit_source_file(node),
            syntax_kind_ext::BLOCK => self.emit_block(node),
            syntax_kind_ext::EMPTY_STATEMENT => self.write(";"),
            syntax_kind_ext::EXPRESSION_STATEMENT => self.emit_expression_statement(node),
            syntax_kind_ext::VARIABLE_STATEMENT => self.emit_variable_statement(node),
            syntax_kind_ext::VARIABLE_DECLARATION_LIST => self.emit_variable_declaration_list(node),
            syntax_kind_ext::VARIABLE_DECLARATION => self.emit_variable_declaration(node),
            syntax_kind_ext::FUNCTION_DECLARATION | syntax_kind_ext::FUNCTION_EXPRESSION => {
                self.emit_function(node)
            }
            syntax_kind_ext::IF_STATEMENT => self.emit_if_statement(node),
            syntax_kind_ext::FOR_STATEMENT => self.emit_for_statement(node),
            syntax_kind_ext::FOR_IN_STATEMENT => self.emit_for_in_statement(node),
            syntax_kind_ext::WHILE_STATEMENT => self.emit_while_statement(node),
            syntax_kind_ext::DO_STATEMENT => self.emit_do_statement(node),
            syntax_kind_ext::SWITCH_STATEMENT => self.emit_switch_statement(node),
            syntax_kind_ext::CASE_CLAUSE | syntax_kind_ext::DEFAULT_CLAUSE => self.emit_case_clause(node),
            syntax_kind_ext::BREAK_STATEMENT => self.emit_jump_statement(node, "break"),
            syntax_kind_ext::CONTINUE_STATEMENT => self.emit_jump_statement(node, "continue"),
            syntax_kind_ext::RETURN_STATEMENT => self.emit_return_statement(node, "return"),
            syntax_kind_ext::THROW_STATEMENT => self.emit_return_statement(node, "throw"),
            syntax_kind_ext::TRY_STATEMENT => self.emit_try_statement(node),
            syntax_kind_ext::CATCH_CLAUSE => self.emit_catch_clause(node),
            syntax_kind_ext::LABELED_STATEMENT => self.emit_labeled_statement(node),
            syntax_kind_ext::DEBUGGER_STATEMENT => self.write("debugger;"),
            _ => self.emit_expression(idx),
        }
    }
}

/// Source text of an operator token.
pub(super) fn get_operator_text(operator: SyntaxKind) -> &'static str {
    token_to_string(operator)
}
