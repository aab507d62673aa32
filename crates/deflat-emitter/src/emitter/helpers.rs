use super::Printer;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeIndex, NodeList};

impl<'a> Printer<'a> {
    // =========================================================================
    // Output Helpers (delegate to SourceWriter)
    // =========================================================================

    pub(super) fn write(&mut self, text: &str) {
        self.writer.write(text);
    }

    pub(super) fn write_line(&mut self) {
        self.writer.write_line();
    }

    pub(super) fn write_space(&mut self) {
        self.writer.write_space();
    }

    pub(super) fn increase_indent(&mut self) {
        self.writer.increase_indent();
    }

    pub(super) fn decrease_indent(&mut self) {
        self.writer.decrease_indent();
    }

    // =========================================================================
    // Identifier Helpers
    // =========================================================================

    pub(super) fn write_identifier_text(&mut self, idx: NodeIndex) {
        if let Some(text) = self.arena.get_identifier_text(idx) {
            self.write(text);
        }
    }

    /// Emit `items` separated by `", "`.
    pub(super) fn emit_comma_list(&mut self, items: &NodeList, emit_item: fn(&mut Self, NodeIndex)) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            emit_item(self, item);
        }
    }

    /// Statements of a block, each on its own line, with leading comments.
    pub(super) fn emit_statement_lines(&mut self, statements: &NodeList) {
        for &statement in statements.iter() {
            self.emit_leading_comments(statement);
            self.emit(statement);
            self.write_line();
        }
    }

    /// Body of an `if`/loop: blocks stay on the header line, other statements
    /// go on the next line, indented.
    pub(super) fn emit_embedded_statement(&mut self, idx: NodeIndex) {
        if self.arena.is_kind(idx, syntax_kind_ext::BLOCK) {
            self.write_space();
            self.emit(idx);
        } else if idx.is_none() || self.arena.is_kind(idx, syntax_kind_ext::EMPTY_STATEMENT) {
            self.write(";");
        } else {
            self.write_line();
            self.increase_indent();
            self.emit(idx);
            self.decrease_indent();
        }
    }
}
