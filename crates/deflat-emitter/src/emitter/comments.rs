//! Leading comment emission.
//!
//! Comments are re-attached by position: before each statement that still
//! has a source position, every comment between the last emitted position
//! and the statement's start is written on its own line. Synthesized
//! statements (position 0) never pull comments.

use super::Printer;
use deflat_common::comments::{comments_between, format_multi_line_comment};
use deflat_parser::NodeIndex;

impl<'a> Printer<'a> {
    pub(super) fn emit_leading_comments(&mut self, statement: NodeIndex) {
        if self.options.remove_comments {
            return;
        }
        let Some(node) = self.arena.get(statement) else {
            return;
        };
        if node.pos == 0 && node.end == 0 {
            return;
        }
        self.emit_comments_up_to(node.pos);
    }

    /// Comments after the last statement of the file.
    pub(super) fn emit_remaining_comments(&mut self) {
        if self.options.remove_comments {
            return;
        }
        self.emit_comments_up_to(u32::MAX);
    }

    fn emit_comments_up_to(&mut self, pos: u32) {
        let Some(text) = self.source_text else {
            return;
        };
        if pos <= self.comment_pos {
            return;
        }
        let comments = comments_between(self.comments, self.comment_pos, pos);
        for comment in comments {
            let comment_text = comment.get_text(text);
            if comment.is_multi_line {
                let indent = self.writer.indent_string();
                let formatted = format_multi_line_comment(comment_text, &indent);
                self.write(&formatted);
            } else {
                self.write(comment_text.trim_end());
            }
            self.write_line();
        }
        self.comment_pos = pos;
    }
}
