//! Comment ranges.
//!
//! Comments are not part of the AST. The scanner records their positions
//! while tokenizing and the printer re-attaches them to the statements that
//! follow them when comments are not suppressed.

use serde::{Deserialize, Serialize};

/// A range representing a comment in the source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    /// Start position (byte offset)
    pub pos: u32,
    /// End position (byte offset)
    pub end: u32,
    /// Whether this is a multi-line comment
    pub is_multi_line: bool,
    /// Whether this comment has a trailing newline
    pub has_trailing_new_line: bool,
}

impl CommentRange {
    pub fn new(pos: u32, end: u32, is_multi_line: bool, has_trailing_new_line: bool) -> Self {
        CommentRange {
            pos,
            end,
            is_multi_line,
            has_trailing_new_line,
        }
    }

    /// Get the comment text from source.
    pub fn get_text<'a>(&self, source: &'a str) -> &'a str {
        let start = self.pos as usize;
        let end = self.end as usize;
        if end <= source.len() && start < end {
            &source[start..end]
        } else {
            ""
        }
    }
}

/// Comments that end at or before `pos` and start at or after `after`.
///
/// `comments` must be sorted by position (the scanner records them in order).
pub fn comments_between(comments: &[CommentRange], after: u32, pos: u32) -> &[CommentRange] {
    let first = comments.partition_point(|c| c.pos < after);
    let last = comments.partition_point(|c| c.end <= pos);
    if first >= last {
        &[]
    } else {
        &comments[first..last]
    }
}

/// Re-indent the continuation lines of a multi-line comment.
pub fn format_multi_line_comment(text: &str, indent: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 1 {
        return text.to_string();
    }

    let mut result = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            result.push('\n');
            if !line.trim().is_empty() {
                result.push_str(indent);
                result.push_str(line.trim_start());
                continue;
            }
        }
        result.push_str(line);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_between_selects_window() {
        let comments = vec![
            CommentRange::new(0, 5, false, true),
            CommentRange::new(10, 20, true, false),
            CommentRange::new(30, 35, false, true),
        ];
        let window = comments_between(&comments, 6, 25);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].pos, 10);
        assert!(comments_between(&comments, 21, 29).is_empty());
    }

    #[test]
    fn multi_line_comment_is_reindented() {
        let text = "/*\n      * a\n      */";
        assert_eq!(format_multi_line_comment(text, "    "), "/*\n    * a\n    */");
    }
}
