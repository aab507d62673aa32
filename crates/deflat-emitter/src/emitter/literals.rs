use super::Printer;
use deflat_parser::parser::format_number;
use deflat_parser::parser::node::Node;
use std::fmt::Write as _;

impl<'a> Printer<'a> {
    // =========================================================================
    // Literals
    // =========================================================================

    pub(super) fn emit_numeric_literal(&mut self, node: &Node) {
        let Some(lit) = self.arena.get_literal(node) else {
            return;
        };
        if lit.text.is_empty() {
            let text = format_number(lit.value.unwrap_or(f64::NAN));
            self.write(&text);
        } else {
            self.write(&lit.text);
        }
    }

    pub(super) fn emit_regex_literal(&mut self, node: &Node) {
        if let Some(lit) = self.arena.get_literal(node) {
            self.write(&lit.text);
        }
    }

    /// String literals are always re-quoted with double quotes.
    pub(super) fn emit_string_literal(&mut self, node: &Node) {
        let Some(lit) = self.arena.get_literal(node) else {
            return;
        };
        let quoted = quote_string(&lit.text, self.options.minimal_escape);
        self.write(&quoted);
    }
}

/// Quote `value` as a double-quoted JavaScript string literal.
///
/// With `minimal_escape`, only characters that cannot appear raw inside the
/// literal are escaped; otherwise every non-ASCII character is written as a
/// `\uXXXX` escape (surrogate pairs for astral characters).
pub(crate) fn quote_string(value: &str, minimal_escape: bool) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c if !minimal_escape && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
