//! Indentation-aware output buffer.

pub struct SourceWriter {
    output: String,
    indent_level: u32,
    indent_width: u32,
    /// Nothing written on the current line yet; indentation is pending.
    at_line_start: bool,
}

impl SourceWriter {
    pub fn new(indent_width: u32) -> SourceWriter {
        SourceWriter {
            output: String::new(),
            indent_level: 0,
            indent_width,
            at_line_start: true,
        }
    }

    fn flush_indent(&mut self) {
        if self.at_line_start {
            let width = (self.indent_level * self.indent_width) as usize;
            self.output.extend(std::iter::repeat_n(' ', width));
            self.at_line_start = false;
        }
    }

    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.flush_indent();
        self.output.push_str(text);
    }

    pub fn write_char(&mut self, ch: char) {
        self.flush_indent();
        self.output.push(ch);
    }

    pub fn write_space(&mut self) {
        self.write_char(' ');
    }

    /// Start a new line. Consecutive calls do not produce blank lines.
    pub fn write_line(&mut self) {
        if !self.at_line_start {
            self.output.push('\n');
            self.at_line_start = true;
        }
    }

    pub fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn decrease_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Current indentation as spaces.
    pub fn indent_string(&self) -> String {
        " ".repeat((self.indent_level * self.indent_width) as usize)
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn is_at_line_start(&self) -> bool {
        self.at_line_start
    }

    pub fn get_output(&self) -> &str {
        &self.output
    }

    pub fn take_output(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_is_applied_lazily() {
        let mut writer = SourceWriter::new(2);
        writer.write("{");
        writer.write_line();
        writer.increase_indent();
        writer.write("a;");
        writer.write_line();
        writer.write_line();
        writer.decrease_indent();
        writer.write("}");
        assert_eq!(writer.get_output(), "{\n  a;\n}");
    }
}
