use colored::Colorize;
use deflat_common::{Diagnostic, DiagnosticCategory};
use serde::Serialize;

/// Renders advisory diagnostics against the input text.
pub struct Reporter<'a> {
    color: bool,
    file_name: &'a str,
    line_starts: Vec<u32>,
}

/// A diagnostic with its resolved one-based position, as written in JSON mode.
#[derive(Serialize)]
struct LocatedDiagnostic<'d> {
    file: &'d str,
    line: u32,
    column: u32,
    #[serde(flatten)]
    diagnostic: &'d Diagnostic,
}

impl<'a> Reporter<'a> {
    pub fn new(file_name: &'a str, source: &str, color: bool) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset as u32 + 1);
            }
        }
        Reporter {
            color,
            file_name,
            line_starts,
        }
    }

    /// One-based line and column of a byte offset.
    pub fn position_for(&self, offset: u32) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&start| start <= offset).max(1) - 1;
        (line as u32 + 1, offset - self.line_starts[line] + 1)
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let (line, column) = self.position_for(diagnostic.start);
        let location = format!("{}:{}:{}", self.file_name, line, column);
        let location = if self.color {
            location.cyan().to_string()
        } else {
            location
        };
        let code = format!("DF{}", diagnostic.code);
        let code = if self.color { code.dimmed().to_string() } else { code };
        format!(
            "{} - {} {}: {}",
            location,
            self.format_category(diagnostic.category),
            code,
            diagnostic.message_text
        )
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion | DiagnosticCategory::Message => label.blue().to_string(),
        }
    }

    /// Newline-delimited JSON, one object per diagnostic.
    pub fn render_json(&self, diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
        let mut out = String::new();
        for diagnostic in diagnostics {
            let (line, column) = self.position_for(diagnostic.start);
            let located = LocatedDiagnostic {
                file: self.file_name,
                line,
                column,
                diagnostic,
            };
            out.push_str(&serde_json::to_string(&located)?);
            out.push('\n');
        }
        Ok(out)
    }
}
