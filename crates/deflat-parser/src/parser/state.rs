//! Parser state - token handling, diagnostics and entry points.

use super::base::NodeIndex;
use super::node::NodeArena;
use deflat_common::limits::MAX_PARSER_DEPTH;
use deflat_scanner::{ScannerState, SyntaxKind, token_to_string};

/// Disallow `in` as a binary operator (inside a `for` initializer).
pub(crate) const CONTEXT_FLAG_DISALLOW_IN: u32 = 1 << 0;
/// Inside a function body (`return` allowed).
pub(crate) const CONTEXT_FLAG_IN_FUNCTION: u32 = 1 << 1;

pub(crate) const DIAG_EXPECTED: u32 = 1005;
pub(crate) const DIAG_EXPRESSION_EXPECTED: u32 = 1109;
pub(crate) const DIAG_DECLARATION_OR_STATEMENT_EXPECTED: u32 = 1128;
pub(crate) const DIAG_RETURN_OUTSIDE_FUNCTION: u32 = 1108;
pub(crate) const DIAG_NESTING_TOO_DEEP: u32 = 1200;

/// A syntax error found while parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: String,
    pub code: u32,
}

pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub arena: NodeArena,
    pub(crate) file_name: String,
    pub parse_diagnostics: Vec<ParseDiagnostic>,
    pub(crate) current_token: SyntaxKind,
    pub(crate) context_flags: u32,
    pub(crate) depth: u32,
    /// End of the most recently consumed token.
    pub(crate) last_token_end: u32,
}

impl ParserState {
    pub fn new(file_name: String, source: String) -> ParserState {
        ParserState {
            scanner: ScannerState::new(source, true),
            arena: NodeArena::new(),
            file_name,
            parse_diagnostics: Vec::new(),
            current_token: SyntaxKind::Unknown,
            context_flags: 0,
            depth: 0,
            last_token_end: 0,
        }
    }

    pub fn get_arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn into_arena(self) -> NodeArena {
        self.arena
    }

    pub fn get_diagnostics(&self) -> &[ParseDiagnostic] {
        &self.parse_diagnostics
    }

    /// Parse `source` into a fresh arena. Returns the arena, the root
    /// `SOURCE_FILE` node and any syntax errors.
    pub fn parse(file_name: &str, source: &str) -> (NodeArena, NodeIndex, Vec<ParseDiagnostic>) {
        let mut parser = ParserState::new(file_name.to_string(), source.to_string());
        let root = parser.parse_source_file();
        let diagnostics = std::mem::take(&mut parser.parse_diagnostics);
        (parser.arena, root, diagnostics)
    }

    // =========================================================================
    // Token Helpers
    // =========================================================================

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current_token
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.current_token == kind
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.scanner.get_token_start() as u32
    }

    #[inline]
    pub(crate) fn token_end(&self) -> u32 {
        self.scanner.get_token_end() as u32
    }

    pub(crate) fn token_value(&self) -> String {
        self.scanner.get_token_value().to_string()
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        self.last_token_end = self.token_end();
        self.current_token = self.scanner.scan();
        self.current_token
    }

    /// Consume `kind` if present, otherwise report `'x' expected.`
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            return true;
        }
        self.parse_error_at_current_token(&format!("'{}' expected.", token_to_string(kind)), DIAG_EXPECTED);
        false
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Run `f` speculatively and rewind the scanner afterwards.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut ParserState) -> T) -> T {
        let snapshot = self.scanner.save_state();
        let token = self.current_token;
        let last_end = self.last_token_end;
        let result = f(self);
        self.scanner.restore_state(snapshot);
        self.current_token = token;
        self.last_token_end = last_end;
        result
    }

    pub(crate) fn next_token_is(&mut self, kind: SyntaxKind) -> bool {
        self.look_ahead(|p| p.next_token() == kind)
    }

    // =========================================================================
    // Automatic Semicolon Insertion
    // =========================================================================

    pub(crate) fn can_parse_semicolon(&self) -> bool {
        self.is_token(SyntaxKind::SemicolonToken)
            || self.is_token(SyntaxKind::CloseBraceToken)
            || self.is_token(SyntaxKind::EndOfFileToken)
            || self.scanner.has_preceding_line_break()
    }

    pub(crate) fn parse_semicolon(&mut self) -> bool {
        if self.parse_optional(SyntaxKind::SemicolonToken) {
            return true;
        }
        if self.can_parse_semicolon() {
            return true;
        }
        self.parse_expected(SyntaxKind::SemicolonToken)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn parse_error_at(&mut self, start: u32, length: u32, message: &str, code: u32) {
        // Report at most one error per position to avoid cascades.
        if self.parse_diagnostics.last().is_some_and(|d| d.start == start) {
            return;
        }
        tracing::debug!(start, code, message, "parse error");
        self.parse_diagnostics.push(ParseDiagnostic {
            start,
            length,
            message: message.to_string(),
            code,
        });
    }

    pub(crate) fn parse_error_at_current_token(&mut self, message: &str, code: u32) {
        let start = self.token_pos();
        let length = self.token_end().saturating_sub(start);
        self.parse_error_at(start, length, message, code);
    }

    // =========================================================================
    // Context
    // =========================================================================

    #[inline]
    pub(crate) fn in_context(&self, flag: u32) -> bool {
        self.context_flags & flag != 0
    }

    /// Run `f` with `flags` set (or cleared) and restore the previous context.
    pub(crate) fn with_context<T>(
        &mut self,
        set: u32,
        clear: u32,
        f: impl FnOnce(&mut ParserState) -> T,
    ) -> T {
        let saved = self.context_flags;
        self.context_flags = (self.context_flags | set) & !clear;
        let result = f(self);
        self.context_flags = saved;
        result
    }

    /// Enter one level of statement/expression nesting. Returns false (and
    /// reports an error once) past `MAX_PARSER_DEPTH`.
    pub(crate) fn enter_nesting(&mut self) -> bool {
        if self.depth >= MAX_PARSER_DEPTH {
            self.parse_error_at_current_token("Nesting too deep.", DIAG_NESTING_TOO_DEEP);
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
