//! Scanner state machine.
//!
//! Positions are byte offsets into the source text. Trivia (whitespace,
//! line breaks, comments) is skipped; comments are recorded as
//! `CommentRange`s and line breaks set `has_preceding_line_break` for ASI.

use crate::syntax_kind::{SyntaxKind, text_to_keyword};
use deflat_common::CommentRange;

/// A lexical error (unterminated literal, stray character).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub pos: usize,
    pub length: usize,
    pub message: &'static str,
    pub code: u32,
}

/// Saved scanner position for look-ahead.
#[derive(Clone, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    full_start: usize,
    token_value: String,
    preceding_line_break: bool,
    comment_count: usize,
    diagnostic_count: usize,
}

pub struct ScannerState {
    text: String,
    skip_trivia: bool,
    pos: usize,
    full_start: usize,
    token_start: usize,
    token: SyntaxKind,
    token_value: String,
    preceding_line_break: bool,
    comments: Vec<CommentRange>,
    diagnostics: Vec<ScannerDiagnostic>,
}

const UNTERMINATED_STRING: u32 = 1002;
const UNTERMINATED_COMMENT: u32 = 1010;
const INVALID_CHARACTER: u32 = 1127;
const UNTERMINATED_REGEX: u32 = 1161;

impl ScannerState {
    pub fn new(text: String, skip_trivia: bool) -> ScannerState {
        ScannerState {
            text,
            skip_trivia,
            pos: 0,
            full_start: 0,
            token_start: 0,
            token: SyntaxKind::Unknown,
            token_value: String::new(),
            preceding_line_break: false,
            comments: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn source_text(&self) -> &str {
        &self.text
    }

    pub fn get_token(&self) -> SyntaxKind {
        self.token
    }

    /// Start of the current token, excluding leading trivia.
    pub fn get_token_start(&self) -> usize {
        self.token_start
    }

    /// Start of the current token, including leading trivia.
    pub fn get_token_full_start(&self) -> usize {
        self.full_start
    }

    pub fn get_token_end(&self) -> usize {
        self.pos
    }

    /// Identifier text, decoded string value, or raw numeric/regex text.
    pub fn get_token_value(&self) -> &str {
        &self.token_value
    }

    /// Raw source slice of the current token.
    pub fn get_token_text(&self) -> &str {
        &self.text[self.token_start..self.pos]
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.preceding_line_break
    }

    pub fn get_comment_ranges(&self) -> &[CommentRange] {
        &self.comments
    }

    pub fn take_comment_ranges(&mut self) -> Vec<CommentRange> {
        std::mem::take(&mut self.comments)
    }

    pub fn get_scanner_diagnostics(&self) -> &[ScannerDiagnostic] {
        &self.diagnostics
    }

    pub fn save_state(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            full_start: self.full_start,
            token_value: self.token_value.clone(),
            preceding_line_break: self.preceding_line_break,
            comment_count: self.comments.len(),
            diagnostic_count: self.diagnostics.len(),
        }
    }

    pub fn restore_state(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.token = snapshot.token;
        self.token_start = snapshot.token_start;
        self.full_start = snapshot.full_start;
        self.token_value = snapshot.token_value;
        self.preceding_line_break = snapshot.preceding_line_break;
        self.comments.truncate(snapshot.comment_count);
        self.diagnostics.truncate(snapshot.diagnostic_count);
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.text.as_bytes().get(pos).copied()
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.text.get(pos..).and_then(|rest| rest.chars().next())
    }

    fn error(&mut self, pos: usize, length: usize, message: &'static str, code: u32) {
        self.diagnostics.push(ScannerDiagnostic {
            pos,
            length,
            message,
            code,
        });
    }

    /// Advance to the next token.
    pub fn scan(&mut self) -> SyntaxKind {
        self.full_start = self.pos;
        self.preceding_line_break = false;
        self.token_value.clear();

        loop {
            self.token_start = self.pos;
            let Some(ch) = self.byte_at(self.pos) else {
                self.token = SyntaxKind::EndOfFileToken;
                return self.token;
            };

            match ch {
                b'\n' | b'\r' => {
                    self.preceding_line_break = true;
                    self.pos += 1;
                    if !self.skip_trivia {
                        self.token = SyntaxKind::NewLineTrivia;
                        return self.token;
                    }
                }
                b' ' | b'\t' | 0x0b | 0x0c => {
                    while matches!(self.byte_at(self.pos), Some(b' ' | b'\t' | 0x0b | 0x0c)) {
                        self.pos += 1;
                    }
                    if !self.skip_trivia {
                        self.token = SyntaxKind::WhitespaceTrivia;
                        return self.token;
                    }
                }
                b'/' if self.byte_at(self.pos + 1) == Some(b'/') => {
                    let rest = &self.text.as_bytes()[self.pos..];
                    let len = memchr::memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
                    let start = self.pos;
                    self.pos += len;
                    let has_trailing_new_line = self.pos < self.text.len();
                    self.comments.push(CommentRange::new(
                        start as u32,
                        self.pos as u32,
                        false,
                        has_trailing_new_line,
                    ));
                    if !self.skip_trivia {
                        self.token = SyntaxKind::SingleLineCommentTrivia;
                        return self.token;
                    }
                }
                b'/' if self.byte_at(self.pos + 1) == Some(b'*') => {
                    let start = self.pos;
                    let body = &self.text.as_bytes()[self.pos + 2..];
                    let end = match memchr::memmem::find(body, b"*/") {
                        Some(offset) => self.pos + 2 + offset + 2,
                        None => {
                            self.error(start, 2, "'*/' expected.", UNTERMINATED_COMMENT);
                            self.text.len()
                        }
                    };
                    if memchr::memchr2(b'\n', b'\r', &self.text.as_bytes()[start..end]).is_some() {
                        self.preceding_line_break = true;
                    }
                    self.pos = end;
                    let has_trailing_new_line =
                        matches!(self.byte_at(self.pos), Some(b'\n' | b'\r'));
                    self.comments.push(CommentRange::new(
                        start as u32,
                        end as u32,
                        true,
                        has_trailing_new_line,
                    ));
                    if !self.skip_trivia {
                        self.token = SyntaxKind::MultiLineCommentTrivia;
                        return self.token;
                    }
                }
                _ => {
                    if ch >= 0x80 {
                        if let Some(c) = self.char_at(self.pos) {
                            if c == '\u{2028}' || c == '\u{2029}' {
                                self.preceding_line_break = true;
                                self.pos += c.len_utf8();
                                continue;
                            }
                            if c.is_whitespace() || c == '\u{feff}' {
                                self.pos += c.len_utf8();
                                continue;
                            }
                        }
                    }
                    self.token = self.scan_token(ch);
                    return self.token;
                }
            }
        }
    }

    fn scan_token(&mut self, ch: u8) -> SyntaxKind {
        use SyntaxKind::*;
        match ch {
            b'"' | b'\'' => self.scan_string(ch),
            b'0'..=b'9' => self.scan_number(),
            b'.' if matches!(self.byte_at(self.pos + 1), Some(b'0'..=b'9')) => self.scan_number(),
            b'{' => self.punct(1, OpenBraceToken),
            b'}' => self.punct(1, CloseBraceToken),
            b'(' => self.punct(1, OpenParenToken),
            b')' => self.punct(1, CloseParenToken),
            b'[' => self.punct(1, OpenBracketToken),
            b']' => self.punct(1, CloseBracketToken),
            b'.' => self.punct(1, DotToken),
            b';' => self.punct(1, SemicolonToken),
            b',' => self.punct(1, CommaToken),
            b':' => self.punct(1, ColonToken),
            b'~' => self.punct(1, TildeToken),
            b'<' => self.longest(&[
                ("<<=", LessThanLessThanEqualsToken),
                ("<<", LessThanLessThanToken),
                ("<=", LessThanEqualsToken),
                ("<", LessThanToken),
            ]),
            b'>' => self.longest(&[
                (">>>=", GreaterThanGreaterThanGreaterThanEqualsToken),
                (">>>", GreaterThanGreaterThanGreaterThanToken),
                (">>=", GreaterThanGreaterThanEqualsToken),
                (">>", GreaterThanGreaterThanToken),
                (">=", GreaterThanEqualsToken),
                (">", GreaterThanToken),
            ]),
            b'=' => self.longest(&[
                ("===", EqualsEqualsEqualsToken),
                ("==", EqualsEqualsToken),
                ("=", EqualsToken),
            ]),
            b'!' => self.longest(&[
                ("!==", ExclamationEqualsEqualsToken),
                ("!=", ExclamationEqualsToken),
                ("!", ExclamationToken),
            ]),
            b'+' => self.longest(&[("++", PlusPlusToken), ("+=", PlusEqualsToken), ("+", PlusToken)]),
            b'-' => self.longest(&[
                ("--", MinusMinusToken),
                ("-=", MinusEqualsToken),
                ("-", MinusToken),
            ]),
            b'*' => self.longest(&[
                ("**=", AsteriskAsteriskEqualsToken),
                ("**", AsteriskAsteriskToken),
                ("*=", AsteriskEqualsToken),
                ("*", AsteriskToken),
            ]),
            b'/' => self.longest(&[("/=", SlashEqualsToken), ("/", SlashToken)]),
            b'%' => self.longest(&[("%=", PercentEqualsToken), ("%", PercentToken)]),
            b'&' => self.longest(&[
                ("&&=", AmpersandAmpersandEqualsToken),
                ("&&", AmpersandAmpersandToken),
                ("&=", AmpersandEqualsToken),
                ("&", AmpersandToken),
            ]),
            b'|' => self.longest(&[
                ("||=", BarBarEqualsToken),
                ("||", BarBarToken),
                ("|=", BarEqualsToken),
                ("|", BarToken),
            ]),
            b'^' => self.longest(&[("^=", CaretEqualsToken), ("^", CaretToken)]),
            b'?' => self.longest(&[
                ("??=", QuestionQuestionEqualsToken),
                ("??", QuestionQuestionToken),
                ("?", QuestionToken),
            ]),
            _ => {
                let c = self.char_at(self.pos).unwrap_or('\0');
                if is_identifier_start(c) {
                    return self.scan_identifier();
                }
                let len = c.len_utf8().max(1);
                self.error(self.pos, len, "Invalid character.", INVALID_CHARACTER);
                self.pos += len;
                Unknown
            }
        }
    }

    fn punct(&mut self, len: usize, kind: SyntaxKind) -> SyntaxKind {
        self.pos += len;
        kind
    }

    fn longest(&mut self, candidates: &[(&str, SyntaxKind)]) -> SyntaxKind {
        let rest = &self.text[self.pos..];
        for (text, kind) in candidates {
            if rest.starts_with(text) {
                self.pos += text.len();
                return *kind;
            }
        }
        SyntaxKind::Unknown
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        while let Some(c) = self.char_at(self.pos) {
            if !is_identifier_part(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.token_value.push_str(&self.text[start..self.pos]);
        text_to_keyword(&self.token_value).unwrap_or(SyntaxKind::Identifier)
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        let bytes = self.text.as_bytes();
        if bytes[start] == b'0'
            && matches!(
                self.byte_at(start + 1),
                Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
            )
        {
            self.pos += 2;
            while matches!(self.byte_at(self.pos), Some(c) if c.is_ascii_hexdigit() || c == b'_') {
                self.pos += 1;
            }
        } else {
            while matches!(self.byte_at(self.pos), Some(b'0'..=b'9' | b'_')) {
                self.pos += 1;
            }
            if self.byte_at(self.pos) == Some(b'.') {
                self.pos += 1;
                while matches!(self.byte_at(self.pos), Some(b'0'..=b'9' | b'_')) {
                    self.pos += 1;
                }
            }
            if matches!(self.byte_at(self.pos), Some(b'e' | b'E')) {
                let mut probe = self.pos + 1;
                if matches!(self.byte_at(probe), Some(b'+' | b'-')) {
                    probe += 1;
                }
                if matches!(self.byte_at(probe), Some(b'0'..=b'9')) {
                    self.pos = probe;
                    while matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) {
                        self.pos += 1;
                    }
                }
            }
        }
        self.token_value.push_str(&self.text[start..self.pos]);
        SyntaxKind::NumericLiteral
    }

    fn scan_string(&mut self, quote: u8) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(c) = self.char_at(self.pos) else {
                self.error(start, self.pos - start, "Unterminated string literal.", UNTERMINATED_STRING);
                break;
            };
            if c as u32 == quote as u32 {
                self.pos += 1;
                break;
            }
            match c {
                '\\' => {
                    self.pos += 1;
                    self.scan_escape(&mut value);
                }
                '\n' | '\r' => {
                    self.error(start, self.pos - start, "Unterminated string literal.", UNTERMINATED_STRING);
                    break;
                }
                _ => {
                    value.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        self.token_value = value;
        SyntaxKind::StringLiteral
    }

    fn scan_escape(&mut self, value: &mut String) {
        let Some(c) = self.char_at(self.pos) else {
            return;
        };
        self.pos += c.len_utf8();
        match c {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !matches!(self.byte_at(self.pos), Some(b'0'..=b'9')) => value.push('\0'),
            'x' => {
                let code = self.scan_hex_digits(2, 2);
                push_code_unit(value, code);
            }
            'u' => {
                let code = if self.byte_at(self.pos) == Some(b'{') {
                    self.pos += 1;
                    let code = self.scan_hex_digits(1, 6);
                    if self.byte_at(self.pos) == Some(b'}') {
                        self.pos += 1;
                    }
                    code
                } else {
                    let code = self.scan_hex_digits(4, 4);
                    // Combine a surrogate pair written as two escapes.
                    if let Some(high) = code.filter(|c| (0xD800..0xDC00).contains(c)) {
                        if self.text[self.pos..].starts_with("\\u") {
                            let saved = self.pos;
                            self.pos += 2;
                            match self.scan_hex_digits(4, 4) {
                                Some(low) if (0xDC00..0xE000).contains(&low) => {
                                    Some(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                                }
                                _ => {
                                    self.pos = saved;
                                    Some(high)
                                }
                            }
                        } else {
                            Some(high)
                        }
                    } else {
                        code
                    }
                };
                push_code_unit(value, code);
            }
            '\r' => {
                if self.byte_at(self.pos) == Some(b'\n') {
                    self.pos += 1;
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '0'..='7' => {
                // Legacy octal escape.
                let mut code = c as u32 - '0' as u32;
                let max_digits = if c <= '3' { 2 } else { 1 };
                for _ in 0..max_digits {
                    match self.byte_at(self.pos) {
                        Some(d @ b'0'..=b'7') => {
                            code = code * 8 + (d - b'0') as u32;
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                push_code_unit(value, Some(code));
            }
            other => value.push(other),
        }
    }

    fn scan_hex_digits(&mut self, min: usize, max: usize) -> Option<u32> {
        let mut code = 0u32;
        let mut count = 0;
        while count < max {
            let Some(d) = self.byte_at(self.pos).and_then(|b| (b as char).to_digit(16)) else {
                break;
            };
            code = code * 16 + d;
            count += 1;
            self.pos += 1;
        }
        (count >= min).then_some(code)
    }

    /// Re-scan a `/` or `/=` token as a regular expression literal.
    ///
    /// Called by the parser when a slash appears where an expression starts.
    pub fn re_scan_slash_token(&mut self) -> SyntaxKind {
        if !matches!(self.token, SyntaxKind::SlashToken | SyntaxKind::SlashEqualsToken) {
            return self.token;
        }
        let start = self.token_start;
        let mut pos = start + 1;
        let mut in_class = false;
        loop {
            let Some(c) = self.char_at(pos) else {
                self.error(start, pos - start, "Unterminated regular expression literal.", UNTERMINATED_REGEX);
                break;
            };
            match c {
                '\n' | '\r' => {
                    self.error(start, pos - start, "Unterminated regular expression literal.", UNTERMINATED_REGEX);
                    break;
                }
                '\\' => {
                    pos += 1;
                    if let Some(next) = self.char_at(pos) {
                        pos += next.len_utf8();
                    }
                    continue;
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    pos += 1;
                    break;
                }
                _ => {}
            }
            pos += c.len_utf8();
        }
        while let Some(c) = self.char_at(pos) {
            if !is_identifier_part(c) {
                break;
            }
            pos += c.len_utf8();
        }
        self.pos = pos;
        self.token_value = self.text[start..pos].to_string();
        self.token = SyntaxKind::RegularExpressionLiteral;
        self.token
    }
}

fn push_code_unit(value: &mut String, code: Option<u32>) {
    match code.and_then(char::from_u32) {
        Some(c) => value.push(c),
        None => value.push('\u{FFFD}'),
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit() || (!c.is_ascii() && c.is_alphanumeric())
}

/// Numeric value of a numeric literal's source text.
///
/// Handles decimal, exponent, hex (`0x`), octal (`0o`), binary (`0b`) and
/// numeric separators. Returns `None` for malformed text.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let radix = if lower.starts_with("0x") {
        16
    } else if lower.starts_with("0o") {
        8
    } else if lower.starts_with("0b") {
        2
    } else {
        return lower.parse::<f64>().ok();
    };
    let digits = &lower[2..];
    if digits.is_empty() {
        return None;
    }
    let mut value = 0f64;
    for c in digits.chars() {
        value = value * radix as f64 + c.to_digit(radix)? as f64;
    }
    Some(value)
}
