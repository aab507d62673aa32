use deflat_scanner::{ScannerState, SyntaxKind, parse_numeric_text};

fn scan_all(source: &str) -> Vec<SyntaxKind> {
    let mut scanner = ScannerState::new(source.to_string(), true);
    let mut kinds = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == SyntaxKind::EndOfFileToken {
            break;
        }
        kinds.push(kind);
    }
    kinds
}

#[test]
fn test_scan_empty() {
    let mut scanner = ScannerState::new(String::new(), true);
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
}

#[test]
fn test_scan_whitespace_without_skip() {
    let mut scanner = ScannerState::new("   \n".to_string(), false);
    assert_eq!(scanner.scan(), SyntaxKind::WhitespaceTrivia);
    assert_eq!(scanner.scan(), SyntaxKind::NewLineTrivia);
    assert!(scanner.has_preceding_line_break());
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
}

#[test]
fn test_scan_punctuation() {
    assert_eq!(
        scan_all("{}()[];,"),
        vec![
            SyntaxKind::OpenBraceToken,
            SyntaxKind::CloseBraceToken,
            SyntaxKind::OpenParenToken,
            SyntaxKind::CloseParenToken,
            SyntaxKind::OpenBracketToken,
            SyntaxKind::CloseBracketToken,
            SyntaxKind::SemicolonToken,
            SyntaxKind::CommaToken,
        ]
    );
}

#[test]
fn test_scan_compound_operators_longest_match() {
    assert_eq!(
        scan_all("=== !== >>>= >>> && ||= ?? ++ -="),
        vec![
            SyntaxKind::EqualsEqualsEqualsToken,
            SyntaxKind::ExclamationEqualsEqualsToken,
            SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken,
            SyntaxKind::GreaterThanGreaterThanGreaterThanToken,
            SyntaxKind::AmpersandAmpersandToken,
            SyntaxKind::BarBarEqualsToken,
            SyntaxKind::QuestionQuestionToken,
            SyntaxKind::PlusPlusToken,
            SyntaxKind::MinusEqualsToken,
        ]
    );
}

#[test]
fn test_scan_keywords_and_identifiers() {
    let mut scanner = ScannerState::new("var foo = void 0".to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::VarKeyword);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.get_token_value(), "foo");
    assert_eq!(scanner.scan(), SyntaxKind::EqualsToken);
    assert_eq!(scanner.scan(), SyntaxKind::VoidKeyword);
    assert_eq!(scanner.scan(), SyntaxKind::NumericLiteral);
    assert_eq!(scanner.get_token_value(), "0");
}

#[test]
fn test_scan_string_escapes_are_decoded() {
    let mut scanner = ScannerState::new(r#"'a\n\x41B\u{43}\'"'"#.to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.get_token_value(), "a\nABC'\"");
    assert!(scanner.get_scanner_diagnostics().is_empty());
}

#[test]
fn test_scan_surrogate_pair_escape() {
    let mut scanner = ScannerState::new(r#""\uD83D\uDE00""#.to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.get_token_value(), "\u{1F600}");
}

#[test]
fn test_unterminated_string_reports_diagnostic() {
    let mut scanner = ScannerState::new("\"abc\nx".to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    assert_eq!(scanner.get_scanner_diagnostics().len(), 1);
}

#[test]
fn test_comments_are_recorded_and_set_line_break() {
    let mut scanner = ScannerState::new("// one\n/* two\n */ a".to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert!(scanner.has_preceding_line_break());
    let comments = scanner.get_comment_ranges();
    assert_eq!(comments.len(), 2);
    assert!(!comments[0].is_multi_line);
    assert!(comments[1].is_multi_line);
    assert_eq!(comments[1].get_text(scanner.source_text()), "/* two\n */");
}

#[test]
fn test_save_and_restore_state() {
    let mut scanner = ScannerState::new("a b // c\n d".to_string(), true);
    scanner.scan();
    let snapshot = scanner.save_state();
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.get_comment_ranges().len(), 1);
    scanner.restore_state(snapshot);
    assert_eq!(scanner.get_token_value(), "a");
    assert!(scanner.get_comment_ranges().is_empty());
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.get_token_value(), "b");
}

#[test]
fn test_rescan_slash_as_regex() {
    let mut scanner = ScannerState::new("/[/]a\\/b/gi.test".to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::SlashToken);
    assert_eq!(scanner.re_scan_slash_token(), SyntaxKind::RegularExpressionLiteral);
    assert_eq!(scanner.get_token_value(), "/[/]a\\/b/gi");
    assert_eq!(scanner.scan(), SyntaxKind::DotToken);
}

#[test]
fn test_numeric_literal_values() {
    assert_eq!(parse_numeric_text("42"), Some(42.0));
    assert_eq!(parse_numeric_text("0x1F"), Some(31.0));
    assert_eq!(parse_numeric_text("0b101"), Some(5.0));
    assert_eq!(parse_numeric_text("0o17"), Some(15.0));
    assert_eq!(parse_numeric_text("1.5e3"), Some(1500.0));
    assert_eq!(parse_numeric_text(".5"), Some(0.5));
    assert_eq!(parse_numeric_text("1_000"), Some(1000.0));
    assert_eq!(parse_numeric_text("0x"), None);
}

#[test]
fn test_scan_number_forms() {
    let mut scanner = ScannerState::new("0xff 1e-3 3.".to_string(), true);
    assert_eq!(scanner.scan(), SyntaxKind::NumericLiteral);
    assert_eq!(scanner.get_token_value(), "0xff");
    assert_eq!(scanner.scan(), SyntaxKind::NumericLiteral);
    assert_eq!(scanner.get_token_value(), "1e-3");
    assert_eq!(scanner.scan(), SyntaxKind::NumericLiteral);
    assert_eq!(scanner.get_token_value(), "3.");
}
