//! Operator precedence, shared by the parser and the printer.
//!
//! Higher numbers bind tighter. The printer re-derives parentheses from
//! these values since the parser drops them.

use deflat_scanner::SyntaxKind;

pub const COMMA: u8 = 0;
pub const ASSIGNMENT: u8 = 2;
pub const CONDITIONAL: u8 = 3;
pub const COALESCE: u8 = 4;
pub const LOGICAL_OR: u8 = 5;
pub const LOGICAL_AND: u8 = 6;
pub const BITWISE_OR: u8 = 7;
pub const BITWISE_XOR: u8 = 8;
pub const BITWISE_AND: u8 = 9;
pub const EQUALITY: u8 = 10;
pub const RELATIONAL: u8 = 11;
pub const SHIFT: u8 = 12;
pub const ADDITIVE: u8 = 13;
pub const MULTIPLICATIVE: u8 = 14;
pub const EXPONENTIATION: u8 = 15;
pub const UNARY: u8 = 16;
pub const POSTFIX: u8 = 17;
pub const NEW: u8 = 18;
pub const MEMBER: u8 = 19;
pub const PRIMARY: u8 = 20;

/// Precedence of a binary operator token, or `None` for non-binary tokens.
///
/// `in` is a binary operator everywhere except a `for` initializer; the
/// parser handles that context itself.
pub fn binary_operator_precedence(kind: SyntaxKind) -> Option<u8> {
    use SyntaxKind::*;
    Some(match kind {
        QuestionQuestionToken => COALESCE,
        BarBarToken => LOGICAL_OR,
        AmpersandAmpersandToken => LOGICAL_AND,
        BarToken => BITWISE_OR,
        CaretToken => BITWISE_XOR,
        AmpersandToken => BITWISE_AND,
        EqualsEqualsToken | ExclamationEqualsToken | EqualsEqualsEqualsToken
        | ExclamationEqualsEqualsToken => EQUALITY,
        LessThanToken | GreaterThanToken | LessThanEqualsToken | GreaterThanEqualsToken
        | InstanceOfKeyword | InKeyword => RELATIONAL,
        LessThanLessThanToken | GreaterThanGreaterThanToken | GreaterThanGreaterThanGreaterThanToken => SHIFT,
        PlusToken | MinusToken => ADDITIVE,
        AsteriskToken | SlashToken | PercentToken => MULTIPLICATIVE,
        AsteriskAsteriskToken => EXPONENTIATION,
        _ => return None,
    })
}

/// Precedence of the binary expression formed by `operator` (assignment,
/// comma and ordinary binary operators alike).
pub fn binary_expression_precedence(operator: SyntaxKind) -> u8 {
    if operator == SyntaxKind::CommaToken {
        COMMA
    } else if operator.is_assignment_operator() {
        ASSIGNMENT
    } else {
        binary_operator_precedence(operator).unwrap_or(PRIMARY)
    }
}

pub fn is_right_associative(operator: SyntaxKind) -> bool {
    operator == SyntaxKind::AsteriskAsteriskToken || operator.is_assignment_operator()
}

pub fn is_logical_operator(operator: SyntaxKind) -> bool {
    matches!(
        operator,
        SyntaxKind::AmpersandAmpersandToken | SyntaxKind::BarBarToken | SyntaxKind::QuestionQuestionToken
    )
}

pub fn is_equality_operator(operator: SyntaxKind) -> bool {
    matches!(
        operator,
        SyntaxKind::EqualsEqualsToken
            | SyntaxKind::ExclamationEqualsToken
            | SyntaxKind::EqualsEqualsEqualsToken
            | SyntaxKind::ExclamationEqualsEqualsToken
    )
}

/// The operator that yields the same result with swapped operands
/// (`a < b` is `b > a`). Equality operators mirror to themselves.
pub fn mirrored_comparison(operator: SyntaxKind) -> Option<SyntaxKind> {
    use SyntaxKind::*;
    Some(match operator {
        EqualsEqualsToken | ExclamationEqualsToken | EqualsEqualsEqualsToken
        | ExclamationEqualsEqualsToken => operator,
        LessThanToken => GreaterThanToken,
        GreaterThanToken => LessThanToken,
        LessThanEqualsToken => GreaterThanEqualsToken,
        GreaterThanEqualsToken => LessThanEqualsToken,
        _ => return None,
    })
}
