//! Token kinds produced by the scanner.
//!
//! Node kinds that have no token counterpart live in the parser's
//! `syntax_kind_ext` module and start above `SyntaxKind::LAST_TOKEN`.

use serde::Serialize;

#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SyntaxKind {
    Unknown = 0,
    EndOfFileToken,
    SingleLineCommentTrivia,
    MultiLineCommentTrivia,
    NewLineTrivia,
    WhitespaceTrivia,
    // Literals
    NumericLiteral,
    StringLiteral,
    RegularExpressionLiteral,
    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    DotToken,
    SemicolonToken,
    CommaToken,
    LessThanToken,
    GreaterThanToken,
    LessThanEqualsToken,
    GreaterThanEqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    EqualsEqualsEqualsToken,
    ExclamationEqualsEqualsToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    AsteriskAsteriskToken,
    SlashToken,
    PercentToken,
    PlusPlusToken,
    MinusMinusToken,
    LessThanLessThanToken,
    GreaterThanGreaterThanToken,
    GreaterThanGreaterThanGreaterThanToken,
    AmpersandToken,
    BarToken,
    CaretToken,
    ExclamationToken,
    TildeToken,
    AmpersandAmpersandToken,
    BarBarToken,
    QuestionQuestionToken,
    QuestionToken,
    ColonToken,
    // Assignments
    EqualsToken,
    PlusEqualsToken,
    MinusEqualsToken,
    AsteriskEqualsToken,
    AsteriskAsteriskEqualsToken,
    SlashEqualsToken,
    PercentEqualsToken,
    LessThanLessThanEqualsToken,
    GreaterThanGreaterThanEqualsToken,
    GreaterThanGreaterThanGreaterThanEqualsToken,
    AmpersandEqualsToken,
    BarEqualsToken,
    CaretEqualsToken,
    AmpersandAmpersandEqualsToken,
    BarBarEqualsToken,
    QuestionQuestionEqualsToken,
    // Identifiers
    Identifier,
    // Reserved words
    BreakKeyword,
    CaseKeyword,
    CatchKeyword,
    ConstKeyword,
    ContinueKeyword,
    DebuggerKeyword,
    DefaultKeyword,
    DeleteKeyword,
    DoKeyword,
    ElseKeyword,
    FalseKeyword,
    FinallyKeyword,
    ForKeyword,
    FunctionKeyword,
    IfKeyword,
    InKeyword,
    InstanceOfKeyword,
    LetKeyword,
    NewKeyword,
    NullKeyword,
    ReturnKeyword,
    SwitchKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeOfKeyword,
    VarKeyword,
    VoidKeyword,
    WhileKeyword,
}

impl SyntaxKind {
    pub const FIRST_ASSIGNMENT: SyntaxKind = SyntaxKind::EqualsToken;
    pub const LAST_ASSIGNMENT: SyntaxKind = SyntaxKind::QuestionQuestionEqualsToken;
    pub const FIRST_KEYWORD: SyntaxKind = SyntaxKind::BreakKeyword;
    pub const LAST_KEYWORD: SyntaxKind = SyntaxKind::WhileKeyword;
    pub const LAST_TOKEN: SyntaxKind = SyntaxKind::WhileKeyword;

    pub fn is_keyword(self) -> bool {
        self >= Self::FIRST_KEYWORD && self <= Self::LAST_KEYWORD
    }

    pub fn is_assignment_operator(self) -> bool {
        self >= Self::FIRST_ASSIGNMENT && self <= Self::LAST_ASSIGNMENT
    }

    /// Identifier or any reserved word (valid as a property name after `.`).
    pub fn is_identifier_or_keyword(self) -> bool {
        self == SyntaxKind::Identifier || self.is_keyword()
    }

    /// For a compound assignment (`+=`), the underlying binary operator (`+`).
    pub fn compound_assignment_operator(self) -> Option<SyntaxKind> {
        use SyntaxKind::*;
        Some(match self {
            PlusEqualsToken => PlusToken,
            MinusEqualsToken => MinusToken,
            AsteriskEqualsToken => AsteriskToken,
            AsteriskAsteriskEqualsToken => AsteriskAsteriskToken,
            SlashEqualsToken => SlashToken,
            PercentEqualsToken => PercentToken,
            LessThanLessThanEqualsToken => LessThanLessThanToken,
            GreaterThanGreaterThanEqualsToken => GreaterThanGreaterThanToken,
            GreaterThanGreaterThanGreaterThanEqualsToken => GreaterThanGreaterThanGreaterThanToken,
            AmpersandEqualsToken => AmpersandToken,
            BarEqualsToken => BarToken,
            CaretEqualsToken => CaretToken,
            AmpersandAmpersandEqualsToken => AmpersandAmpersandToken,
            BarBarEqualsToken => BarBarToken,
            QuestionQuestionEqualsToken => QuestionQuestionToken,
            _ => return None,
        })
    }
}

/// Map identifier text to its reserved word, if any.
pub fn text_to_keyword(text: &str) -> Option<SyntaxKind> {
    use SyntaxKind::*;
    Some(match text {
        "break" => BreakKeyword,
        "case" => CaseKeyword,
        "catch" => CatchKeyword,
        "const" => ConstKeyword,
        "continue" => ContinueKeyword,
        "debugger" => DebuggerKeyword,
        "default" => DefaultKeyword,
        "delete" => DeleteKeyword,
        "do" => DoKeyword,
        "else" => ElseKeyword,
        "false" => FalseKeyword,
        "finally" => FinallyKeyword,
        "for" => ForKeyword,
        "function" => FunctionKeyword,
        "if" => IfKeyword,
        "in" => InKeyword,
        "instanceof" => InstanceOfKeyword,
        "let" => LetKeyword,
        "new" => NewKeyword,
        "null" => NullKeyword,
        "return" => ReturnKeyword,
        "switch" => SwitchKeyword,
        "this" => ThisKeyword,
        "throw" => ThrowKeyword,
        "true" => TrueKeyword,
        "try" => TryKeyword,
        "typeof" => TypeOfKeyword,
        "var" => VarKeyword,
        "void" => VoidKeyword,
        "while" => WhileKeyword,
        _ => return None,
    })
}

/// Source text of a punctuator or keyword token.
pub fn token_to_string(kind: SyntaxKind) -> &'static str {
    use SyntaxKind::*;
    match kind {
        OpenBraceToken => "{",
        CloseBraceToken => "}",
        OpenParenToken => "(",
        CloseParenToken => ")",
        OpenBracketToken => "[",
        CloseBracketToken => "]",
        DotToken => ".",
        SemicolonToken => ";",
        CommaToken => ",",
        LessThanToken => "<",
        GreaterThanToken => ">",
        LessThanEqualsToken => "<=",
        GreaterThanEqualsToken => ">=",
        EqualsEqualsToken => "==",
        ExclamationEqualsToken => "!=",
        EqualsEqualsEqualsToken => "===",
        ExclamationEqualsEqualsToken => "!==",
        PlusToken => "+",
        MinusToken => "-",
        AsteriskToken => "*",
        AsteriskAsteriskToken => "**",
        SlashToken => "/",
        PercentToken => "%",
        PlusPlusToken => "++",
        MinusMinusToken => "--",
        LessThanLessThanToken => "<<",
        GreaterThanGreaterThanToken => ">>",
        GreaterThanGreaterThanGreaterThanToken => ">>>",
        AmpersandToken => "&",
        BarToken => "|",
        CaretToken => "^",
        ExclamationToken => "!",
        TildeToken => "~",
        AmpersandAmpersandToken => "&&",
        BarBarToken => "||",
        QuestionQuestionToken => "??",
        QuestionToken => "?",
        ColonToken => ":",
        EqualsToken => "=",
        PlusEqualsToken => "+=",
        MinusEqualsToken => "-=",
        AsteriskEqualsToken => "*=",
        AsteriskAsteriskEqualsToken => "**=",
        SlashEqualsToken => "/=",
        PercentEqualsToken => "%=",
        LessThanLessThanEqualsToken => "<<=",
        GreaterThanGreaterThanEqualsToken => ">>=",
        GreaterThanGreaterThanGreaterThanEqualsToken => ">>>=",
        AmpersandEqualsToken => "&=",
        BarEqualsToken => "|=",
        CaretEqualsToken => "^=",
        AmpersandAmpersandEqualsToken => "&&=",
        BarBarEqualsToken => "||=",
        QuestionQuestionEqualsToken => "??=",
        BreakKeyword => "break",
        CaseKeyword => "case",
        CatchKeyword => "catch",
        ConstKeyword => "const",
        ContinueKeyword => "continue",
        DebuggerKeyword => "debugger",
        DefaultKeyword => "default",
        DeleteKeyword => "delete",
        DoKeyword => "do",
        ElseKeyword => "else",
        FalseKeyword => "false",
        FinallyKeyword => "finally",
        ForKeyword => "for",
        FunctionKeyword => "function",
        IfKeyword => "if",
        InKeyword => "in",
        InstanceOfKeyword => "instanceof",
        LetKeyword => "let",
        NewKeyword => "new",
        NullKeyword => "null",
        ReturnKeyword => "return",
        SwitchKeyword => "switch",
        ThisKeyword => "this",
        ThrowKeyword => "throw",
        TrueKeyword => "true",
        TryKeyword => "try",
        TypeOfKeyword => "typeof",
        VarKeyword => "var",
        VoidKeyword => "void",
        WhileKeyword => "while",
        _ => "",
    }
}
