//! Node kinds that have no token counterpart.
//!
//! Token-shaped nodes (identifiers, literals, `this`, `true`, ...) reuse their
//! `SyntaxKind` value; everything else uses one of these constants, which
//! start above the last token kind.

use deflat_scanner::SyntaxKind;

pub const SOURCE_FILE: u16 = 200;

// Declarations
pub const VARIABLE_STATEMENT: u16 = 201;
pub const VARIABLE_DECLARATION_LIST: u16 = 202;
pub const VARIABLE_DECLARATION: u16 = 203;
pub const FUNCTION_DECLARATION: u16 = 204;

// Statements
pub const BLOCK: u16 = 210;
pub const EMPTY_STATEMENT: u16 = 211;
pub const EXPRESSION_STATEMENT: u16 = 212;
pub const IF_STATEMENT: u16 = 213;
pub const FOR_STATEMENT: u16 = 214;
pub const FOR_IN_STATEMENT: u16 = 215;
pub const WHILE_STATEMENT: u16 = 216;
pub const DO_STATEMENT: u16 = 217;
pub const SWITCH_STATEMENT: u16 = 218;
pub const CASE_CLAUSE: u16 = 219;
pub const DEFAULT_CLAUSE: u16 = 220;
pub const BREAK_STATEMENT: u16 = 221;
pub const CONTINUE_STATEMENT: u16 = 222;
pub const RETURN_STATEMENT: u16 = 223;
pub const THROW_STATEMENT: u16 = 224;
pub const TRY_STATEMENT: u16 = 225;
pub const CATCH_CLAUSE: u16 = 226;
pub const LABELED_STATEMENT: u16 = 227;
pub const DEBUGGER_STATEMENT: u16 = 228;

// Expressions
pub const PREFIX_UNARY_EXPRESSION: u16 = 240;
pub const POSTFIX_UNARY_EXPRESSION: u16 = 241;
pub const BINARY_EXPRESSION: u16 = 242;
pub const CONDITIONAL_EXPRESSION: u16 = 243;
pub const SEQUENCE_EXPRESSION: u16 = 244;
pub const CALL_EXPRESSION: u16 = 245;
pub const NEW_EXPRESSION: u16 = 246;
pub const PROPERTY_ACCESS_EXPRESSION: u16 = 247;
pub const ELEMENT_ACCESS_EXPRESSION: u16 = 248;
pub const ARRAY_LITERAL_EXPRESSION: u16 = 249;
pub const OBJECT_LITERAL_EXPRESSION: u16 = 250;
pub const PROPERTY_ASSIGNMENT: u16 = 251;
pub const FUNCTION_EXPRESSION: u16 = 252;
pub const OMITTED_EXPRESSION: u16 = 253;

/// Human-readable name of a node kind, for diagnostics and logs.
pub fn kind_name(kind: u16) -> &'static str {
    match kind {
        SOURCE_FILE => "SourceFile",
        VARIABLE_STATEMENT => "VariableStatement",
        VARIABLE_DECLARATION_LIST => "VariableDeclarationList",
        VARIABLE_DECLARATION => "VariableDeclaration",
        FUNCTION_DECLARATION => "FunctionDeclaration",
        BLOCK => "Block",
        EMPTY_STATEMENT => "EmptyStatement",
        EXPRESSION_STATEMENT => "ExpressionStatement",
        IF_STATEMENT => "IfStatement",
        FOR_STATEMENT => "ForStatement",
        FOR_IN_STATEMENT => "ForInStatement",
        WHILE_STATEMENT => "WhileStatement",
        DO_STATEMENT => "DoStatement",
        SWITCH_STATEMENT => "SwitchStatement",
        CASE_CLAUSE => "CaseClause",
        DEFAULT_CLAUSE => "DefaultClause",
        BREAK_STATEMENT => "BreakStatement",
        CONTINUE_STATEMENT => "ContinueStatement",
        RETURN_STATEMENT => "ReturnStatement",
        THROW_STATEMENT => "ThrowStatement",
        TRY_STATEMENT => "TryStatement",
        CATCH_CLAUSE => "CatchClause",
        LABELED_STATEMENT => "LabeledStatement",
        DEBUGGER_STATEMENT => "DebuggerStatement",
        PREFIX_UNARY_EXPRESSION => "PrefixUnaryExpression",
        POSTFIX_UNARY_EXPRESSION => "PostfixUnaryExpression",
        BINARY_EXPRESSION => "BinaryExpression",
        CONDITIONAL_EXPRESSION => "ConditionalExpression",
        SEQUENCE_EXPRESSION => "SequenceExpression",
        CALL_EXPRESSION => "CallExpression",
        NEW_EXPRESSION => "NewExpression",
        PROPERTY_ACCESS_EXPRESSION => "PropertyAccessExpression",
        ELEMENT_ACCESS_EXPRESSION => "ElementAccessExpression",
        ARRAY_LITERAL_EXPRESSION => "ArrayLiteralExpression",
        OBJECT_LITERAL_EXPRESSION => "ObjectLiteralExpression",
        PROPERTY_ASSIGNMENT => "PropertyAssignment",
        FUNCTION_EXPRESSION => "FunctionExpression",
        OMITTED_EXPRESSION => "OmittedExpression",
        k if k == SyntaxKind::Identifier as u16 => "Identifier",
        k if k == SyntaxKind::NumericLiteral as u16 => "NumericLiteral",
        k if k == SyntaxKind::StringLiteral as u16 => "StringLiteral",
        k if k == SyntaxKind::RegularExpressionLiteral as u16 => "RegularExpressionLiteral",
        _ => "Token",
    }
}
