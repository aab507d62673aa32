//! Thin node architecture for the arena AST.
//!
//! Each node is a 16-byte `Node` header (kind, flags, position and a data
//! index) stored in `NodeArena::nodes`. Node-specific data lives in typed
//! pools; `data_index` points into the pool selected by `kind`. Tokens that
//! carry no data (`this`, `true`, `;`) use `Node::NO_DATA`.
//!
//! Parent links are kept in `extended_info`, parallel to `nodes`. Builders
//! and mutation helpers keep them in sync so rewrite passes can walk upward.

use super::base::{NodeIndex, NodeList};
use deflat_common::CommentRange;
use deflat_scanner::SyntaxKind;
use serde::Serialize;
use std::sync::Arc;

/// A thin 16-byte node header.
#[repr(C)]
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Node {
    /// SyntaxKind value or a `syntax_kind_ext` constant
    pub kind: u16,
    /// Packed `NodeFlags`
    pub flags: u16,
    /// Start position in source (byte offset)
    pub pos: u32,
    /// End position in source (byte offset)
    pub end: u32,
    /// Index into the type-specific storage pool (u32::MAX = no data)
    pub data_index: u32,
}

impl Node {
    pub const NO_DATA: u32 = u32::MAX;

    #[inline]
    pub fn new(kind: u16, pos: u32, end: u32) -> Node {
        Node {
            kind,
            flags: 0,
            pos,
            end,
            data_index: Self::NO_DATA,
        }
    }

    #[inline]
    pub fn with_data(kind: u16, pos: u32, end: u32, data_index: u32) -> Node {
        Node {
            kind,
            flags: 0,
            pos,
            end,
            data_index,
        }
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.data_index != Self::NO_DATA
    }
}

/// Side table entry, parallel to `NodeArena::nodes`.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ExtendedNodeInfo {
    pub parent: NodeIndex,
}

// =============================================================================
// Typed Data Pools
// =============================================================================

/// Data for identifier nodes
#[derive(Clone, Debug, Serialize)]
pub struct IdentifierData {
    pub escaped_text: String,
}

/// Data for numeric, string and regular expression literals.
///
/// `text` is the decoded value for strings and the source text for numbers
/// and regular expressions.
#[derive(Clone, Debug, Serialize)]
pub struct LiteralData {
    pub text: String,
    pub value: Option<f64>,
}

/// Binary expressions, including logical operators and assignments
#[derive(Clone, Debug, Serialize)]
pub struct BinaryExprData {
    pub left: NodeIndex,
    pub operator_token: SyntaxKind,
    pub right: NodeIndex,
}

/// Prefix and postfix unary expressions
#[derive(Clone, Debug, Serialize)]
pub struct UnaryExprData {
    pub operator: SyntaxKind,
    pub operand: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConditionalExprData {
    pub condition: NodeIndex,
    pub when_true: NodeIndex,
    pub when_false: NodeIndex,
}

/// Array literals, object literals and comma sequences
#[derive(Clone, Debug, Serialize)]
pub struct LiteralExprData {
    pub elements: NodeList,
}

/// Call and `new` expressions
#[derive(Clone, Debug, Serialize)]
pub struct CallExprData {
    pub expression: NodeIndex,
    pub arguments: NodeList,
}

/// `a.b` (name is an identifier) and `a[b]` (argument is any expression)
#[derive(Clone, Debug, Serialize)]
pub struct AccessExprData {
    pub expression: NodeIndex,
    pub name_or_argument: NodeIndex,
}

/// `name: initializer` inside an object literal
#[derive(Clone, Debug, Serialize)]
pub struct PropertyAssignmentData {
    pub name: NodeIndex,
    pub initializer: NodeIndex,
}

/// Function declarations and expressions. Parameters are identifier nodes.
#[derive(Clone, Debug, Serialize)]
pub struct FunctionData {
    pub name: NodeIndex,
    pub parameters: NodeList,
    pub body: NodeIndex,
}

/// Blocks and source-file-like statement containers
#[derive(Clone, Debug, Serialize)]
pub struct BlockData {
    pub statements: NodeList,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExprStatementData {
    pub expression: NodeIndex,
}

/// Variable statements and `for` initializer declaration lists
#[derive(Clone, Debug, Serialize)]
pub struct VariableData {
    pub declarations: NodeList,
}

#[derive(Clone, Debug, Serialize)]
pub struct VariableDeclarationData {
    pub name: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct IfStatementData {
    pub expression: NodeIndex,
    pub then_statement: NodeIndex,
    pub else_statement: NodeIndex,
}

/// `for`, `while` and `do` loops (unused slots are `NONE`)
#[derive(Clone, Debug, Serialize)]
pub struct LoopData {
    pub initializer: NodeIndex,
    pub condition: NodeIndex,
    pub incrementor: NodeIndex,
    pub statement: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct ForInData {
    pub initializer: NodeIndex,
    pub expression: NodeIndex,
    pub statement: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct SwitchData {
    pub expression: NodeIndex,
    pub clauses: NodeList,
}

#[derive(Clone, Debug, Serialize)]
pub struct CaseClauseData {
    /// NONE for default clause
    pub expression: NodeIndex,
    pub statements: NodeList,
}

/// `return` and `throw`
#[derive(Clone, Debug, Serialize)]
pub struct ReturnData {
    pub expression: NodeIndex,
}

/// `break` and `continue`
#[derive(Clone, Debug, Serialize)]
pub struct JumpData {
    pub label: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct LabeledData {
    pub label: NodeIndex,
    pub statement: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct TryData {
    pub try_block: NodeIndex,
    pub catch_clause: NodeIndex,
    pub finally_block: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct CatchClauseData {
    pub variable_declaration: NodeIndex,
    pub block: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct SourceFileData {
    pub statements: NodeList,
    pub file_name: String,
    #[serde(skip)]
    pub text: Arc<str>,
    pub comments: Vec<CommentRange>,
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
    pub extended_info: Vec<ExtendedNodeInfo>,
    pub identifiers: Vec<IdentifierData>,
    pub literals: Vec<LiteralData>,
    pub binary_exprs: Vec<BinaryExprData>,
    pub unary_exprs: Vec<UnaryExprData>,
    pub conditional_exprs: Vec<ConditionalExprData>,
    pub literal_exprs: Vec<LiteralExprData>,
    pub call_exprs: Vec<CallExprData>,
    pub access_exprs: Vec<AccessExprData>,
    pub property_assignments: Vec<PropertyAssignmentData>,
    pub functions: Vec<FunctionData>,
    pub blocks: Vec<BlockData>,
    pub expr_statements: Vec<ExprStatementData>,
    pub variables: Vec<VariableData>,
    pub variable_declarations: Vec<VariableDeclarationData>,
    pub if_statements: Vec<IfStatementData>,
    pub loops: Vec<LoopData>,
    pub for_in_data: Vec<ForInData>,
    pub switch_data: Vec<SwitchData>,
    pub case_clauses: Vec<CaseClauseData>,
    pub return_data: Vec<ReturnData>,
    pub jump_data: Vec<JumpData>,
    pub labeled_data: Vec<LabeledData>,
    pub try_data: Vec<TryData>,
    pub catch_clauses: Vec<CatchClauseData>,
    pub source_files: Vec<SourceFileData>,
}
