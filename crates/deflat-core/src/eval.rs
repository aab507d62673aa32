//! Bounded, side-effect-free expression evaluator.
//!
//! Dispatch guards and discriminants are plain arithmetic over literals and
//! a handful of bound names. `Evaluator` interprets exactly that subset with
//! JavaScript value semantics and refuses everything else (calls, member
//! access, assignments), so nothing in the input program is ever executed.

use crate::error::EvalError;
use deflat_common::limits::MAX_EVAL_DEPTH;
use deflat_parser::parser::format_number;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex};
use deflat_scanner::SyntaxKind;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// A primitive JavaScript value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    String(String),
    Undefined,
    Null,
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Undefined | Value::Null => false,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::String(s) => string_to_number(s),
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
        }
    }

    pub fn to_js_string(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
        }
    }

    pub fn to_int32(&self) -> i32 {
        to_uint32(self.to_number()) as i32
    }

    pub fn to_uint32(&self) -> u32 {
        to_uint32(self.to_number())
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Undefined => "undefined",
            Value::Null => "object",
        }
    }

    /// The value as an integral dispatch key.
    pub fn as_key(&self) -> Result<i64, EvalError> {
        match self {
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                Ok(*n as i64)
            }
            other => Err(EvalError::NotInteger(other.to_js_string())),
        }
    }
}

fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return trimmed
            .get(2..)
            .and_then(|digits| u64::from_str_radix(digits, radix).ok())
            .map_or(f64::NAN, |v| v as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust also accepts "inf" and "nan"; JavaScript does not.
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        _ => false,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Null | Value::Undefined, _) | (_, Value::Null | Value::Undefined) => false,
        (Value::Boolean(_), _) => loose_equals(&Value::Number(left.to_number()), right),
        (_, Value::Boolean(_)) => loose_equals(left, &Value::Number(right.to_number())),
        (Value::Number(a), Value::String(_)) => *a == right.to_number(),
        (Value::String(_), Value::Number(b)) => left.to_number() == *b,
        _ => strict_equals(left, right),
    }
}

/// Abstract relational comparison; `None` when either side is NaN.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Some(a.encode_utf16().cmp(b.encode_utf16()));
    }
    left.to_number().partial_cmp(&right.to_number())
}

fn power(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

pub struct Evaluator<'a> {
    arena: &'a NodeArena,
    env: FxHashMap<String, Value>,
    depth: u32,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a NodeArena) -> Self {
        Evaluator {
            arena,
            env: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn bind(&mut self, name: &str, value: Value) {
        self.env.insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.env.get(name)
    }

    /// Bind every declarator of a variable statement or declaration list.
    pub fn evaluate_declarations(&mut self, statement: NodeIndex) -> Result<(), EvalError> {
        let arena = self.arena;
        let list = arena
            .get(statement)
            .and_then(|node| arena.get_variable(node))
            .ok_or(EvalError::Unsupported("statement"))?;
        for &decl in list.declarations.iter() {
            let data = arena
                .get(decl)
                .and_then(|node| arena.get_variable_declaration(node))
                .ok_or(EvalError::Unsupported("declaration"))?;
            let name = arena
                .get_identifier_text(data.name)
                .ok_or(EvalError::Unsupported("binding pattern"))?;
            let value = if data.initializer.is_some() {
                self.evaluate(data.initializer)?
            } else {
                Value::Undefined
            };
            self.env.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Truthiness of a loop or branch condition. An absent condition holds.
    pub fn evaluate_condition(&mut self, expr: NodeIndex) -> Result<bool, EvalError> {
        if expr.is_none() {
            return Ok(true);
        }
        Ok(self.evaluate(expr)?.truthy())
    }

    pub fn evaluate_key(&mut self, expr: NodeIndex) -> Result<i64, EvalError> {
        self.evaluate(expr)?.as_key()
    }

    pub fn evaluate(&mut self, expr: NodeIndex) -> Result<Value, EvalError> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(EvalError::DepthExceeded(MAX_EVAL_DEPTH));
        }
        self.depth += 1;
        let result = self.evaluate_inner(expr);
        self.depth -= 1;
        result
    }

    fn evaluate_inner(&mut self, expr: NodeIndex) -> Result<Value, EvalError> {
        let arena = self.arena;
        let node = arena.get(expr).ok_or(EvalError::Unsupported("missing expression"))?;
        match node.kind {
            k if k == SyntaxKind::NumericLiteral as u16 => arena
                .get_literal(node)
                .and_then(|lit| lit.value)
                .map(Value::Number)
                .ok_or(EvalError::Unsupported("numeric literal")),
            k if k == SyntaxKind::StringLiteral as u16 => arena
                .get_literal(node)
                .map(|lit| Value::String(lit.text.clone()))
                .ok_or(EvalError::Unsupported("string literal")),
            k if k == SyntaxKind::TrueKeyword as u16 => Ok(Value::Boolean(true)),
            k if k == SyntaxKind::FalseKeyword as u16 => Ok(Value::Boolean(false)),
            k if k == SyntaxKind::NullKeyword as u16 => Ok(Value::Null),
            k if k == SyntaxKind::Identifier as u16 => {
                let name = arena
                    .get_identifier_text(expr)
                    .ok_or(EvalError::Unsupported("identifier"))?;
                self.evaluate_name(name)
            }
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION => {
                let unary = arena
                    .get_unary_expr(node)
                    .ok_or(EvalError::Unsupported("unary"))?;
                let (operator, operand) = (unary.operator, unary.operand);
                if operator == SyntaxKind::TypeOfKeyword
                    && let Some(name) = arena.get_identifier_text(operand)
                    && self.evaluate_name(name).is_err()
                {
                    return Ok(Value::String("undefined".to_string()));
                }
                let value = self.evaluate(operand)?;
                match operator {
                    SyntaxKind::ExclamationToken => Ok(Value::Boolean(!value.truthy())),
                    SyntaxKind::MinusToken => Ok(Value::Number(-value.to_number())),
                    SyntaxKind::PlusToken => Ok(Value::Number(value.to_number())),
                    SyntaxKind::TildeToken => Ok(Value::Number(f64::from(!value.to_int32()))),
                    SyntaxKind::TypeOfKeyword => Ok(Value::String(value.type_of().to_string())),
                    SyntaxKind::VoidKeyword => Ok(Value::Undefined),
                    _ => Err(EvalError::Unsupported("update or delete")),
                }
            }
            syntax_kind_ext::BINARY_EXPRESSION => {
                let binary = arena
                    .get_binary_expr(node)
                    .ok_or(EvalError::Unsupported("binary"))?;
                let (left, operator, right) = (binary.left, binary.operator_token, binary.right);
                self.evaluate_binary(left, operator, right)
            }
            syntax_kind_ext::CONDITIONAL_EXPRESSION => {
                let cond = arena
                    .get_conditional_expr(node)
                    .ok_or(EvalError::Unsupported("conditional"))?;
                let (condition, when_true, when_false) = (cond.condition, cond.when_true, cond.when_false);
                if self.evaluate(condition)?.truthy() {
                    self.evaluate(when_true)
                } else {
                    self.evaluate(when_false)
                }
            }
            syntax_kind_ext::SEQUENCE_EXPRESSION => {
                let elements = arena
                    .get_literal_expr(node)
                    .map(|seq| seq.elements.nodes.clone())
                    .ok_or(EvalError::Unsupported("sequence"))?;
                let mut last = Value::Undefined;
                for element in elements {
                    last = self.evaluate(element)?;
                }
                Ok(last)
            }
            syntax_kind_ext::CALL_EXPRESSION | syntax_kind_ext::NEW_EXPRESSION => {
                Err(EvalError::Unsupported("call"))
            }
            syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION | syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION => {
                Err(EvalError::Unsupported("member access"))
            }
            _ => Err(EvalError::Unsupported("expression")),
        }
    }

    fn evaluate_name(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        match name {
            "undefined" => Ok(Value::Undefined),
            "NaN" => Ok(Value::Number(f64::NAN)),
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            _ => Err(EvalError::UnboundName(name.to_string())),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: NodeIndex,
        operator: SyntaxKind,
        right: NodeIndex,
    ) -> Result<Value, EvalError> {
        use SyntaxKind::*;

        if operator.is_assignment_operator() {
            return Err(EvalError::Unsupported("assignment"));
        }
        let lhs = self.evaluate(left)?;
        match operator {
            AmpersandAmpersandToken => {
                return if lhs.truthy() { self.evaluate(right) } else { Ok(lhs) };
            }
            BarBarToken => {
                return if lhs.truthy() { Ok(lhs) } else { self.evaluate(right) };
            }
            QuestionQuestionToken => {
                return match lhs {
                    Value::Undefined | Value::Null => self.evaluate(right),
                    _ => Ok(lhs),
                };
            }
            CommaToken => return self.evaluate(right),
            _ => {}
        }
        let rhs = self.evaluate(right)?;
        let number = |n: f64| Ok(Value::Number(n));
        let boolean = |b: bool| Ok(Value::Boolean(b));
        match operator {
            PlusToken => match (&lhs, &rhs) {
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(lhs.to_js_string() + &rhs.to_js_string()))
                }
                _ => number(lhs.to_number() + rhs.to_number()),
            },
            MinusToken => number(lhs.to_number() - rhs.to_number()),
            AsteriskToken => number(lhs.to_number() * rhs.to_number()),
            SlashToken => number(lhs.to_number() / rhs.to_number()),
            PercentToken => number(lhs.to_number() % rhs.to_number()),
            AsteriskAsteriskToken => number(power(lhs.to_number(), rhs.to_number())),
            AmpersandToken => number(f64::from(lhs.to_int32() & rhs.to_int32())),
            BarToken => number(f64::from(lhs.to_int32() | rhs.to_int32())),
            CaretToken => number(f64::from(lhs.to_int32() ^ rhs.to_int32())),
            LessThanLessThanToken => {
                number(f64::from(lhs.to_int32().wrapping_shl(rhs.to_uint32() & 31)))
            }
            GreaterThanGreaterThanToken => {
                number(f64::from(lhs.to_int32().wrapping_shr(rhs.to_uint32() & 31)))
            }
            GreaterThanGreaterThanGreaterThanToken => {
                number(f64::from(lhs.to_uint32().wrapping_shr(rhs.to_uint32() & 31)))
            }
            EqualsEqualsToken => boolean(loose_equals(&lhs, &rhs)),
            ExclamationEqualsToken => boolean(!loose_equals(&lhs, &rhs)),
            EqualsEqualsEqualsToken => boolean(strict_equals(&lhs, &rhs)),
            ExclamationEqualsEqualsToken => boolean(!strict_equals(&lhs, &rhs)),
            LessThanToken => boolean(compare(&lhs, &rhs) == Some(Ordering::Less)),
            GreaterThanToken => boolean(compare(&lhs, &rhs) == Some(Ordering::Greater)),
            LessThanEqualsToken => boolean(matches!(
                compare(&lhs, &rhs),
                Some(Ordering::Less | Ordering::Equal)
            )),
            GreaterThanEqualsToken => boolean(matches!(
                compare(&lhs, &rhs),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            _ => Err(EvalError::Unsupported("operator")),
        }
    }
}
