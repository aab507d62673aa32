//! A tree-walking interpreter for the small JavaScript subset the dispatch
//! tests generate: function declarations and calls, `var`, the structured
//! statements, arithmetic and a `log(...)` builtin that records its
//! arguments. Running a program before and after deobfuscation and
//! comparing the logs checks that the rewrite kept its behavior.

use deflat_core::Value;
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex, ParserState};
use deflat_scanner::SyntaxKind;
use rustc_hash::FxHashMap;

const MAX_STEPS: usize = 1_000_000;

enum Completion {
    Normal,
    Break(Option<String>),
    Continue(Option<String>),
    Return(Value),
}

struct Interpreter<'a> {
    arena: &'a NodeArena,
    functions: FxHashMap<String, NodeIndex>,
    frames: Vec<FxHashMap<String, Value>>,
    output: Vec<String>,
    steps: usize,
    /// Label of the labeled statement about to run, taken by its loop.
    loop_label: Option<String>,
}

/// Parse and run `source`, returning every `log` line in call order.
pub fn run(source: &str) -> Vec<String> {
    let (arena, root, diagnostics) = ParserState::parse("run.js", source);
    assert!(diagnostics.is_empty(), "program does not parse: {diagnostics:?}\n{source}");
    let mut functions = FxHashMap::default();
    for idx in arena.descendants(root) {
        if !arena.is_kind(idx, syntax_kind_ext::FUNCTION_DECLARATION) {
            continue;
        }
        let name = arena
            .get(idx)
            .and_then(|node| arena.get_function(node))
            .and_then(|func| arena.get_identifier_text(func.name));
        if let Some(name) = name {
            functions.insert(name.to_string(), idx);
        }
    }
    let mut interpreter = Interpreter {
        arena: &arena,
        functions,
        frames: vec![FxHashMap::default()],
        output: Vec::new(),
        steps: 0,
        loop_label: None,
    };
    let statements = arena.get_statements(root).map(|list| list.nodes.clone()).unwrap_or_default();
    interpreter.run_statements(&statements);
    interpreter.output
}

impl Interpreter<'_> {
    fn tick(&mut self) {
        self.steps += 1;
        assert!(self.steps < MAX_STEPS, "program does not terminate");
    }

    fn lookup(&self, name: &str) -> Value {
        let frame = self.frames.last().and_then(|frame| frame.get(name));
        let global = self.frames.first().and_then(|frame| frame.get(name));
        match frame.or(global) {
            Some(value) => value.clone(),
            None => match name {
                "undefined" => Value::Undefined,
                "NaN" => Value::Number(f64::NAN),
                "Infinity" => Value::Number(f64::INFINITY),
                _ => panic!("unbound name '{name}'"),
            },
        }
    }

    fn assign(&mut self, name: &str, value: Value) {
        let depth = self.frames.len();
        let in_frame = self.frames.last().is_some_and(|frame| frame.contains_key(name));
        let in_global = self.frames[0].contains_key(name);
        let index = if in_frame || !in_global { depth - 1 } else { 0 };
        self.frames[index].insert(name.to_string(), value);
    }

    fn declare(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.entry(name.to_string()).or_insert(Value::Undefined);
        }
    }

    // Statements

    fn run_statements(&mut self, statements: &[NodeIndex]) -> Completion {
        for &statement in statements {
            match self.run_statement(statement) {
                Completion::Normal => {}
                other => return other,
            }
        }
        Completion::Normal
    }

    fn run_statement(&mut self, idx: NodeIndex) -> Completion {
        self.tick();
        let own_label = self.loop_label.take();
        let arena = self.arena;
        let node = arena.get(idx).expect("statement node");
        match node.kind {
            syntax_kind_ext::EMPTY_STATEMENT | syntax_kind_ext::FUNCTION_DECLARATION => Completion::Normal,
            syntax_kind_ext::BLOCK => {
                let statements = arena.get_statements(idx).expect("block").nodes.clone();
                self.run_statements(&statements)
            }
            syntax_kind_ext::VARIABLE_STATEMENT | syntax_kind_ext::VARIABLE_DECLARATION_LIST => {
                self.run_declarations(idx);
                Completion::Normal
            }
            syntax_kind_ext::EXPRESSION_STATEMENT => {
                let expr = arena.get_expression_statement(node).expect("expression").expression;
                self.evaluate(expr);
                Completion::Normal
            }
            syntax_kind_ext::IF_STATEMENT => {
                let stmt = arena.get_if_statement(node).expect("if").clone();
                if self.evaluate(stmt.expression).truthy() {
                    self.run_statement(stmt.then_statement)
                } else if stmt.else_statement.is_some() {
                    self.run_statement(stmt.else_statement)
                } else {
                    Completion::Normal
                }
            }
            syntax_kind_ext::FOR_STATEMENT | syntax_kind_ext::WHILE_STATEMENT => {
                let data = arena.get_loop(node).expect("loop").clone();
                if arena.is_kind(data.initializer, syntax_kind_ext::VARIABLE_DECLARATION_LIST) {
                    self.run_declarations(data.initializer);
                } else if data.initializer.is_some() {
                    self.evaluate(data.initializer);
                }
                loop {
                    if data.condition.is_some() && !self.evaluate(data.condition).truthy() {
                        return Completion::Normal;
                    }
                    match self.run_statement(data.statement) {
                        Completion::Break(None) => return Completion::Normal,
                        Completion::Normal => {}
                        Completion::Continue(target) if target.is_none() || target == own_label => {}
                        other => return other,
                    }
                    if data.incrementor.is_some() {
                        self.evaluate(data.incrementor);
                    }
                }
            }
            syntax_kind_ext::DO_STATEMENT => {
                let data = arena.get_loop(node).expect("loop").clone();
                loop {
                    match self.run_statement(data.statement) {
                        Completion::Break(None) => return Completion::Normal,
                        Completion::Normal => {}
                        Completion::Continue(target) if target.is_none() || target == own_label => {}
                        other => return other,
                    }
                    if !self.evaluate(data.condition).truthy() {
                        return Completion::Normal;
                    }
                }
            }
            syntax_kind_ext::SWITCH_STATEMENT => self.run_switch(idx),
            syntax_kind_ext::BREAK_STATEMENT | syntax_kind_ext::CONTINUE_STATEMENT => {
                let label = arena
                    .get_jump_data(node)
                    .and_then(|jump| arena.get_identifier_text(jump.label))
                    .map(str::to_string);
                if node.kind == syntax_kind_ext::BREAK_STATEMENT {
                    Completion::Break(label)
                } else {
                    Completion::Continue(label)
                }
            }
            syntax_kind_ext::RETURN_STATEMENT => {
                let expr = arena.get_return_statement(node).expect("return").expression;
                let value = if expr.is_some() {
                    self.evaluate(expr)
                } else {
                    Value::Undefined
                };
                Completion::Return(value)
            }
            syntax_kind_ext::LABELED_STATEMENT => {
                let data = arena.get_labeled_statement(node).expect("label").clone();
                let label = arena.get_identifier_text(data.label).map(str::to_string);
                self.loop_label = label.clone();
                match self.run_statement(data.statement) {
                    Completion::Break(Some(target)) if Some(&target) == label.as_ref() => Completion::Normal,
                    other => other,
                }
            }
            kind => panic!("statement kind {kind} is not supported"),
        }
    }

    fn run_declarations(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let declarations = arena
            .get(idx)
            .and_then(|node| arena.get_variable(node))
            .expect("declarations")
            .declarations
            .nodes
            .clone();
        for decl in declarations {
            let data = arena
                .get(decl)
                .and_then(|node| arena.get_variable_declaration(node))
                .expect("declarator")
                .clone();
            let name = arena.get_identifier_text(data.name).expect("simple binding").to_string();
            self.declare(&name);
            if data.initializer.is_some() {
                let value = self.evaluate(data.initializer);
                self.assign(&name, value);
            }
        }
    }

    fn run_switch(&mut self, idx: NodeIndex) -> Completion {
        let arena = self.arena;
        let data = arena.get(idx).and_then(|node| arena.get_switch(node)).expect("switch").clone();
        let discriminant = self.evaluate(data.expression);
        let clauses = data.clauses.nodes;
        let mut start = None;
        for (position, &clause) in clauses.iter().enumerate() {
            if arena.is_kind(clause, syntax_kind_ext::DEFAULT_CLAUSE) {
                continue;
            }
            let label = arena.get(clause).and_then(|node| arena.get_case_clause(node)).expect("case").expression;
            if strict_equals(&discriminant, &self.evaluate(label)) {
                start = Some(position);
                break;
            }
        }
        let start = start.or_else(|| {
            clauses
                .iter()
                .position(|&clause| arena.is_kind(clause, syntax_kind_ext::DEFAULT_CLAUSE))
        });
        let Some(start) = start else {
            return Completion::Normal;
        };
        for &clause in &clauses[start..] {
            let statements = arena.get_statements(clause).expect("clause").nodes.clone();
            match self.run_statements(&statements) {
                Completion::Normal => {}
                Completion::Break(None) => return Completion::Normal,
                other => return other,
            }
        }
        Completion::Normal
    }

    // Expressions

    fn call(&mut self, callee: &str, arguments: Vec<Value>) -> Value {
        if callee == "log" {
            let line: Vec<String> = arguments.iter().map(Value::to_js_string).collect();
            self.output.push(line.join(" "));
            return Value::Undefined;
        }
        let function = *self
            .functions
            .get(callee)
            .unwrap_or_else(|| panic!("unknown function '{callee}'"));
        let arena = self.arena;
        let data = arena.get(function).and_then(|node| arena.get_function(node)).expect("function").clone();
        let mut frame = FxHashMap::default();
        for (position, &parameter) in data.parameters.iter().enumerate() {
            let name = arena.get_identifier_text(parameter).expect("parameter name").to_string();
            frame.insert(name, arguments.get(position).cloned().unwrap_or(Value::Undefined));
        }
        self.frames.push(frame);
        let statements = arena.get_statements(data.body).expect("body").nodes.clone();
        let completion = self.run_statements(&statements);
        self.frames.pop();
        match completion {
            Completion::Return(value) => value,
            _ => Value::Undefined,
        }
    }

    fn evaluate(&mut self, idx: NodeIndex) -> Value {
        self.tick();
        let arena = self.arena;
        let node = arena.get(idx).expect("expression node");
        match node.kind {
            k if k == SyntaxKind::NumericLiteral as u16 => Value::Number(arena.get_numeric_value(idx).expect("number")),
            k if k == SyntaxKind::StringLiteral as u16 => {
                Value::String(arena.get_literal(node).expect("string").text.clone())
            }
            k if k == SyntaxKind::TrueKeyword as u16 => Value::Boolean(true),
            k if k == SyntaxKind::FalseKeyword as u16 => Value::Boolean(false),
            k if k == SyntaxKind::NullKeyword as u16 => Value::Null,
            k if k == SyntaxKind::Identifier as u16 => self.lookup(arena.get_identifier_text(idx).expect("name")),
            syntax_kind_ext::CALL_EXPRESSION => {
                let data = arena.get_call_expr(node).expect("call").clone();
                let callee = arena.get_identifier_text(data.expression).expect("plain callee").to_string();
                let arguments = data.arguments.iter().map(|&arg| self.evaluate(arg)).collect();
                self.call(&callee, arguments)
            }
            syntax_kind_ext::CONDITIONAL_EXPRESSION => {
                let data = arena.get_conditional_expr(node).expect("conditional").clone();
                if self.evaluate(data.condition).truthy() {
                    self.evaluate(data.when_true)
                } else {
                    self.evaluate(data.when_false)
                }
            }
            syntax_kind_ext::SEQUENCE_EXPRESSION => {
                let elements = arena.get_literal_expr(node).expect("sequence").elements.nodes.clone();
                let mut last = Value::Undefined;
                for element in elements {
                    last = self.evaluate(element);
                }
                last
            }
            syntax_kind_ext::PREFIX_UNARY_EXPRESSION | syntax_kind_ext::POSTFIX_UNARY_EXPRESSION => {
                let data = arena.get_unary_expr(node).expect("unary").clone();
                let prefix = node.kind == syntax_kind_ext::PREFIX_UNARY_EXPRESSION;
                self.unary(data.operator, data.operand, prefix)
            }
            syntax_kind_ext::BINARY_EXPRESSION => {
                let data = arena.get_binary_expr(node).expect("binary").clone();
                self.binary(data.left, data.operator_token, data.right)
            }
            kind => panic!("expression kind {kind} is not supported"),
        }
    }

    fn unary(&mut self, operator: SyntaxKind, operand: NodeIndex, prefix: bool) -> Value {
        if matches!(operator, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken) {
            let name = self.arena.get_identifier_text(operand).expect("update target").to_string();
            let old = self.lookup(&name).to_number();
            let new = if operator == SyntaxKind::PlusPlusToken { old + 1.0 } else { old - 1.0 };
            self.assign(&name, Value::Number(new));
            return Value::Number(if prefix { new } else { old });
        }
        let value = self.evaluate(operand);
        match operator {
            SyntaxKind::ExclamationToken => Value::Boolean(!value.truthy()),
            SyntaxKind::MinusToken => Value::Number(-value.to_number()),
            SyntaxKind::PlusToken => Value::Number(value.to_number()),
            SyntaxKind::TildeToken => Value::Number(f64::from(!value.to_int32())),
            SyntaxKind::TypeOfKeyword => Value::String(value.type_of().to_string()),
            SyntaxKind::VoidKeyword => Value::Undefined,
            other => panic!("unary operator {other:?} is not supported"),
        }
    }

    fn binary(&mut self, left: NodeIndex, operator: SyntaxKind, right: NodeIndex) -> Value {
        if operator == SyntaxKind::EqualsToken {
            let name = self.arena.get_identifier_text(left).expect("assignment target").to_string();
            let value = self.evaluate(right);
            self.assign(&name, value.clone());
            return value;
        }
        if let Some(underlying) = operator.compound_assignment_operator() {
            let name = self.arena.get_identifier_text(left).expect("assignment target").to_string();
            let old = self.lookup(&name);
            let value = self.evaluate(right);
            let result = apply(underlying, &old, &value);
            self.assign(&name, result.clone());
            return result;
        }
        let lhs = self.evaluate(left);
        match operator {
            SyntaxKind::AmpersandAmpersandToken => {
                if lhs.truthy() {
                    self.evaluate(right)
                } else {
                    lhs
                }
            }
            SyntaxKind::BarBarToken => {
                if lhs.truthy() {
                    lhs
                } else {
                    self.evaluate(right)
                }
            }
            SyntaxKind::CommaToken => self.evaluate(right),
            _ => {
                let rhs = self.evaluate(right);
                apply(operator, &lhs, &rhs)
            }
        }
    }
}

fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => a == b,
    }
}

fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        _ => a.to_number() == b.to_number(),
    }
}

fn apply(operator: SyntaxKind, lhs: &Value, rhs: &Value) -> Value {
    use SyntaxKind::*;
    let number = Value::Number;
    match operator {
        PlusToken => match (lhs, rhs) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", lhs.to_js_string(), rhs.to_js_string()))
            }
            _ => number(lhs.to_number() + rhs.to_number()),
        },
        MinusToken => number(lhs.to_number() - rhs.to_number()),
        AsteriskToken => number(lhs.to_number() * rhs.to_number()),
        SlashToken => number(lhs.to_number() / rhs.to_number()),
        PercentToken => number(lhs.to_number() % rhs.to_number()),
        AmpersandToken => number(f64::from(lhs.to_int32() & rhs.to_int32())),
        BarToken => number(f64::from(lhs.to_int32() | rhs.to_int32())),
        CaretToken => number(f64::from(lhs.to_int32() ^ rhs.to_int32())),
        LessThanLessThanToken => number(f64::from(lhs.to_int32().wrapping_shl(rhs.to_uint32() & 31))),
        GreaterThanGreaterThanToken => number(f64::from(lhs.to_int32() >> (rhs.to_uint32() & 31))),
        GreaterThanGreaterThanGreaterThanToken => number(f64::from(lhs.to_uint32() >> (rhs.to_uint32() & 31))),
        LessThanToken => Value::Boolean(lhs.to_number() < rhs.to_number()),
        LessThanEqualsToken => Value::Boolean(lhs.to_number() <= rhs.to_number()),
        GreaterThanToken => Value::Boolean(lhs.to_number() > rhs.to_number()),
        GreaterThanEqualsToken => Value::Boolean(lhs.to_number() >= rhs.to_number()),
        EqualsEqualsEqualsToken => Value::Boolean(strict_equals(lhs, rhs)),
        ExclamationEqualsEqualsToken => Value::Boolean(!strict_equals(lhs, rhs)),
        EqualsEqualsToken => Value::Boolean(loose_equals(lhs, rhs)),
        ExclamationEqualsToken => Value::Boolean(!loose_equals(lhs, rhs)),
        other => panic!("binary operator {other:?} is not supported"),
    }
}
