//! Parser tests: statement shapes, precedence, ASI and diagnostics.

use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex, ParserState};
use deflat_scanner::SyntaxKind;

fn parse(source: &str) -> (NodeArena, NodeIndex) {
    let mut parser = ParserState::new("test.js".to_string(), source.to_string());
    let root = parser.parse_source_file();
    assert!(
        parser.parse_diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        parser.parse_diagnostics
    );
    (parser.into_arena(), root)
}

fn statements(arena: &NodeArena, container: NodeIndex) -> Vec<NodeIndex> {
    arena
        .get_statements(container)
        .map(|list| list.nodes.clone())
        .unwrap_or_default()
}

fn expression_of(arena: &NodeArena, statement: NodeIndex) -> NodeIndex {
    let node = arena.get(statement).expect("statement");
    arena.get_expression_statement(node).expect("expression statement").expression
}

#[test]
fn test_parse_variable_statement_flags() {
    let (arena, root) = parse("var a = 1, b; let c = 2; const d = 3;");
    let stmts = statements(&arena, root);
    assert_eq!(stmts.len(), 3);
    let var_data = arena.get_variable(arena.get(stmts[0]).unwrap()).unwrap();
    assert_eq!(var_data.declarations.len(), 2);
    assert!(arena.flags(stmts[0]).is_empty());
    assert!(arena.flags(stmts[1]).contains(deflat_parser::parser::flags::NodeFlags::LET));
    assert!(arena.flags(stmts[2]).contains(deflat_parser::parser::flags::NodeFlags::CONST));
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let (arena, root) = parse("x = 1 + 2 * 3;");
    let assign = expression_of(&arena, statements(&arena, root)[0]);
    let assign_data = arena.get_binary_expr(arena.get(assign).unwrap()).unwrap();
    assert_eq!(assign_data.operator_token, SyntaxKind::EqualsToken);
    let sum = arena.get_binary_expr(arena.get(assign_data.right).unwrap()).unwrap();
    assert_eq!(sum.operator_token, SyntaxKind::PlusToken);
    let product = arena.get_binary_expr(arena.get(sum.right).unwrap()).unwrap();
    assert_eq!(product.operator_token, SyntaxKind::AsteriskToken);
}

#[test]
fn test_assignment_is_right_associative() {
    let (arena, root) = parse("a = b = 1;");
    let outer = expression_of(&arena, statements(&arena, root)[0]);
    let outer_data = arena.get_binary_expr(arena.get(outer).unwrap()).unwrap();
    assert!(arena.is_identifier_named(outer_data.left, "a"));
    assert!(arena.is_kind(outer_data.right, syntax_kind_ext::BINARY_EXPRESSION));
}

#[test]
fn test_parentheses_are_dropped() {
    let (arena, root) = parse("x = (1 + 2) * 3;");
    let assign = expression_of(&arena, statements(&arena, root)[0]);
    let right = arena.get_binary_expr(arena.get(assign).unwrap()).unwrap().right;
    let product = arena.get_binary_expr(arena.get(right).unwrap()).unwrap();
    assert_eq!(product.operator_token, SyntaxKind::AsteriskToken);
    assert!(arena.is_kind(product.left, syntax_kind_ext::BINARY_EXPRESSION));
}

#[test]
fn test_comma_builds_sequence_expression() {
    let (arena, root) = parse("a(), b(), c();");
    let seq = expression_of(&arena, statements(&arena, root)[0]);
    assert!(arena.is_kind(seq, syntax_kind_ext::SEQUENCE_EXPRESSION));
    let data = arena.get_literal_expr(arena.get(seq).unwrap()).unwrap();
    assert_eq!(data.elements.len(), 3);
}

#[test]
fn test_for_statement_with_declaration_init() {
    let (arena, root) = parse("for (var i = 0; i < 10; i++) { f(i); }");
    let stmt = statements(&arena, root)[0];
    assert!(arena.is_kind(stmt, syntax_kind_ext::FOR_STATEMENT));
    let data = arena.get_loop(arena.get(stmt).unwrap()).unwrap();
    assert!(arena.is_kind(data.initializer, syntax_kind_ext::VARIABLE_DECLARATION_LIST));
    assert!(arena.is_kind(data.condition, syntax_kind_ext::BINARY_EXPRESSION));
    assert!(arena.is_kind(data.incrementor, syntax_kind_ext::POSTFIX_UNARY_EXPRESSION));
    assert!(arena.is_kind(data.statement, syntax_kind_ext::BLOCK));
}

#[test]
fn test_for_in_statement() {
    let (arena, root) = parse("for (var k in o) { g(k); }");
    let stmt = statements(&arena, root)[0];
    assert!(arena.is_kind(stmt, syntax_kind_ext::FOR_IN_STATEMENT));
}

#[test]
fn test_empty_for_header() {
    let (arena, root) = parse("for (;;) { break; }");
    let stmt = statements(&arena, root)[0];
    let data = arena.get_loop(arena.get(stmt).unwrap()).unwrap();
    assert!(data.initializer.is_none());
    assert!(data.condition.is_none());
    assert!(data.incrementor.is_none());
}

#[test]
fn test_switch_with_default_clause() {
    let (arena, root) = parse("switch (s) { case 0: a(); break; case 1: default: b(); }");
    let stmt = statements(&arena, root)[0];
    let data = arena.get_switch(arena.get(stmt).unwrap()).unwrap();
    assert_eq!(data.clauses.len(), 3);
    let kinds: Vec<u16> = data.clauses.iter().filter_map(|&c| arena.kind(c)).collect();
    assert_eq!(
        kinds,
        vec![
            syntax_kind_ext::CASE_CLAUSE,
            syntax_kind_ext::CASE_CLAUSE,
            syntax_kind_ext::DEFAULT_CLAUSE
        ]
    );
    assert_eq!(statements(&arena, data.clauses.nodes[0]).len(), 2);
    assert!(statements(&arena, data.clauses.nodes[1]).is_empty());
}

#[test]
fn test_asi_at_line_break() {
    let (arena, root) = parse("a = 1\nb = 2\n");
    assert_eq!(statements(&arena, root).len(), 2);
}

#[test]
fn test_postfix_increment_requires_same_line() {
    let (arena, root) = parse("a\n++b");
    let stmts = statements(&arena, root);
    assert_eq!(stmts.len(), 2);
    let second = expression_of(&arena, stmts[1]);
    assert!(arena.is_kind(second, syntax_kind_ext::PREFIX_UNARY_EXPRESSION));
}

#[test]
fn test_void_and_not_unary_operators() {
    let (arena, root) = parse("x = void 0; !function () {}();");
    let stmts = statements(&arena, root);
    let assign = expression_of(&arena, stmts[0]);
    let right = arena.get_binary_expr(arena.get(assign).unwrap()).unwrap().right;
    let unary = arena.get_unary_expr(arena.get(right).unwrap()).unwrap();
    assert_eq!(unary.operator, SyntaxKind::VoidKeyword);

    let not = expression_of(&arena, stmts[1]);
    let not_data = arena.get_unary_expr(arena.get(not).unwrap()).unwrap();
    assert_eq!(not_data.operator, SyntaxKind::ExclamationToken);
    assert!(arena.is_kind(not_data.operand, syntax_kind_ext::CALL_EXPRESSION));
}

#[test]
fn test_member_and_call_chain() {
    let (arena, root) = parse("console.log(a[b + 1], new Foo(1).bar);");
    let call = expression_of(&arena, statements(&arena, root)[0]);
    let data = arena.get_call_expr(arena.get(call).unwrap()).unwrap();
    assert!(arena.is_kind(data.expression, syntax_kind_ext::PROPERTY_ACCESS_EXPRESSION));
    assert_eq!(data.arguments.len(), 2);
    assert!(arena.is_kind(data.arguments.nodes[0], syntax_kind_ext::ELEMENT_ACCESS_EXPRESSION));
    let member = arena.get_access_expr(arena.get(data.arguments.nodes[1]).unwrap()).unwrap();
    assert!(arena.is_kind(member.expression, syntax_kind_ext::NEW_EXPRESSION));
}

#[test]
fn test_keyword_property_name() {
    let (arena, root) = parse("a.default = { if: 1, 'x y': 2, 3: 4 };");
    let assign = expression_of(&arena, statements(&arena, root)[0]);
    let data = arena.get_binary_expr(arena.get(assign).unwrap()).unwrap();
    let access = arena.get_access_expr(arena.get(data.left).unwrap()).unwrap();
    assert!(arena.is_identifier_named(access.name_or_argument, "default"));
    let object = arena.get_literal_expr(arena.get(data.right).unwrap()).unwrap();
    assert_eq!(object.elements.len(), 3);
}

#[test]
fn test_conditional_expression() {
    let (arena, root) = parse("x = a ? b : c ? d : e;");
    let assign = expression_of(&arena, statements(&arena, root)[0]);
    let right = arena.get_binary_expr(arena.get(assign).unwrap()).unwrap().right;
    let cond = arena.get_conditional_expr(arena.get(right).unwrap()).unwrap();
    assert!(arena.is_kind(cond.when_false, syntax_kind_ext::CONDITIONAL_EXPRESSION));
}

#[test]
fn test_regex_literal_in_expression_position() {
    let (arena, root) = parse("r = /a+b/g.test(s);");
    let assign = expression_of(&arena, statements(&arena, root)[0]);
    let right = arena.get_binary_expr(arena.get(assign).unwrap()).unwrap().right;
    let call = arena.get_call_expr(arena.get(right).unwrap()).unwrap();
    let access = arena.get_access_expr(arena.get(call.expression).unwrap()).unwrap();
    let literal = arena.get_literal(arena.get(access.expression).unwrap()).unwrap();
    assert_eq!(literal.text, "/a+b/g");
}

#[test]
fn test_numeric_literal_values() {
    let (arena, root) = parse("x = 0x1f; y = 1e3;");
    let stmts = statements(&arena, root);
    let hex = arena.get_binary_expr(arena.get(expression_of(&arena, stmts[0])).unwrap()).unwrap().right;
    assert_eq!(arena.get_numeric_value(hex), Some(31.0));
    let exp = arena.get_binary_expr(arena.get(expression_of(&arena, stmts[1])).unwrap()).unwrap().right;
    assert_eq!(arena.get_numeric_value(exp), Some(1000.0));
}

#[test]
fn test_function_declaration_and_parameters() {
    let (arena, root) = parse("function f(a, b) { return a + b; }");
    let stmt = statements(&arena, root)[0];
    let data = arena.get_function(arena.get(stmt).unwrap()).unwrap();
    assert!(arena.is_identifier_named(data.name, "f"));
    assert_eq!(data.parameters.len(), 2);
    let body = statements(&arena, data.body);
    assert!(arena.is_kind(body[0], syntax_kind_ext::RETURN_STATEMENT));
}

#[test]
fn test_try_catch_finally() {
    let (arena, root) = parse("try { a(); } catch (e) { b(e); } finally { c(); }");
    let stmt = statements(&arena, root)[0];
    let data = arena.get_try(arena.get(stmt).unwrap()).unwrap();
    assert!(data.catch_clause.is_some());
    assert!(data.finally_block.is_some());
}

#[test]
fn test_parent_links_are_set() {
    let (arena, root) = parse("if (a) { b(); } else { c(); }");
    let stmt = statements(&arena, root)[0];
    assert_eq!(arena.get_parent(stmt), root);
    let data = arena.get_if_statement(arena.get(stmt).unwrap()).unwrap();
    assert_eq!(arena.get_parent(data.expression), stmt);
    assert_eq!(arena.get_parent(data.then_statement), stmt);
    assert_eq!(arena.get_parent(data.else_statement), stmt);
    for &inner in &statements(&arena, data.then_statement) {
        assert_eq!(arena.get_parent(inner), data.then_statement);
    }
}

#[test]
fn test_labeled_loop_with_labeled_continue() {
    let (arena, root) = parse("outer: for (;;) { continue outer; }");
    let stmt = statements(&arena, root)[0];
    assert!(arena.is_kind(stmt, syntax_kind_ext::LABELED_STATEMENT));
}

#[test]
fn test_comments_are_recorded_on_source_file() {
    let (arena, root) = parse("// leading\na(); /* trailing */");
    let file = arena.get_source_file(arena.get(root).unwrap()).unwrap();
    assert_eq!(file.comments.len(), 2);
    assert!(file.comments[1].is_multi_line);
}

// =============================================================================
// Diagnostics
// =============================================================================

fn diagnostics(source: &str) -> Vec<u32> {
    let (_, _, diags) = ParserState::parse("test.js", source);
    diags.into_iter().map(|d| d.code).collect()
}

#[test]
fn test_missing_expression_reports_error() {
    let codes = diagnostics("x = ;");
    assert!(codes.contains(&1109), "codes: {codes:?}");
}

#[test]
fn test_return_outside_function_reports_error() {
    let codes = diagnostics("return 1;");
    assert!(codes.contains(&1108), "codes: {codes:?}");
}

#[test]
fn test_return_inside_function_is_fine() {
    assert!(diagnostics("function f() { return 1; }").is_empty());
    assert!(diagnostics("x = function () { if (a) { return; } };").is_empty());
}

#[test]
fn test_unclosed_block_reports_error() {
    let codes = diagnostics("function f() { a();");
    assert!(codes.contains(&1005), "codes: {codes:?}");
}

#[test]
fn test_stray_close_brace_does_not_loop() {
    let codes = diagnostics("a(); } b();");
    assert_eq!(codes, vec![1128]);
}

#[test]
fn test_deep_nesting_is_bounded() {
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let source = format!("x = {}1{};", "(".repeat(2000), ")".repeat(2000));
            diagnostics(&source)
        })
        .unwrap();
    let codes = handle.join().unwrap();
    assert!(codes.contains(&1200), "codes: {codes:?}");
}
