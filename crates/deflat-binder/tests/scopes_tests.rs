//! Tests for scope construction and name resolution through the scope chain.

use deflat_binder::{BinderState, ContainerKind, symbol_flags};
use deflat_parser::{NodeArena, NodeIndex, ParserState};

fn bind(source: &str) -> (NodeArena, NodeIndex, BinderState) {
    let (arena, root, diagnostics) = ParserState::parse("test.js", source);
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    let binder = BinderState::bind(&arena, root);
    (arena, root, binder)
}

fn identifiers_named(arena: &NodeArena, root: NodeIndex, name: &str) -> Vec<NodeIndex> {
    arena
        .descendants(root)
        .into_iter()
        .filter(|&n| arena.is_identifier_named(n, name))
        .collect()
}

#[test]
fn test_source_file_scope_is_first() {
    let (_, root, binder) = bind("var a;");
    assert_eq!(binder.scopes[0].kind, ContainerKind::SourceFile);
    assert_eq!(binder.scopes[0].container_node, root);
    assert!(binder.scopes[0].table.has("a"));
}

#[test]
fn test_parameter_shadows_outer_variable() {
    let (arena, root, binder) = bind("var a = 1; function f(a) { return a; } g(a);");
    let idents = identifiers_named(&arena, root, "a");
    // outer decl, parameter, inner reference, outer reference
    assert_eq!(idents.len(), 4);
    let outer = binder.resolve_identifier(idents[0]).unwrap();
    let param = binder.resolve_identifier(idents[1]).unwrap();
    assert_ne!(outer, param);
    assert_eq!(binder.resolve_identifier(idents[2]), Some(param));
    assert_eq!(binder.resolve_identifier(idents[3]), Some(outer));
    assert!(binder.get_symbol(param).unwrap().has_flags(symbol_flags::PARAMETER));
}

#[test]
fn test_var_hoists_out_of_blocks() {
    let (arena, root, binder) = bind("function f() { if (c) { var v = 1; } return v; }");
    let idents = identifiers_named(&arena, root, "v");
    assert_eq!(binder.resolve_identifier(idents[0]), binder.resolve_identifier(idents[1]));
    let symbol = binder.symbol_of(idents[0]).unwrap();
    assert_eq!(binder.scopes[symbol.scope.0 as usize].kind, ContainerKind::Function);
}

#[test]
fn test_let_is_block_scoped() {
    let (arena, root, binder) = bind("{ let v = 1; } g(v);");
    let idents = identifiers_named(&arena, root, "v");
    assert!(binder.resolve_identifier(idents[0]).is_some());
    assert!(binder.resolve_identifier(idents[1]).is_none());
}

#[test]
fn test_function_expression_name_is_local() {
    let (arena, root, binder) = bind("var h = function inner() { return inner; }; g(inner);");
    let idents = identifiers_named(&arena, root, "inner");
    assert_eq!(binder.resolve_identifier(idents[0]), binder.resolve_identifier(idents[1]));
    assert!(binder.resolve_identifier(idents[2]).is_none());
}

#[test]
fn test_catch_parameter_scope() {
    let (arena, root, binder) = bind("try { a(); } catch (e) { g(e); } g(e);");
    let idents = identifiers_named(&arena, root, "e");
    let symbol = binder.resolve_identifier(idents[0]).unwrap();
    assert!(binder.get_symbol(symbol).unwrap().has_flags(symbol_flags::CATCH_VARIABLE));
    assert_eq!(binder.resolve_identifier(idents[1]), Some(symbol));
    assert!(binder.resolve_identifier(idents[2]).is_none());
}

#[test]
fn test_lookup_name_at_uses_enclosing_scope() {
    let (arena, root, binder) = bind("var x = 1; function f() { var y = 2; g(); }");
    let g = identifiers_named(&arena, root, "g")[0];
    assert!(binder.lookup_name_at(&arena, g, "y").is_some());
    assert!(binder.lookup_name_at(&arena, g, "x").is_some());
    assert!(binder.lookup_name_at(&arena, root, "y").is_none());
}

#[test]
fn test_loop_head_var_belongs_to_function() {
    let (arena, root, binder) = bind("function f() { for (var i = 0; i < 3; i++) {} return i; }");
    let idents = identifiers_named(&arena, root, "i");
    let symbol = binder.resolve_identifier(idents[0]).unwrap();
    assert!(idents.iter().all(|&i| binder.resolve_identifier(i) == Some(symbol)));
    assert!(!binder.get_symbol(symbol).unwrap().constant);
}
