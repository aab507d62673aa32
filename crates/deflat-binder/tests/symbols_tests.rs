//! Tests for symbol declaration, reference resolution and constancy.

use deflat_binder::{BinderState, symbol_flags};
use deflat_parser::parser::syntax_kind_ext;
use deflat_parser::{NodeArena, NodeIndex, ParserState};
use deflat_scanner::SyntaxKind;

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
fn test_var_declaration_and_reference_share_symbol() {
    let (arena, root, binder) = bind("var a = 1; f(a);");
    let idents = identifiers_named(&arena, root, "a");
    assert_eq!(idents.len(), 2);
    let decl = binder.resolve_identifier(idents[0]).unwrap();
    let reference = binder.resolve_identifier(idents[1]).unwrap();
    assert_eq!(decl, reference);
    let symbol = binder.get_symbol(decl).unwrap();
    assert!(symbol.has_flags(symbol_flags::FUNCTION_SCOPED_VARIABLE));
    assert_eq!(symbol.references, vec![idents[1]]);
    assert!(symbol.constant);
}

#[test]
fn test_assignment_makes_binding_non_constant() {
    let (arena, root, binder) = bind("var a = 1; a = 2;");
    let idents = identifiers_named(&arena, root, "a");
    assert!(!binder.is_constant(idents[0]));
    let symbol = binder.symbol_of(idents[0]).unwrap();
    assert_eq!(symbol.constant_violations, vec![idents[1]]);
}

#[test]
fn test_compound_assignment_and_update_are_writes() {
    let (arena, root, binder) = bind("var a = 1, b = 2; a += 1; b++;");
    assert!(!binder.is_constant(identifiers_named(&arena, root, "a")[0]));
    assert!(!binder.is_constant(identifiers_named(&arena, root, "b")[0]));
}

#[test]
fn test_redeclaration_makes_binding_non_constant() {
    let (arena, root, binder) = bind("var a = 1; var a = 2;");
    let idents = identifiers_named(&arena, root, "a");
    assert_eq!(binder.resolve_identifier(idents[0]), binder.resolve_identifier(idents[1]));
    assert!(!binder.is_constant(idents[0]));
}

#[test]
fn test_reads_keep_binding_constant() {
    let (arena, root, binder) = bind("var m = 3 & k; g(m + 1, -m, !m);");
    assert!(binder.is_constant(identifiers_named(&arena, root, "m")[0]));
}

#[test]
fn test_property_names_are_not_references() {
    let (arena, root, binder) = bind("var a = 1; o.a = { a: a };");
    let idents = identifiers_named(&arena, root, "a");
    // declaration, property name, object key, value
    assert_eq!(idents.len(), 4);
    assert!(binder.resolve_identifier(idents[1]).is_none());
    assert!(binder.resolve_identifier(idents[2]).is_none());
    assert!(binder.resolve_identifier(idents[3]).is_some());
    assert!(binder.is_constant(idents[0]));
}

#[test]
fn test_globals_are_unresolved() {
    let (arena, root, binder) = bind("console.log(undefined);");
    let console = identifiers_named(&arena, root, "console")[0];
    assert!(binder.resolve_identifier(console).is_none());
    assert_eq!(binder.unresolved.len(), 2);
    assert!(!binder.is_constant(console));
}

#[test]
fn test_function_declaration_is_hoisted() {
    let (arena, root, binder) = bind("f(); function f() {}");
    let idents = identifiers_named(&arena, root, "f");
    let symbol = binder.symbol_of(idents[0]).unwrap();
    assert!(symbol.has_flags(symbol_flags::FUNCTION));
    assert_eq!(symbol.declarations.as_slice(), &[idents[1]]);
}

#[test]
fn test_labels_are_not_references() {
    let (arena, root, binder) = bind("loop: for (;;) { break loop; }");
    for ident in identifiers_named(&arena, root, "loop") {
        assert!(binder.resolve_identifier(ident).is_none());
    }
    assert!(binder.unresolved.is_empty());
}

#[test]
fn test_for_in_head_is_a_write() {
    let (arena, root, binder) = bind("for (var k in o) { g(k); }");
    assert!(!binder.is_constant(identifiers_named(&arena, root, "k")[0]));
}

#[test]
fn test_reference_kinds_are_identifiers() {
    let (arena, root, binder) = bind("var x = 1; x;");
    for (&node, _) in binder.node_symbols.iter() {
        assert!(arena.is_kind(NodeIndex(node), SyntaxKind::Identifier as u16));
    }
    assert!(arena.descendants(root).iter().any(|&n| arena.is_kind(n, syntax_kind_ext::VARIABLE_DECLARATION)));
}
