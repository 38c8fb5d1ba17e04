//! End-to-end tests for `generate_parser`.

use llkgen::error::GrammarError;
use llkgen::generate_parser;

#[test]
fn test_trivial_grammar_emits_parser() {
    let source = generate_parser("start: <S>\n<S> ::= \"a\"", None, 1).unwrap();
    assert!(source.contains("pub const K: usize = 1;"));
    assert!(source.contains("pub const START_SYMBOL: &str = \"S\";"));
    assert!(source.contains("(&[\"a\"], (\"S\", &[\"a\"])),"));
    assert!(source.contains("pub struct Parser<T, I>"));
    assert!(source.contains("pub fn parse(mut self)"));
}

#[test]
fn test_imports_are_spliced_verbatim() {
    let source = generate_parser(
        "start: <S>\n<S> ::= \"a\"",
        Some("use crate::tokens::MyToken;"),
        1,
    )
    .unwrap();
    assert!(source.contains("use crate::tokens::MyToken;"));
}

#[test]
fn test_k1_rejects_common_prefix() {
    let err = generate_parser("start: <S>\n<S> ::= \"a\" \"b\" | \"a\" \"c\"", None, 1).unwrap_err();
    match err {
        GrammarError::AmbiguousGrammar { nonterminal, .. } => assert_eq!(nonterminal, "S"),
        other => panic!("expected AmbiguousGrammar, got {:?}", other),
    }
}

#[test]
fn test_k2_accepts_common_prefix() {
    let source =
        generate_parser("start: <S>\n<S> ::= \"a\" \"b\" | \"a\" \"c\"", None, 2).unwrap();
    assert!(source.contains("pub const K: usize = 2;"));
    assert!(source.contains("(&[\"a\", \"b\"], (\"S\", &[\"a\", \"b\"])),"));
    assert!(source.contains("(&[\"a\", \"c\"], (\"S\", &[\"a\", \"c\"])),"));
}

#[test]
fn test_recursive_list_cells_are_emitted() {
    let source = generate_parser("start: <L>\n<L> ::= \"x\" <L> | ε", None, 1).unwrap();
    assert!(source.contains("(&[\"x\"], (\"L\", &[\"x\", \"L\"])),"));
    assert!(source.contains("(&[\"$\"], (\"L\", &[\"ε\"])),"));
}

#[test]
fn test_missing_start_marker_fails() {
    let err = generate_parser("<S> ::= \"a\"", None, 1).unwrap_err();
    assert!(matches!(err, GrammarError::MissingStart));
}

#[test]
fn test_unknown_symbol_fails() {
    let err = generate_parser("start: <S>\n<S> ::= <Ghost>", None, 1).unwrap_err();
    assert!(matches!(err, GrammarError::UnknownSymbol(_)));
}

#[test]
fn test_zero_lookahead_is_rejected() {
    let err = generate_parser("start: <S>\n<S> ::= \"a\"", None, 0).unwrap_err();
    assert!(matches!(err, GrammarError::InvalidFormat(_)));
}

#[test]
fn test_generation_is_deterministic() {
    let text = "start: <S>\n<S> ::= <A> <B>\n<A> ::= \"a\" | ε\n<B> ::= \"b\"";
    let a = generate_parser(text, None, 2).unwrap();
    let b = generate_parser(text, None, 2).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_emitted_source_has_no_generator_dependencies() {
    let source = generate_parser("start: <S>\n<S> ::= \"a\"", None, 1).unwrap();
    assert!(!source.contains("llkgen::"));
    assert!(!source.contains("use itertools"));
    assert!(!source.contains("use log"));
}
