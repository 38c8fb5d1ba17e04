//! Tests for BNF reading and the grammar model.

use llkgen::bnf;
use llkgen::{Grammar, GrammarError, Symbol};

fn grammar(text: &str) -> Grammar {
    Grammar::from_ast(bnf::parse(text).unwrap()).unwrap()
}

#[test]
fn test_parse_simple_grammar() {
    let g = grammar("start: <S>\n<S> ::= <A> <B>\n<A> ::= \"a\"\n<B> ::= \"b\"");
    assert_eq!(g.productions().len(), 3);
    assert_eq!(g.start(), "S");
    assert_eq!(g.rhss_of("A").len(), 1);
}

#[test]
fn test_parse_alternatives() {
    let g = grammar("start: <S>\n<S> ::= \"a\" | \"b\" | \"c\"");
    assert_eq!(g.productions().len(), 3);
    assert_eq!(g.rhss_of("S").len(), 3);
}

#[test]
fn test_continuation_lines() {
    let g = grammar("start: <S>\n<S> ::= \"a\"\n    | \"b\"");
    assert_eq!(g.rhss_of("S").len(), 2);
}

#[test]
fn test_epsilon_production() {
    let g = grammar("start: <S>\n<S> ::= \"a\" | ε");
    assert!(g.rhss_of("S")[1].is_pure_epsilon());
}

#[test]
fn test_missing_start_marker() {
    let err = bnf::parse("<S> ::= \"a\"").unwrap_err();
    assert!(matches!(err, GrammarError::MissingStart));
}

#[test]
fn test_unknown_rhs_symbol() {
    let ast = bnf::parse("start: <S>\n<S> ::= <Nope>").unwrap();
    let err = Grammar::from_ast(ast).unwrap_err();
    assert!(matches!(err, GrammarError::UnknownSymbol(name) if name.contains("Nope")));
}

#[test]
fn test_terminal_backslashes_are_stripped() {
    let g = grammar("start: <S>\n<S> ::= \"a\\\\b\"");
    assert_eq!(g.rhss_of("S")[0].symbols(), &[Symbol::terminal("ab")]);
}

#[test]
fn test_get_exact_lengths() {
    let g = grammar("start: <L>\n<L> ::= \"x\" <L> | ε");
    let l = Symbol::nonterminal("L");
    assert_eq!(g.get_exact(&l, 0).len(), 1);
    assert_eq!(g.get_exact(&l, 3).len(), 1);
    assert_eq!(
        g.get_exact(&l, 3)[0].symbols(),
        &[
            Symbol::terminal("x"),
            Symbol::terminal("x"),
            Symbol::terminal("x")
        ]
    );
}
