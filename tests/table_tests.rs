//! Tests for LL(k) table assembly.

use llkgen::bnf;
use llkgen::error::GrammarError;
use llkgen::first::kfirst;
use llkgen::follow::kfollow;
use llkgen::table::{build_table, ParseTable};
use llkgen::{Grammar, Lookahead, Result, Symbol};

fn build(text: &str, k: usize) -> Result<ParseTable> {
    let grammar = Grammar::from_ast(bnf::parse(text).unwrap()).unwrap();
    let first = kfirst(&grammar, k);
    let follow = kfollow(&grammar, k)?;
    build_table(&grammar, &first, &follow)
}

fn single(text: &str) -> Lookahead {
    Lookahead::Single(Symbol::terminal(text))
}

#[test]
fn test_trivial_grammar_cell() {
    let table = build("start: <S>\n<S> ::= \"a\"", 1).unwrap();
    let production = &table["S"][&single("a")];
    assert_eq!(production.lhs, "S");
    assert_eq!(production.rhs.symbols(), &[Symbol::terminal("a")]);
}

#[test]
fn test_alternation_selects_by_first_token() {
    let table = build("start: <S>\n<S> ::= <A> | <B>\n<A> ::= \"a\"\n<B> ::= \"b\"", 1).unwrap();
    assert_eq!(
        table["S"][&single("a")].rhs.symbols(),
        &[Symbol::nonterminal("A")]
    );
    assert_eq!(
        table["S"][&single("b")].rhs.symbols(),
        &[Symbol::nonterminal("B")]
    );
}

#[test]
fn test_nullable_cell_indexed_by_follow() {
    let table = build("start: <S>\n<S> ::= <A> \"b\"\n<A> ::= \"a\" | ε", 1).unwrap();
    let cell = &table["A"][&single("b")];
    assert!(cell.rhs.is_pure_epsilon());
    // The "a" cell still picks the non-ε production.
    assert_eq!(
        table["A"][&single("a")].rhs.symbols(),
        &[Symbol::terminal("a")]
    );
}

#[test]
fn test_recursive_list_cells() {
    let table = build("start: <L>\n<L> ::= \"x\" <L> | ε", 1).unwrap();
    let x_cell = &table["L"][&single("x")];
    assert_eq!(
        x_cell.rhs.symbols(),
        &[Symbol::terminal("x"), Symbol::nonterminal("L")]
    );
    let end_cell = &table["L"][&Lookahead::Single(Symbol::EndMarker)];
    assert!(end_cell.rhs.is_pure_epsilon());
}

#[test]
fn test_common_prefix_is_ambiguous_at_k1() {
    let err = build("start: <S>\n<S> ::= \"a\" \"b\" | \"a\" \"c\"", 1).unwrap_err();
    assert!(matches!(err, GrammarError::AmbiguousGrammar { .. }));
}

#[test]
fn test_common_prefix_resolves_at_k2() {
    let table = build("start: <S>\n<S> ::= \"a\" \"b\" | \"a\" \"c\"", 2).unwrap();
    let ab = Lookahead::Tuple(vec![Symbol::terminal("a"), Symbol::terminal("b")]);
    let ac = Lookahead::Tuple(vec![Symbol::terminal("a"), Symbol::terminal("c")]);
    assert_eq!(table["S"][&ab].rhs.symbols()[1], Symbol::terminal("b"));
    assert_eq!(table["S"][&ac].rhs.symbols()[1], Symbol::terminal("c"));
}

#[test]
fn test_left_recursion_is_ambiguous() {
    let err = build("start: <E>\n<E> ::= <E> \"+\" | \"x\"", 1).unwrap_err();
    assert!(matches!(err, GrammarError::AmbiguousGrammar { .. }));
}

#[test]
fn test_every_cell_holds_one_production() {
    let table = build(
        "start: <S>\n<S> ::= <A> <B>\n<A> ::= \"a\" | ε\n<B> ::= \"b\"",
        1,
    )
    .unwrap();
    for row in table.values() {
        for production in row.values() {
            assert!(!production.rhs.is_empty());
        }
    }
}
