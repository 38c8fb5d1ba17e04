//! Derivation search: can a sequence derive a string with a given
//! terminal prefix?
//!
//! Used by table assembly to map each FIRST entry back to the unique
//! production that produces it.

use std::collections::VecDeque;

use crate::grammar::{Grammar, Production};
use crate::subproduction::SubProduction;
use crate::symbol::{Lookahead, Symbol};

/// Per-production step allowance for the `matches` search.
const MATCH_SEARCH_BUDGET: usize = 500;

/// Tests whether `rhs` can derive a string beginning with `lookahead`.
///
/// Breadth-first over sentential forms: terminal prefixes are peeled
/// against the lookahead, a leading nonterminal is replaced by each of
/// its right-hand sides (ε-productions simply vanish). The branch is
/// accepted once the lookahead is exhausted. A step budget bounds
/// recursive grammars; branches beyond it are abandoned as non-matching.
pub fn matches(grammar: &Grammar, rhs: &SubProduction, lookahead: &[Symbol]) -> bool {
    let mut queue: VecDeque<(Vec<Symbol>, Vec<Symbol>)> = VecDeque::new();
    queue.push_back((rhs.symbols().to_vec(), lookahead.to_vec()));

    let mut budget =
        MATCH_SEARCH_BUDGET * grammar.productions().len().max(1) * lookahead.len().max(1);
    while let Some((children, remaining)) = queue.pop_front() {
        if budget == 0 {
            return false;
        }
        budget -= 1;

        if children.is_empty() || remaining.is_empty() {
            continue;
        }

        // Peel matching terminals off the front.
        let mut i = 0;
        let mut mismatch = false;
        while i < children.len() && i < remaining.len() && !children[i].is_nonterminal() {
            if children[i].token_text() != remaining[i].token_text() {
                mismatch = true;
                break;
            }
            i += 1;
        }
        if mismatch {
            continue;
        }
        let children = children[i..].to_vec();
        let remaining = remaining[i..].to_vec();

        if remaining.is_empty() {
            return true;
        }
        if children.is_empty() {
            continue;
        }

        let head = match &children[0] {
            Symbol::Nonterminal(name) => name.clone(),
            // A terminal stopped the peel, which only happens at the
            // remaining-side bound; that branch was already accepted.
            _ => continue,
        };
        let rest = &children[1..];
        for expansion in grammar.rhss_of(&head) {
            if expansion.is_pure_epsilon() {
                queue.push_back((rest.to_vec(), remaining.clone()));
            } else {
                let mut spliced = expansion.symbols().to_vec();
                spliced.extend(rest.iter().cloned());
                queue.push_back((spliced, remaining.clone()));
            }
        }
    }

    false
}

/// Tests whether a sequence can derive ε.
pub fn nullable(grammar: &Grammar, sequence: &SubProduction) -> bool {
    fn symbol_nullable(grammar: &Grammar, symbol: &Symbol, active: &mut Vec<String>) -> bool {
        match symbol {
            Symbol::Epsilon => true,
            Symbol::Nonterminal(name) => {
                if active.iter().any(|n| n == name) {
                    return false;
                }
                active.push(name.clone());
                let result = grammar.rhss_of(name).iter().any(|rhs| {
                    rhs.iter().all(|s| symbol_nullable(grammar, s, active))
                });
                active.pop();
                result
            }
            Symbol::Terminal(_) | Symbol::EndMarker => false,
        }
    }

    let mut active = Vec::new();
    sequence
        .iter()
        .all(|s| symbol_nullable(grammar, s, &mut active))
}

/// Returns every production of `nonterm` whose rhs can begin a
/// derivation matching `lookahead`. The ε lookahead selects the
/// productions whose rhs derives the empty string.
pub fn productions_leading_to(
    grammar: &Grammar,
    nonterm: &str,
    lookahead: &Lookahead,
) -> Vec<Production> {
    grammar
        .rhss_of(nonterm)
        .iter()
        .filter(|rhs| {
            if lookahead.is_epsilon() {
                nullable(grammar, rhs)
            } else {
                matches(grammar, rhs, lookahead.symbols())
            }
        })
        .map(|rhs| Production::new(nonterm, rhs.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bnf;

    fn grammar(text: &str) -> Grammar {
        Grammar::from_ast(bnf::parse(text).unwrap()).unwrap()
    }

    #[test]
    fn matches_through_nonterminals() {
        let g = grammar("start: <S>\n<S> ::= <A> \"b\"\n<A> ::= \"a\" | ε");
        let rhs = g.rhss_of("S")[0].clone();
        assert!(matches(&g, &rhs, &[Symbol::terminal("a")]));
        assert!(matches(&g, &rhs, &[Symbol::terminal("b")]));
        assert!(!matches(&g, &rhs, &[Symbol::terminal("c")]));
    }

    #[test]
    fn matches_rejects_too_long_lookahead() {
        let g = grammar("start: <S>\n<S> ::= \"a\"");
        let rhs = g.rhss_of("S")[0].clone();
        assert!(!matches(
            &g,
            &rhs,
            &[Symbol::terminal("a"), Symbol::terminal("b")]
        ));
    }

    #[test]
    fn nullable_sees_indirect_epsilon() {
        let g = grammar("start: <S>\n<S> ::= <B>\n<B> ::= ε");
        let rhs = g.rhss_of("S")[0].clone();
        assert!(nullable(&g, &rhs));
    }

    #[test]
    fn epsilon_lookahead_selects_nullable_production() {
        let g = grammar("start: <S>\n<S> ::= <A> \"b\"\n<A> ::= \"a\" | ε");
        let found = productions_leading_to(&g, "A", &Lookahead::Single(Symbol::Epsilon));
        assert_eq!(found.len(), 1);
        assert!(found[0].rhs.is_pure_epsilon());
    }

    #[test]
    fn tuple_lookahead_disambiguates() {
        let g = grammar("start: <S>\n<S> ::= \"a\" \"b\" | \"a\" \"c\"");
        let la = Lookahead::Tuple(vec![Symbol::terminal("a"), Symbol::terminal("c")]);
        let found = productions_leading_to(&g, "S", &la);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].rhs.symbols(),
            &[Symbol::terminal("a"), Symbol::terminal("c")]
        );
    }
}
