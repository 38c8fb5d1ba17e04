//! Grammar model.
//!
//! The grammar is an ordered list of productions plus two derived views:
//! a map from nonterminal name to its right-hand sides and the
//! designated start symbol. Order is preserved so that emission is
//! reproducible.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use log::trace;

use crate::bnf::GrammarAst;
use crate::error::{GrammarError, Result};
use crate::subproduction::SubProduction;
use crate::symbol::Symbol;

/// A production rule `lhs → rhs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Production {
    pub lhs: String,
    pub rhs: SubProduction,
}

impl Production {
    pub fn new(lhs: impl Into<String>, rhs: SubProduction) -> Self {
        Self {
            lhs: lhs.into(),
            rhs,
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> → {}", self.lhs, self.rhs)
    }
}

/// A context-free grammar with a designated start symbol.
#[derive(Debug, Clone)]
pub struct Grammar {
    productions: Vec<Production>,
    /// Nonterminal name → its right-hand sides, in production order.
    by_lhs: BTreeMap<String, Vec<SubProduction>>,
    start: String,
}

impl Grammar {
    /// Builds a grammar from parsed BNF, validating symbol references.
    pub fn from_ast(ast: GrammarAst) -> Result<Self> {
        let productions = ast
            .productions
            .into_iter()
            .map(|(lhs, rhs)| Production::new(lhs, rhs))
            .collect();
        Self::from_productions(productions, ast.start)
    }

    /// Builds a grammar from a production list.
    ///
    /// Every nonterminal on a right-hand side must occur as some lhs,
    /// and the start symbol must name a production.
    pub fn from_productions(productions: Vec<Production>, start: String) -> Result<Self> {
        if productions.is_empty() {
            return Err(GrammarError::InvalidFormat("no productions".to_string()));
        }

        let mut by_lhs: BTreeMap<String, Vec<SubProduction>> = BTreeMap::new();
        for production in &productions {
            by_lhs
                .entry(production.lhs.clone())
                .or_default()
                .push(production.rhs.clone());
        }

        for production in &productions {
            for symbol in production.rhs.iter() {
                if let Symbol::Nonterminal(name) = symbol {
                    if !by_lhs.contains_key(name) {
                        return Err(GrammarError::UnknownSymbol(format!("<{}>", name)));
                    }
                }
            }
        }
        if !by_lhs.contains_key(&start) {
            return Err(GrammarError::UnknownSymbol(format!("<{}>", start)));
        }

        Ok(Self {
            productions,
            by_lhs,
            start,
        })
    }

    /// Returns all productions in the grammar, in input order.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Returns the right-hand sides of a nonterminal.
    pub fn rhss_of(&self, name: &str) -> &[SubProduction] {
        self.by_lhs.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the start symbol name.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Iterates nonterminal names in stable order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.by_lhs.keys().map(String::as_str)
    }

    /// Enumerates every derivation of `symbol` that yields exactly `n`
    /// terminals, as ε-free terminal sequences.
    ///
    /// The search splices nonterminal expansions in place and prunes
    /// branches that already exceed `n`. A step budget proportional to
    /// `n × |productions|` bounds recursive grammars; branches beyond it
    /// are dropped (they cannot contribute exact-length strings the
    /// shorter derivations have not already produced, or are abandoned
    /// as unresolvable).
    pub fn get_exact(&self, symbol: &Symbol, n: usize) -> Vec<SubProduction> {
        let mut results: BTreeSet<SubProduction> = BTreeSet::new();
        let mut queue: VecDeque<(Vec<Symbol>, SubProduction)> = VecDeque::new();
        queue.push_back((Vec::new(), SubProduction::from_symbol(symbol.clone())));

        let mut budget = EXACT_SEARCH_BUDGET * (n + 1) * self.productions.len().max(1);
        while let Some((prefix, pending)) = queue.pop_front() {
            if budget == 0 {
                trace!("get_exact budget exhausted for {} at length {}", symbol, n);
                break;
            }
            budget -= 1;

            match pending.head() {
                None => {
                    if prefix.len() == n {
                        results.insert(SubProduction::new(prefix));
                    }
                }
                Some((Symbol::Terminal(text), rest)) => {
                    if prefix.len() < n {
                        let mut prefix = prefix;
                        prefix.push(Symbol::terminal(text.clone()));
                        queue.push_back((prefix, rest));
                    }
                }
                Some((Symbol::Epsilon, rest)) => {
                    queue.push_back((prefix, rest));
                }
                Some((Symbol::Nonterminal(name), rest)) => {
                    for rhs in self.rhss_of(name) {
                        queue.push_back((prefix.clone(), rhs.concat(&rest)));
                    }
                }
                Some((Symbol::EndMarker, _)) => {}
            }
        }

        results.into_iter().collect()
    }
}

/// Per-unit step allowance for `get_exact`.
const EXACT_SEARCH_BUDGET: usize = 500;

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}
