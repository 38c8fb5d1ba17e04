//! LL(k) parsing-table assembly.
//!
//! Every FIRST entry of a nonterminal is resolved back to the unique
//! production that can produce it; two candidates for one cell mean the
//! grammar is not LL(k) at this k. An ε entry fills the cells of the
//! nonterminal's FOLLOW set instead, without displacing FIRST-driven
//! entries.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use log::debug;

use crate::derive::productions_leading_to;
use crate::error::{GrammarError, Result};
use crate::grammar::{Grammar, Production};
use crate::symbol::Lookahead;

/// `nonterminal → (lookahead → production)`.
pub type ParseTable = BTreeMap<String, BTreeMap<Lookahead, Production>>;

/// Builds the parsing table from FIRST_k and FOLLOW_k.
///
/// # Algorithm
/// For each nonterminal N and each lookahead t ∈ FIRST(N):
/// 1. Resolve t to the unique production of N that derives it; more
///    than one candidate fails with `AmbiguousGrammar`
/// 2. If t is ε, record the production under every lookahead in
///    FOLLOW(N) that is still vacant
/// 3. Otherwise record it under t; a cell already bound to a different
///    production fails with `AmbiguousGrammar`
pub fn build_table(
    grammar: &Grammar,
    first: &BTreeMap<String, BTreeSet<Lookahead>>,
    follow: &BTreeMap<String, BTreeSet<Lookahead>>,
) -> Result<ParseTable> {
    let mut table: ParseTable = grammar
        .nonterminals()
        .map(|name| (name.to_string(), BTreeMap::new()))
        .collect();

    for (nonterm, lookaheads) in first {
        for lookahead in lookaheads {
            let candidates = productions_leading_to(grammar, nonterm, lookahead);
            if candidates.len() > 1 {
                return Err(GrammarError::AmbiguousGrammar {
                    nonterminal: nonterm.clone(),
                    lookahead: lookahead.to_string(),
                    candidates: candidates.iter().map(|p| format!("  {}", p)).join("\n"),
                });
            }
            let production = candidates
                .into_iter()
                .next()
                .ok_or_else(|| GrammarError::NoProduction {
                    nonterminal: nonterm.clone(),
                    lookahead: lookahead.to_string(),
                })?;

            let row = table.get_mut(nonterm).expect("every nonterminal has a row");
            if lookahead.is_epsilon() {
                // The ε choice applies exactly when the next tokens can
                // only belong to whatever follows this nonterminal.
                for next in follow.get(nonterm).into_iter().flatten() {
                    row.entry(next.clone()).or_insert_with(|| production.clone());
                }
            } else {
                if let Some(existing) = row.get(lookahead) {
                    if *existing != production {
                        return Err(GrammarError::AmbiguousGrammar {
                            nonterminal: nonterm.clone(),
                            lookahead: lookahead.to_string(),
                            candidates: format!("  {}\n  {}", existing, production),
                        });
                    }
                }
                row.insert(lookahead.clone(), production);
            }
        }
    }

    let cells: usize = table.values().map(BTreeMap::len).sum();
    debug!("parsing table assembled: {} rows, {} cells", table.len(), cells);
    Ok(table)
}
