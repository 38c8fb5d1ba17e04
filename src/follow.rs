//! FOLLOW_k computation.
//!
//! Two phases. Enumeration walks every occurrence of a nonterminal and
//! assigns candidate lengths to the symbols after it: assignments that
//! fill the whole window produce complete FollowSets, assignments that
//! run out of symbols first produce partial sets pointing at the
//! production's lhs. The fixpoint then feeds complete content into
//! partial sets until nothing changes.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use log::{debug, trace};

use crate::error::{GrammarError, Result};
use crate::first::FirstEngine;
use crate::grammar::{Grammar, Production};
use crate::subproduction::SubProduction;
use crate::symbol::{Lookahead, Symbol};

/// Hard bound on fixpoint passes; monotone growth converges far earlier
/// on any real grammar.
const FIXPOINT_PASSES: usize = 500;

/// Per-unit step allowance for permutation enumeration.
const PERMUTATION_BUDGET: usize = 500;

/// Terminal sequences that may appear immediately after one nonterminal.
///
/// `completes` holds sequences that already fill the k-window;
/// `additional` holds resolved-but-short sequences, which double as the
/// prefixes a partial set extends while the fixpoint feeds it content
/// from `follow`'s sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSet {
    pub owner: String,
    pub follow: String,
    pub completes: BTreeSet<SubProduction>,
    pub additional: BTreeSet<SubProduction>,
    pub is_complete: bool,
    pub changed: bool,
    k: usize,
}

impl FollowSet {
    /// A set whose contributions are fully resolved. Sequences shorter
    /// than k are underflow, valid only because input may end.
    pub fn complete(
        sequences: Vec<SubProduction>,
        owner: impl Into<String>,
        follow: impl Into<String>,
        k: usize,
    ) -> Self {
        let mut set = Self {
            owner: owner.into(),
            follow: follow.into(),
            completes: BTreeSet::new(),
            additional: BTreeSet::new(),
            is_complete: true,
            changed: false,
            k,
        };
        for sequence in sequences {
            if sequence.len() == k {
                set.completes.insert(sequence);
            } else if !sequence.is_empty() {
                set.additional.insert(sequence);
            }
        }
        set
    }

    /// A set still waiting on FOLLOW(`follow`) for its missing tail.
    /// `prefixes` are exact-length derivations of everything between
    /// the owner and the end of the production.
    pub fn partial(
        prefixes: Vec<SubProduction>,
        owner: impl Into<String>,
        follow: impl Into<String>,
        k: usize,
    ) -> Self {
        Self {
            owner: owner.into(),
            follow: follow.into(),
            completes: BTreeSet::new(),
            additional: prefixes.into_iter().collect(),
            is_complete: false,
            changed: false,
            k,
        }
    }

    /// Extends every stored prefix with the sequences of another set,
    /// truncating to k. Sequences reaching k migrate to `completes`;
    /// shorter ones stay in `additional` and extend further later.
    pub fn append(&mut self, sources: &[SubProduction]) {
        if self.is_complete {
            return;
        }
        let prefixes: Vec<SubProduction> = self.additional.iter().cloned().collect();
        for source in sources {
            for prefix in &prefixes {
                let joined = prefix.concat(source).truncated(self.k);
                let inserted = if joined.len() == self.k {
                    self.completes.insert(joined)
                } else {
                    self.additional.insert(joined)
                };
                if inserted {
                    self.changed = true;
                }
            }
        }
    }

    /// Joins another set for the same (owner, follow) pair.
    pub fn join(&mut self, other: FollowSet) {
        self.completes.extend(other.completes);
        self.additional.extend(other.additional);
        self.is_complete &= other.is_complete;
        self.k = self.k.max(other.k);
    }
}

/// Enumerates the FollowSets contributed by one occurrence of a target
/// symbol: `base` is the rhs position just past the occurrence.
fn kfollow_permutations(
    grammar: &Grammar,
    engine: &mut FirstEngine<'_>,
    production: &Production,
    target: &str,
    base: usize,
    k: usize,
) -> Result<Vec<FollowSet>> {
    let rhs = &production.rhs;

    // Occurrence at the very end: everything comes from FOLLOW(lhs).
    if base == rhs.len() {
        return Ok(vec![FollowSet::partial(
            vec![SubProduction::empty()],
            target,
            production.lhs.clone(),
            k,
        )]);
    }

    let remaining = rhs.len() - base;
    let mut out = Vec::new();
    let mut queue: Vec<Vec<usize>> = (0..=k).map(|n| vec![n]).collect();
    let mut budget = PERMUTATION_BUDGET * (k + 1) * remaining;

    while let Some(permutation) = queue.pop() {
        if budget == 0 {
            return Err(GrammarError::EnumerationOverflow {
                production: production.to_string(),
            });
        }
        budget -= 1;

        let total: usize = permutation.iter().sum();
        if total == k {
            // Saturated: symbols past the assigned ones cannot reach the
            // window any more, so this resolves completely. The last
            // non-zero position may pull from FIRST, underflow included.
            let sequences = resolve_permutation(grammar, engine, rhs, base, &permutation, true);
            out.push(FollowSet::complete(
                sequences,
                target,
                production.lhs.clone(),
                k,
            ));
        } else if remaining <= permutation.len() {
            // Every symbol assigned but the window is short: the tail
            // must come from FOLLOW(lhs) during the fixpoint, so only
            // exact derivations are allowed here.
            let sequences = resolve_permutation(grammar, engine, rhs, base, &permutation, false);
            out.push(FollowSet::partial(
                sequences,
                target,
                production.lhs.clone(),
                k,
            ));
        } else {
            for n in 0..=(k - total) {
                let mut extended = permutation.clone();
                extended.push(n);
                queue.push(extended);
            }
        }
    }

    Ok(out)
}

/// Resolves one length assignment to the concrete terminal sequences it
/// stands for: each assigned position contributes every derivation of
/// its exact length, combined positionwise.
fn resolve_permutation(
    grammar: &Grammar,
    engine: &mut FirstEngine<'_>,
    rhs: &SubProduction,
    base: usize,
    permutation: &[usize],
    allow_firstset: bool,
) -> Vec<SubProduction> {
    let last_nonzero = permutation.iter().rposition(|&n| n != 0);

    let mut per_position: Vec<Vec<SubProduction>> = Vec::new();
    for (i, &n) in permutation.iter().enumerate() {
        let symbol = &rhs.symbols()[base + i];
        let options: Vec<SubProduction> =
            if allow_firstset && Some(i) == last_nonzero && !symbol.is_terminal() {
                // The window ends inside this symbol; any k-prefix of its
                // derivations works, shorter ones only at end of input.
                engine
                    .first_of_symbol(symbol, n, true)
                    .sequences()
                    .filter(|sequence| !sequence.is_pure_epsilon())
                    .map(|sequence| SubProduction::new(sequence.normalized()))
                    .collect()
            } else {
                grammar.get_exact(symbol, n)
            };
        if options.is_empty() {
            return Vec::new();
        }
        per_position.push(options);
    }

    per_position
        .iter()
        .map(|options| options.iter())
        .multi_cartesian_product()
        .map(|combination| {
            combination
                .into_iter()
                .fold(SubProduction::empty(), |acc, part| acc.concat(part))
        })
        .collect()
}

/// Collects the FollowSets of every occurrence of `symbol`.
fn follow_sets_for(
    grammar: &Grammar,
    engine: &mut FirstEngine<'_>,
    symbol: &str,
    k: usize,
) -> Result<Vec<FollowSet>> {
    let mut out = Vec::new();
    for production in grammar.productions() {
        let positions: Vec<usize> = production
            .rhs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_nonterminal() == Some(symbol))
            .map(|(i, _)| i)
            .collect();
        for position in positions {
            out.extend(kfollow_permutations(
                grammar,
                engine,
                production,
                symbol,
                position + 1,
                k,
            )?);
        }
    }
    Ok(out)
}

/// Feeds every partial set from the sets of its `follow` reference until
/// a full pass adds nothing.
fn fixpoint(table: &mut BTreeMap<String, Vec<FollowSet>>) -> Result<()> {
    let owners: Vec<String> = table.keys().cloned().collect();
    for pass in 0..FIXPOINT_PASSES {
        let mut changed = false;
        for owner in &owners {
            for index in 0..table[owner].len() {
                {
                    let set = &mut table.get_mut(owner).expect("known owner")[index];
                    set.changed = false;
                    if set.is_complete {
                        continue;
                    }
                }
                let follow = table[owner][index].follow.clone();
                let sources: Vec<SubProduction> = table
                    .get(&follow)
                    .into_iter()
                    .flatten()
                    .flat_map(|source| source.completes.iter().chain(source.additional.iter()))
                    .cloned()
                    .collect();
                let set = &mut table.get_mut(owner).expect("known owner")[index];
                set.append(&sources);
                changed |= set.changed;
            }
        }
        if !changed {
            debug!("FOLLOW fixpoint converged after {} passes", pass + 1);
            return Ok(());
        }
    }
    Err(GrammarError::FixpointDiverged {
        passes: FIXPOINT_PASSES,
    })
}

/// Computes FOLLOW_k for every nonterminal.
///
/// # Algorithm
/// 1. Seed FOLLOW(start) with the complete set {⟨$⟩}
/// 2. For each window size i = 1..k: enumerate the FollowSets of every
///    occurrence of every nonterminal, then run the fixpoint so partial
///    sets absorb the sets of their follow reference
/// 3. Join sets with the same (owner, follow) pair and flatten their
///    `completes` and `additional` sequences into lookaheads
pub fn kfollow(grammar: &Grammar, k: usize) -> Result<BTreeMap<String, BTreeSet<Lookahead>>> {
    let names: Vec<String> = grammar.nonterminals().map(String::from).collect();
    let mut engine = FirstEngine::new(grammar);

    let mut table: BTreeMap<String, Vec<FollowSet>> = names
        .iter()
        .map(|name| (name.clone(), Vec::new()))
        .collect();
    let start = grammar.start().to_string();
    table
        .get_mut(&start)
        .expect("start is a nonterminal")
        .push(FollowSet::complete(
            vec![SubProduction::from_symbol(Symbol::EndMarker)],
            start.clone(),
            start.clone(),
            1,
        ));

    for i in 1..=k {
        for name in &names {
            let sets = follow_sets_for(grammar, &mut engine, name, i)?;
            trace!("FOLLOW_{} round {}: {} sets for <{}>", k, i, sets.len(), name);
            table.get_mut(name).expect("known owner").extend(sets);
        }
        fixpoint(&mut table)?;
    }

    let mut out: BTreeMap<String, BTreeSet<Lookahead>> = names
        .iter()
        .map(|name| (name.clone(), BTreeSet::new()))
        .collect();
    for (owner, sets) in table {
        // Join sets that track the same follow reference, then flatten.
        let mut joined: BTreeMap<String, FollowSet> = BTreeMap::new();
        for set in sets {
            match joined.entry(set.follow.clone()) {
                std::collections::btree_map::Entry::Vacant(entry) => {
                    entry.insert(set);
                }
                std::collections::btree_map::Entry::Occupied(mut entry) => {
                    entry.get_mut().join(set);
                }
            }
        }
        let entry = out.get_mut(&owner).expect("initialized above");
        for set in joined.into_values() {
            for sequence in set.completes.iter().chain(set.additional.iter()) {
                if sequence.is_empty() {
                    continue;
                }
                entry.insert(Lookahead::from_sequence(sequence.normalized()));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bnf;

    fn grammar(text: &str) -> Grammar {
        Grammar::from_ast(bnf::parse(text).unwrap()).unwrap()
    }

    fn single(text: &str) -> Lookahead {
        Lookahead::Single(Symbol::terminal(text))
    }

    fn end() -> Lookahead {
        Lookahead::Single(Symbol::EndMarker)
    }

    #[test]
    fn follow_of_start_contains_end_marker() {
        let g = grammar("start: <S>\n<S> ::= \"a\"");
        let follow = kfollow(&g, 1).unwrap();
        assert_eq!(follow["S"], BTreeSet::from([end()]));
    }

    #[test]
    fn follow_from_adjacent_symbol() {
        let g = grammar("start: <S>\n<S> ::= <A> <B>\n<A> ::= \"a\"\n<B> ::= \"b\"");
        let follow = kfollow(&g, 1).unwrap();
        assert_eq!(follow["A"], BTreeSet::from([single("b")]));
        assert_eq!(follow["B"], BTreeSet::from([end()]));
    }

    #[test]
    fn follow_skips_nullable_neighbor() {
        let g = grammar(
            "start: <S>\n<S> ::= <A> <B> <C>\n<A> ::= \"a\"\n<B> ::= \"b\" | ε\n<C> ::= \"c\"",
        );
        let follow = kfollow(&g, 1).unwrap();
        assert_eq!(follow["A"], BTreeSet::from([single("b"), single("c")]));
    }

    #[test]
    fn follow_of_trailing_symbol_tracks_lhs() {
        let g = grammar("start: <S>\n<S> ::= \"(\" <S> \")\" | <A>\n<A> ::= \"x\"");
        let follow = kfollow(&g, 1).unwrap();
        assert_eq!(follow["A"], BTreeSet::from([single(")"), end()]));
    }

    #[test]
    fn recursive_list_follow() {
        let g = grammar("start: <L>\n<L> ::= \"x\" <L> | ε");
        let follow = kfollow(&g, 1).unwrap();
        assert_eq!(follow["L"], BTreeSet::from([end()]));
    }

    #[test]
    fn follow_at_k2_pads_with_end_marker() {
        let g = grammar("start: <S>\n<S> ::= <A> <B>\n<A> ::= \"a\"\n<B> ::= \"b\"");
        let follow = kfollow(&g, 2).unwrap();
        let b_end = Lookahead::Tuple(vec![Symbol::terminal("b"), Symbol::EndMarker]);
        assert!(follow["A"].contains(&single("b")));
        assert!(follow["A"].contains(&b_end));
    }

    #[test]
    fn append_truncates_and_promotes() {
        let mut set = FollowSet::partial(
            vec![SubProduction::from_symbol(Symbol::terminal("b"))],
            "A",
            "S",
            2,
        );
        set.append(&[SubProduction::new(vec![
            Symbol::terminal("c"),
            Symbol::terminal("d"),
        ])]);
        assert!(set.changed);
        let bc = SubProduction::new(vec![Symbol::terminal("b"), Symbol::terminal("c")]);
        assert!(set.completes.contains(&bc));
    }
}
