//! FIRST_k computation.
//!
//! `Fi(x, k, allow_underflow)` enumerates the terminal sequences of
//! length k (ε counting as an ordinary symbol) that can begin a
//! derivation of `x`. With `allow_underflow` the sequence may stop at k
//! symbols with input left over (a k-prefix); without it the whole of
//! `x` must derive exactly k terminals. Recursion terminates because k
//! strictly decreases through every nonterminal expansion that makes
//! progress; same-k cycles are cut by an active set.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::trace;

use crate::grammar::Grammar;
use crate::subproduction::SubProduction;
use crate::symbol::{Lookahead, Symbol};

/// A set of candidate bounded prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    sequences: BTreeSet<SubProduction>,
}

impl FirstSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(sequence: SubProduction) -> Self {
        let mut sequences = BTreeSet::new();
        sequences.insert(sequence);
        Self { sequences }
    }

    pub fn insert(&mut self, sequence: SubProduction) {
        self.sequences.insert(sequence);
    }

    /// Set union.
    pub fn merge(&mut self, other: FirstSet) {
        self.sequences.extend(other.sequences);
    }

    /// Cartesian product by concatenation: `{a · b : a ∈ self, b ∈ other}`.
    pub fn cross(&self, other: &FirstSet) -> FirstSet {
        let mut out = FirstSet::new();
        for a in &self.sequences {
            for b in &other.sequences {
                out.insert(a.concat(b));
            }
        }
        out
    }

    pub fn sequences(&self) -> impl Iterator<Item = &SubProduction> {
        self.sequences.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FiItem {
    Symbol(Symbol),
    Seq(SubProduction),
}

type FiKey = (FiItem, usize, bool);

/// Memoizing FIRST_k engine over one grammar.
pub struct FirstEngine<'g> {
    grammar: &'g Grammar,
    memo: HashMap<FiKey, FirstSet>,
    active: HashSet<FiKey>,
}

impl<'g> FirstEngine<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            memo: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// FIRST of a single symbol.
    pub fn first_of_symbol(&mut self, symbol: &Symbol, k: usize, allow_underflow: bool) -> FirstSet {
        self.fi(FiItem::Symbol(symbol.clone()), k, allow_underflow).0
    }

    /// FIRST of a symbol sequence.
    pub fn first_of_sequence(
        &mut self,
        sequence: &SubProduction,
        k: usize,
        allow_underflow: bool,
    ) -> FirstSet {
        self.fi(FiItem::Seq(sequence.clone()), k, allow_underflow).0
    }

    /// Returns the computed set plus the still-active keys reached by
    /// back-edges. Results seen through a back-edge are partial for the
    /// keys still on the stack, so they are only memoized once no such
    /// key remains.
    fn fi(&mut self, item: FiItem, k: usize, allow_underflow: bool) -> (FirstSet, Vec<FiKey>) {
        let key = (item.clone(), k, allow_underflow);
        if let Some(cached) = self.memo.get(&key) {
            return (cached.clone(), Vec::new());
        }
        if self.active.contains(&key) {
            return (FirstSet::new(), vec![key]);
        }
        self.active.insert(key.clone());

        let (result, mut edges) = match item {
            FiItem::Symbol(symbol) => self.fi_symbol(&symbol, k, allow_underflow),
            FiItem::Seq(sequence) => self.fi_sequence(&sequence, k, allow_underflow),
        };

        self.active.remove(&key);
        edges.retain(|edge| *edge != key);
        if edges.is_empty() {
            self.memo.insert(key, result.clone());
        } else {
            trace!("skipping memo for partial FIRST result under recursion");
        }
        (result, edges)
    }

    fn fi_symbol(
        &mut self,
        symbol: &Symbol,
        k: usize,
        allow_underflow: bool,
    ) -> (FirstSet, Vec<FiKey>) {
        let mut out = FirstSet::new();
        let mut edges = Vec::new();
        if let Symbol::Nonterminal(name) = symbol {
            for rhs in self.grammar.rhss_of(name).to_vec() {
                let (first, e) = self.fi(FiItem::Seq(rhs), k, allow_underflow);
                out.merge(first);
                edges.extend(e);
            }
        }
        // Terminals and ε have no productions to expand; the sequence
        // cases account for them positionally.
        (out, edges)
    }

    fn fi_sequence(
        &mut self,
        sequence: &SubProduction,
        k: usize,
        allow_underflow: bool,
    ) -> (FirstSet, Vec<FiKey>) {
        // Fi(⟨⟩, 0) is the identity {⟨⟩}; a non-empty target cannot be
        // met by an empty sequence.
        if sequence.is_empty() {
            if k == 0 {
                return (FirstSet::singleton(SubProduction::empty()), Vec::new());
            }
            return (FirstSet::new(), Vec::new());
        }

        let (terms, rest) = sequence.initial_terminals(k);

        // A zero-length target met by a leading ε.
        if k == 0 && terms.is_pure_epsilon() {
            return (FirstSet::singleton(terms), Vec::new());
        }

        // Enough leading terminals to fill the window.
        if !terms.is_empty() && terms.len() == k && (allow_underflow || rest.is_empty()) {
            return (FirstSet::singleton(terms), Vec::new());
        }

        // Fewer than k terminals and nothing left to expand.
        if rest.is_empty() {
            return (FirstSet::new(), Vec::new());
        }

        if terms.is_empty() {
            return self.fi_leading_nonterminal(sequence, k, allow_underflow);
        }

        // Terminal prefix followed by a nonterminal: the remainder must
        // contribute the missing length.
        let (rest_first, edges) = self.fi(FiItem::Seq(rest), k - terms.len(), allow_underflow);
        (FirstSet::singleton(terms).cross(&rest_first), edges)
    }

    fn fi_leading_nonterminal(
        &mut self,
        sequence: &SubProduction,
        k: usize,
        allow_underflow: bool,
    ) -> (FirstSet, Vec<FiKey>) {
        let (head, rest) = match sequence.head() {
            Some(split) => split,
            None => return (FirstSet::new(), Vec::new()),
        };
        let head = head.clone();
        let mut out = FirstSet::new();
        let mut edges = Vec::new();

        if allow_underflow {
            // The head alone may fill the window; its pure-ε results are
            // only meaningful when nothing follows (ε ∈ FIRST iff the
            // whole sequence is nullable).
            let (head_first, e) = self.fi(FiItem::Symbol(head.clone()), k, true);
            edges.extend(e);
            for seq in head_first.sequences() {
                if rest.is_empty() || !seq.is_pure_epsilon() {
                    out.insert(seq.clone());
                }
            }
            // Split the window: head derives exactly k - i, the rest
            // supplies i. At i = k the head contributes only via ε.
            for i in 1..=k {
                let (head_part, e1) = self.fi(FiItem::Symbol(head.clone()), k - i, false);
                edges.extend(e1);
                if head_part.is_empty() {
                    continue;
                }
                let (rest_part, e2) = self.fi(FiItem::Seq(rest.clone()), i, true);
                edges.extend(e2);
                out.merge(head_part.cross(&rest_part));
            }
        } else {
            // Exact consumption: every split of the window over head and
            // rest, both sides exact.
            for i in 0..=k {
                let (head_part, e1) = self.fi(FiItem::Symbol(head.clone()), k - i, false);
                edges.extend(e1);
                if head_part.is_empty() {
                    continue;
                }
                let (rest_part, e2) = self.fi(FiItem::Seq(rest.clone()), i, false);
                edges.extend(e2);
                out.merge(head_part.cross(&rest_part));
            }
        }

        (out, edges)
    }
}

/// Computes FIRST_k for every nonterminal.
///
/// Stages i < k admit only complete derivations of length exactly i
/// (shorter sentences); the final stage admits k-prefixes. Sequences are
/// ε-normalized on the way out: a vanished sequence reads as ε, one
/// symbol as a bare terminal, more as a tuple.
pub fn kfirst(grammar: &Grammar, k: usize) -> BTreeMap<String, BTreeSet<Lookahead>> {
    let names: Vec<String> = grammar.nonterminals().map(String::from).collect();
    let mut engine = FirstEngine::new(grammar);
    let mut out: BTreeMap<String, BTreeSet<Lookahead>> = names
        .iter()
        .map(|name| (name.clone(), BTreeSet::new()))
        .collect();

    for i in 1..=k {
        let allow_underflow = i == k;
        for name in &names {
            let first = engine.first_of_symbol(&Symbol::nonterminal(name.clone()), i, allow_underflow);
            trace!("FIRST_{} stage {}: {} candidates for <{}>", k, i, first.len(), name);
            let entry = out.get_mut(name).expect("initialized above");
            for sequence in first.sequences() {
                entry.insert(Lookahead::from_sequence(sequence.normalized()));
            }
        }
    }

    out
}
