//! Symbol and lookahead types for LL(k) grammars.
//!
//! Nonterminals carry their name, terminals their literal text (quote
//! markers already removed). The end-of-input marker `$` never occurs in
//! a production; it enters FOLLOW sets and lookaheads only.

use std::cmp::Ordering;
use std::fmt;

/// A symbol in a context-free grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A nonterminal, e.g. `<Expr>`.
    Nonterminal(String),
    /// A terminal literal, e.g. `"if"` (stored without the quotes).
    Terminal(String),
    /// The empty derivation (ε).
    Epsilon,
    /// The end-of-input marker ($).
    EndMarker,
}

impl Symbol {
    pub fn nonterminal(name: impl Into<String>) -> Self {
        Symbol::Nonterminal(name.into())
    }

    pub fn terminal(text: impl Into<String>) -> Self {
        Symbol::Terminal(text.into())
    }

    /// Checks if this symbol is a terminal.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    /// Checks if this symbol is a nonterminal.
    #[inline]
    pub const fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }

    /// Checks if this symbol is epsilon (ε).
    #[inline]
    pub const fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// Checks if this symbol is the end marker ($).
    #[inline]
    pub const fn is_end_marker(&self) -> bool {
        matches!(self, Symbol::EndMarker)
    }

    /// The name of a nonterminal, if this is one.
    pub fn as_nonterminal(&self) -> Option<&str> {
        match self {
            Symbol::Nonterminal(name) => Some(name),
            _ => None,
        }
    }

    /// The token type the emitted parser compares against: terminal text,
    /// `ε`, `$`, or the nonterminal name.
    pub fn token_text(&self) -> &str {
        match self {
            Symbol::Nonterminal(name) => name,
            Symbol::Terminal(text) => text,
            Symbol::Epsilon => "ε",
            Symbol::EndMarker => "$",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Nonterminal(name) => write!(f, "<{}>", name),
            Symbol::Terminal(text) => write!(f, "\"{}\"", text),
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::EndMarker => write!(f, "$"),
        }
    }
}

/// Ordering for symbols so that set iteration and emission are stable.
///
/// Order: Epsilon < Terminals < Nonterminals < EndMarker
impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        use Symbol::*;
        match (self, other) {
            (Epsilon, Epsilon) => Ordering::Equal,
            (Epsilon, _) => Ordering::Less,
            (_, Epsilon) => Ordering::Greater,

            (EndMarker, EndMarker) => Ordering::Equal,
            (EndMarker, _) => Ordering::Greater,
            (_, EndMarker) => Ordering::Less,

            (Terminal(a), Terminal(b)) => a.cmp(b),
            (Terminal(_), Nonterminal(_)) => Ordering::Less,
            (Nonterminal(_), Terminal(_)) => Ordering::Greater,
            (Nonterminal(a), Nonterminal(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A bounded token sequence used to pick a production at parse time.
///
/// Single-terminal lookaheads and tuples live in the same table; the two
/// constructors keep them apart where the source of a sequence matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lookahead {
    Single(Symbol),
    Tuple(Vec<Symbol>),
}

impl Lookahead {
    /// Builds a lookahead from an ε-normalized sequence: the empty
    /// sequence stands for ε, one symbol is `Single`, more is `Tuple`.
    pub fn from_sequence(symbols: Vec<Symbol>) -> Self {
        let mut symbols = symbols;
        match symbols.len() {
            0 => Lookahead::Single(Symbol::Epsilon),
            1 => Lookahead::Single(symbols.pop().unwrap()),
            _ => Lookahead::Tuple(symbols),
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Lookahead::Single(Symbol::Epsilon))
    }

    /// The lookahead as a flat symbol slice.
    pub fn symbols(&self) -> &[Symbol] {
        match self {
            Lookahead::Single(symbol) => std::slice::from_ref(symbol),
            Lookahead::Tuple(symbols) => symbols,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols().is_empty()
    }
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookahead::Single(symbol) => write!(f, "{}", symbol),
            Lookahead::Tuple(symbols) => {
                write!(f, "(")?;
                for (i, symbol) in symbols.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", symbol)?;
                }
                write!(f, ")")
            }
        }
    }
}
