//! Error types for the table generator.

use thiserror::Error;

/// Errors that can occur while reading a grammar or assembling a table.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("Invalid grammar format: {0}")]
    InvalidFormat(String),

    #[error("Invalid production: {0}")]
    InvalidProduction(String),

    #[error("Grammar has no start marker (expected a `start: <Name>` line)")]
    MissingStart,

    #[error("Unknown symbol {0} appears on a right-hand side but has no production")]
    UnknownSymbol(String),

    #[error(
        "Ambiguous grammar: multiple productions for {nonterminal} on lookahead {lookahead}:\n{candidates}"
    )]
    AmbiguousGrammar {
        nonterminal: String,
        lookahead: String,
        candidates: String,
    },

    #[error("No production of {nonterminal} derives lookahead {lookahead}")]
    NoProduction {
        nonterminal: String,
        lookahead: String,
    },

    #[error("FOLLOW fixpoint did not converge within {passes} passes")]
    FixpointDiverged { passes: usize },

    #[error("Permutation enumeration exceeded its iteration bound for {production}")]
    EnumerationOverflow { production: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, GrammarError>;
