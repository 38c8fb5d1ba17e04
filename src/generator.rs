//! End-to-end generation pipeline:
//! grammar text → FIRST_k → FOLLOW_k → table → emitted source.

use log::debug;

use crate::bnf;
use crate::emit;
use crate::error::{GrammarError, Result};
use crate::first::kfirst;
use crate::follow::kfollow;
use crate::grammar::Grammar;
use crate::table::build_table;

/// Generates the source of a table-driven LL(k) parser for a BNF
/// grammar. `imports` is spliced verbatim into the emitted header so the
/// host program can bring its token type into scope.
///
/// Pure: equal inputs produce byte-equal output. All failures (malformed
/// grammar, ambiguity at this k, diverging fixpoint) are fatal; no
/// partial table is ever emitted.
pub fn generate_parser(grammar_text: &str, imports: Option<&str>, k: usize) -> Result<String> {
    if k == 0 {
        return Err(GrammarError::InvalidFormat(
            "lookahead must be at least 1".to_string(),
        ));
    }

    let grammar = Grammar::from_ast(bnf::parse(grammar_text)?)?;
    debug!(
        "generating LL({}) parser: {} productions, start <{}>",
        k,
        grammar.productions().len(),
        grammar.start()
    );

    let first = kfirst(&grammar, k);
    let follow = kfollow(&grammar, k)?;
    let table = build_table(&grammar, &first, &follow)?;
    Ok(emit::render(&grammar, &table, k, imports))
}
