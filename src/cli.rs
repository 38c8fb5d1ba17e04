//! Command-line driver for the generator.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::error::Result;
use crate::generator::generate_parser;

/// Generate a table-driven LL(k) parser from a BNF grammar.
#[derive(Parser, Debug)]
#[command(name = "llkgen", version, about)]
pub struct Args {
    /// Grammar file in BNF notation.
    pub grammar: PathBuf,

    /// Lookahead window size.
    #[arg(short = 'k', long = "lookahead", default_value_t = 1)]
    pub lookahead: usize,

    /// Output file; stdout when absent.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File whose contents are spliced into the emitted header.
    #[arg(long)]
    pub imports: Option<PathBuf>,
}

/// Runs one generation: read grammar, generate, write the source out.
pub fn run(args: &Args) -> Result<()> {
    let grammar_text = fs::read_to_string(&args.grammar)?;
    let imports = args
        .imports
        .as_ref()
        .map(fs::read_to_string)
        .transpose()?;

    info!(
        "generating LL({}) parser from {}",
        args.lookahead,
        args.grammar.display()
    );
    let source = generate_parser(&grammar_text, imports.as_deref(), args.lookahead)?;

    match &args.output {
        Some(path) => fs::write(path, source)?,
        None => io::stdout().write_all(source.as_bytes())?,
    }
    Ok(())
}
