//! LL(k) parsing-table generator.
//!
//! Reads a BNF grammar, computes the k-lookahead FIRST and FOLLOW sets,
//! assembles the LL(k) parsing table and emits a table-driven parser.

use std::process;

use clap::Parser;

use llkgen::cli;

fn main() {
    env_logger::init();
    let args = cli::Args::parse();
    if let Err(e) = cli::run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
