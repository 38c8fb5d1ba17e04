//! Line-oriented BNF reader.
//!
//! Grammar files look like:
//!
//! ```text
//! # tokens are double-quoted, nonterminals angle-bracketed
//! start: <S>
//!
//! <S> ::= <A> "b"
//!     | ε
//! <A> ::= "a"
//! ```
//!
//! Alternatives are separated by `|`; a continuation line starting with
//! `|` extends the previous production. Backslashes inside terminal
//! literals are stripped wholesale.

use crate::error::{GrammarError, Result};
use crate::subproduction::SubProduction;
use crate::symbol::Symbol;

/// Parsed grammar text: the start marker plus the productions in file
/// order, one entry per alternative.
#[derive(Debug, Clone)]
pub struct GrammarAst {
    pub start: String,
    pub productions: Vec<(String, SubProduction)>,
}

/// Parses grammar text into an AST.
pub fn parse(text: &str) -> Result<GrammarAst> {
    let mut start = None;
    let mut productions: Vec<(String, SubProduction)> = Vec::new();
    let mut current_lhs: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("start:") {
            let name = rest.trim();
            let name = name
                .strip_prefix('<')
                .and_then(|n| n.strip_suffix('>'))
                .unwrap_or(name);
            if name.is_empty() {
                return Err(GrammarError::InvalidFormat(
                    "empty start marker".to_string(),
                ));
            }
            start = Some(name.to_string());
            continue;
        }

        if let Some(continuation) = trimmed.strip_prefix('|') {
            let lhs = current_lhs
                .clone()
                .ok_or_else(|| GrammarError::InvalidProduction(line.to_string()))?;
            for alternative in split_alternatives(continuation)? {
                productions.push((lhs.clone(), alternative));
            }
            continue;
        }

        let (lhs_text, rhs_text) = trimmed
            .split_once("::=")
            .ok_or_else(|| GrammarError::InvalidProduction(line.to_string()))?;
        let lhs = match tokenize(lhs_text)?.as_slice() {
            [Tok::Sym(Symbol::Nonterminal(name))] => name.clone(),
            _ => return Err(GrammarError::InvalidProduction(line.to_string())),
        };
        for alternative in split_alternatives(rhs_text)? {
            productions.push((lhs.clone(), alternative));
        }
        current_lhs = Some(lhs);
    }

    if productions.is_empty() {
        return Err(GrammarError::InvalidFormat("no productions".to_string()));
    }
    let start = start.ok_or(GrammarError::MissingStart)?;
    Ok(GrammarAst { start, productions })
}

/// One scanned element of a production line.
enum Tok {
    Sym(Symbol),
    Pipe,
}

fn split_alternatives(text: &str) -> Result<Vec<SubProduction>> {
    let toks = tokenize(text)?;
    let mut alternatives = Vec::new();
    let mut current = Vec::new();
    for tok in toks {
        match tok {
            Tok::Pipe => alternatives.push(SubProduction::new(std::mem::take(&mut current))),
            Tok::Sym(symbol) => current.push(symbol),
        }
    }
    alternatives.push(SubProduction::new(current));
    for alternative in &alternatives {
        if alternative.is_empty() {
            return Err(GrammarError::InvalidProduction(text.trim().to_string()));
        }
    }
    Ok(alternatives)
}

fn tokenize(text: &str) -> Result<Vec<Tok>> {
    let mut toks = Vec::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '|' => toks.push(Tok::Pipe),
            'ε' => toks.push(Tok::Sym(Symbol::Epsilon)),
            '<' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '>' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed || name.is_empty() {
                    return Err(GrammarError::InvalidProduction(text.trim().to_string()));
                }
                toks.push(Tok::Sym(Symbol::Nonterminal(name)));
            }
            '"' => {
                let mut literal = String::new();
                let mut closed = false;
                let mut escaped = false;
                for c in chars.by_ref() {
                    if escaped {
                        // Backslashes are stripped wholesale; the escaped
                        // character itself survives, except a backslash.
                        if c != '\\' {
                            literal.push(c);
                        }
                        escaped = false;
                        continue;
                    }
                    match c {
                        '\\' => escaped = true,
                        '"' => {
                            closed = true;
                            break;
                        }
                        other => literal.push(other),
                    }
                }
                if !closed {
                    return Err(GrammarError::InvalidProduction(text.trim().to_string()));
                }
                toks.push(Tok::Sym(Symbol::Terminal(literal)));
            }
            other => {
                return Err(GrammarError::InvalidFormat(format!(
                    "unexpected character {:?} in {:?}",
                    other,
                    text.trim()
                )));
            }
        }
    }

    Ok(toks)
}
