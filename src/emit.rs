//! Source emission.
//!
//! Renders the parsing table as nested static slices and appends a fixed
//! table-driven runtime. The runtime is parameterized only through the
//! emitted constants (start symbol, k), so the skeleton itself is a
//! verbatim template. The emitted file depends on nothing outside the
//! standard library.

use itertools::Itertools;

use crate::grammar::Grammar;
use crate::symbol::Symbol;
use crate::table::ParseTable;

/// Writes lines at a managed indentation level.
struct CodeWriter {
    out: String,
    indent: usize,
}

const INDENT: usize = 4;

impl CodeWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn inc_indent(&mut self) {
        self.indent += INDENT;
    }

    fn dec_indent(&mut self) {
        self.indent -= INDENT;
    }

    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn into_string(self) -> String {
        self.out
    }
}

fn quoted(text: &str) -> String {
    format!("{:?}", text)
}

/// Renders the generated parser source.
pub fn render(grammar: &Grammar, table: &ParseTable, k: usize, imports: Option<&str>) -> String {
    let mut w = CodeWriter::new();

    w.line("//! Table-driven LL(k) parser. Generated by llkgen; do not edit.");
    w.line("");
    if let Some(imports) = imports {
        for line in imports.lines() {
            w.line(line);
        }
        w.line("");
    }

    w.line("/// Lookahead window size.");
    w.line(&format!("pub const K: usize = {};", k));
    w.line("/// Start symbol of the grammar.");
    w.line(&format!(
        "pub const START_SYMBOL: &str = {};",
        quoted(grammar.start())
    ));
    w.line("/// Node kind of the empty derivation.");
    w.line("pub const EPSILON: &str = \"ε\";");
    w.line("/// Token type reported at end of input.");
    w.line("pub const END_OF_INPUT: &str = \"$\";");
    w.line("");

    let terminals: Vec<String> = grammar
        .productions()
        .iter()
        .flat_map(|p| p.rhs.iter())
        .filter_map(|s| match s {
            Symbol::Terminal(text) => Some(text.clone()),
            _ => None,
        })
        .sorted()
        .dedup()
        .collect();
    w.line("/// Token types the parser consumes.");
    w.line(&format!(
        "static TERMINALS: &[&str] = &[{}];",
        terminals.iter().map(|t| quoted(t)).join(", ")
    ));
    w.line("");

    w.line("/// One production: left-hand side and its rhs symbols.");
    w.line("type Rule = (&'static str, &'static [&'static str]);");
    w.line("");
    w.line("/// Nonterminal rows mapping lookahead type tuples to productions.");
    w.line("static TABLE: &[(&str, &[(&'static [&'static str], Rule)])] = &[");
    w.inc_indent();
    for (nonterm, row) in table {
        if row.is_empty() {
            continue;
        }
        w.line(&format!("({}, &[", quoted(nonterm)));
        w.inc_indent();
        for (lookahead, production) in row {
            let key = lookahead
                .symbols()
                .iter()
                .map(|s| quoted(s.token_text()))
                .join(", ");
            let rhs = production
                .rhs
                .iter()
                .map(|s| quoted(s.token_text()))
                .join(", ");
            w.line(&format!(
                "(&[{}], ({}, &[{}])),",
                key,
                quoted(&production.lhs),
                rhs
            ));
        }
        w.dec_indent();
        w.line("]),");
    }
    w.dec_indent();
    w.line("];");

    w.raw(RUNTIME);
    w.into_string()
}

/// The fixed stack-driven runtime appended after the table.
const RUNTIME: &str = r#"
/// A token as the generated parser sees it.
pub trait Token {
    /// The terminal kind this token matches.
    fn token_type(&self) -> &str;
}

/// A parse-tree node: terminal nodes carry the matched token.
#[derive(Debug)]
pub struct Node<T> {
    pub kind: &'static str,
    pub value: Option<T>,
    pub children: Vec<Node<T>>,
}

impl<T> Node<T> {
    fn new(kind: &'static str) -> Self {
        Node {
            kind,
            value: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum ParseError {
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    UnknownNonterminal(&'static str),
    NoTableEntry {
        nonterminal: &'static str,
        lookahead: Vec<String>,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "expected a token of type {}, found {}", expected, found)
            }
            ParseError::UnknownNonterminal(kind) => {
                write!(f, "node kind {} is not part of the grammar", kind)
            }
            ParseError::NoTableEntry {
                nonterminal,
                lookahead,
            } => write!(
                f,
                "no production of {} matches the lookahead {:?}",
                nonterminal, lookahead
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Table-driven predictive parser over a token stream.
pub struct Parser<T, I> {
    tokens: I,
    buffer: Vec<Option<T>>,
}

impl<T: Token, I: Iterator<Item = T>> Parser<T, I> {
    pub fn new(tokens: I) -> Self {
        Parser {
            tokens,
            buffer: Vec::new(),
        }
    }

    fn fill_buffer(&mut self) {
        while self.buffer.len() < K {
            match self.tokens.next() {
                Some(token) => self.buffer.push(Some(token)),
                None => {
                    if !self.buffer.iter().any(Option::is_none) {
                        self.buffer.push(None);
                    }
                    break;
                }
            }
        }
    }

    fn buffer_types(&self) -> Vec<&str> {
        self.buffer
            .iter()
            .map(|slot| slot.as_ref().map_or(END_OF_INPUT, Token::token_type))
            .collect()
    }

    fn row(kind: &str) -> Option<&'static [(&'static [&'static str], Rule)]> {
        TABLE
            .iter()
            .find(|(nonterm, _)| *nonterm == kind)
            .map(|(_, row)| *row)
    }

    /// Looks up the row entry for a type tuple, dropping the rightmost
    /// element until something matches.
    fn lookup(
        row: &'static [(&'static [&'static str], Rule)],
        types: &[&str],
    ) -> Option<&'static Rule> {
        let mut n = types.len();
        while n > 0 {
            let hit = row.iter().find(|(key, _)| {
                key.len() == n && key.iter().copied().eq(types[..n].iter().copied())
            });
            if let Some((_, rule)) = hit {
                return Some(rule);
            }
            n -= 1;
        }
        None
    }

    /// Builds the parse tree for the buffered token stream.
    pub fn parse(mut self) -> Result<Node<T>, ParseError> {
        let mut arena: Vec<Option<Node<T>>> = vec![Some(Node::new(START_SYMBOL))];
        let mut children: Vec<Vec<usize>> = vec![Vec::new()];
        let mut stack: Vec<usize> = vec![0];
        self.fill_buffer();

        while let Some(index) = stack.pop() {
            let kind = arena[index].as_ref().expect("node not yet assembled").kind;
            if kind == EPSILON {
                continue;
            }

            if TERMINALS.contains(&kind) {
                let head = self
                    .buffer
                    .first()
                    .and_then(|slot| slot.as_ref())
                    .map(Token::token_type);
                if head != Some(kind) {
                    return Err(ParseError::UnexpectedToken {
                        expected: kind,
                        found: head.unwrap_or(END_OF_INPUT).to_string(),
                    });
                }
                let token = self.buffer.remove(0).expect("head token present");
                arena[index].as_mut().expect("node not yet assembled").value = Some(token);
                self.fill_buffer();
                continue;
            }

            let row = match Self::row(kind) {
                Some(row) => row,
                None => return Err(ParseError::UnknownNonterminal(kind)),
            };
            let types = self.buffer_types();
            let (_, rhs) = match Self::lookup(row, &types) {
                Some(rule) => rule,
                None => {
                    return Err(ParseError::NoTableEntry {
                        nonterminal: kind,
                        lookahead: types.iter().map(|t| t.to_string()).collect(),
                    });
                }
            };

            let mut child_indices = Vec::with_capacity(rhs.len());
            for &symbol in rhs.iter() {
                arena.push(Some(Node::new(symbol)));
                children.push(Vec::new());
                child_indices.push(arena.len() - 1);
            }
            children[index] = child_indices.clone();
            // Reversed so the leftmost child is expanded first.
            for &child in child_indices.iter().rev() {
                stack.push(child);
            }
        }

        Ok(Self::assemble(&mut arena, &children, 0))
    }

    fn assemble(
        arena: &mut Vec<Option<Node<T>>>,
        children: &[Vec<usize>],
        index: usize,
    ) -> Node<T> {
        let mut node = arena[index].take().expect("each node assembled once");
        for &child in &children[index] {
            node.children.push(Self::assemble(arena, children, child));
        }
        node
    }
}
"#;
