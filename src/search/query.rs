//! Query language
//!
//! Whitespace-separated terms: `+term` must match, `-term` must not match,
//! a bare `term` should match. When a query has bare terms a hit has to
//! match at least one of them, on top of every `+`/`-` constraint.

use super::index::tokenize;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    MustNot,
    Should,
}

/// One term of a query
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub occur: Occur,
    /// Term as typed, lower-cased, without its prefix
    pub term: String,
    /// Words the term tokenizes to; all must appear in the same field
    pub tokens: Vec<String>,
}

impl Clause {
    pub fn is_positive(&self) -> bool {
        self.occur != Occur::MustNot
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    pub fn parse(input: &str) -> Result<Self> {
        let clauses = input
            .split_whitespace()
            .map(parse_clause)
            .collect::<Result<Vec<_>>>()?;
        if clauses.is_empty() {
            return Err(Error::Query("query is empty".to_string()));
        }
        Ok(Self { clauses })
    }

    pub fn with(&self, occur: Occur) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(move |c| c.occur == occur)
    }

    pub fn has_should(&self) -> bool {
        self.with(Occur::Should).next().is_some()
    }

    /// Clauses that contribute to score and highlighting
    pub fn positive(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| c.is_positive())
    }
}

fn parse_clause(raw: &str) -> Result<Clause> {
    let (occur, term) = match raw.chars().next() {
        Some('+') => (Occur::Must, &raw[1..]),
        Some('-') => (Occur::MustNot, &raw[1..]),
        _ => (Occur::Should, raw),
    };
    if term.is_empty() {
        return Err(Error::Query(format!("empty term after '{}'", raw)));
    }

    let tokens: Vec<String> = tokenize(term).into_iter().map(|t| t.text).collect();
    if tokens.is_empty() {
        return Err(Error::Query(format!("term '{}' has no searchable words", term)));
    }

    Ok(Clause {
        occur,
        term: term.to_lowercase(),
        tokens,
    })
}
