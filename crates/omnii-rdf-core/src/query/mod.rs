//! # Query Module
//!
//! Conjunctive pattern queries over a [`TripleStore`](crate::graph::TripleStore).
//!
//! Supported subset: `PREFIX`/`BASE`, `SELECT [DISTINCT] ?v… | *`,
//! basic graph patterns with `;`/`,` abbreviations and `a`, nested
//! `OPTIONAL { }`, `FILTER EXISTS { }`, `FILTER NOT EXISTS { }` and
//! `LIMIT n`. Anything else is a syntax error.
//!
//! - Parsing is deterministic: the same text always yields the same `Query`
//! - Evaluation is bounded by a deadline checked per partial binding
//! - Group nesting is capped at [`MAX_NESTING_DEPTH`](crate::vocab::MAX_NESTING_DEPTH)

mod eval;
mod parser;

pub use eval::{Binding, Deadline, QueryOptions, Solutions, evaluate, evaluate_within};

use crate::types::{RdfError, Term};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A position in a query pattern: a fixed term or a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermPattern {
    Term(Term),
    Variable(String),
}

impl TermPattern {
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            Self::Term(_) => None,
        }
    }
}

/// One triple pattern of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTriple {
    pub subject: TermPattern,
    pub predicate: TermPattern,
    pub object: TermPattern,
}

impl QueryTriple {
    /// Variables in subject, predicate, object order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(TermPattern::variable)
    }
}

/// A `{ ... }` block.
///
/// Required triples are joined first; optional groups extend the result;
/// existence filters keep or drop each binding without adding variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPattern {
    pub triples: Vec<QueryTriple>,
    pub optionals: Vec<GroupPattern>,
    pub exists: Vec<GroupPattern>,
    pub not_exists: Vec<GroupPattern>,
}

impl GroupPattern {
    /// Variables bound by this group (required and optional parts), in
    /// first-appearance order. Filter-only variables are not included.
    #[must_use]
    pub fn bound_variables(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        for name in self.triples.iter().flat_map(QueryTriple::variables) {
            if !out.iter().any(|seen| seen == name) {
                out.push(name.to_string());
            }
        }
        for optional in &self.optionals {
            optional.collect_variables(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`
    All,
    Variables(Vec<String>),
}

/// A parsed `SELECT` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub projection: Projection,
    pub distinct: bool,
    pub pattern: GroupPattern,
    pub limit: Option<usize>,
}

impl Query {
    /// Parse query text with only the standard prefixes pre-bound.
    pub fn parse(text: &str) -> Result<Self, RdfError> {
        parser::parse(text, &BTreeMap::new())
    }

    /// Parse with additional caller-supplied prefix bindings.
    ///
    /// Declarations inside the query text take precedence.
    pub fn parse_with_prefixes(
        text: &str,
        prefixes: &BTreeMap<String, String>,
    ) -> Result<Self, RdfError> {
        parser::parse(text, prefixes)
    }

    /// Result column names, in order.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        match &self.projection {
            Projection::All => self.pattern.bound_variables(),
            Projection::Variables(vars) => vars.clone(),
        }
    }
}

impl FromStr for Query {
    type Err = RdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
