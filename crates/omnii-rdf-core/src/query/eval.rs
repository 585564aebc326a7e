//! Pattern evaluation.
//!
//! Required triples are joined in a greedy order (most-bound pattern
//! first), each step probing the store with the positions the current
//! binding fixes. Optional groups and existence filters run after the
//! required join. Row limits apply only to the final result.

use super::{GroupPattern, Projection, Query, QueryTriple, TermPattern};
use crate::graph::{TriplePattern, TripleStore};
use crate::types::{RdfError, Subject, Term, Triple};
use crate::vocab::{DEFAULT_QUERY_LIMIT, DEFAULT_QUERY_TIMEOUT_SECS};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

/// Variable name to bound term.
pub type Binding = BTreeMap<String, Term>;

/// Per-evaluation limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Row cap; combined with the query's own `LIMIT` by taking the smaller.
    pub limit: Option<usize>,
    pub timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_QUERY_LIMIT),
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

/// Evaluation result: column names plus rows.
///
/// A row omits variables left unbound by an unmatched optional group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solutions {
    pub variables: Vec<String>,
    pub rows: Vec<Binding>,
}

/// Evaluate a parsed query against a store.
pub fn evaluate<S: TripleStore + ?Sized>(
    store: &S,
    query: &Query,
    options: &QueryOptions,
) -> Result<Solutions, RdfError> {
    evaluate_within(store, query, options.limit, &Deadline::start(options.timeout))
}

/// Evaluate against a deadline started by the caller, so work done before
/// evaluation (reasoning) counts against the same budget.
pub fn evaluate_within<S: TripleStore + ?Sized>(
    store: &S,
    query: &Query,
    limit: Option<usize>,
    deadline: &Deadline,
) -> Result<Solutions, RdfError> {
    let evaluator = Evaluator { store, deadline };
    let mut rows = evaluator.group(&query.pattern, vec![Binding::new()])?;

    let variables = query.variables();
    if let Projection::Variables(vars) = &query.projection {
        for row in &mut rows {
            row.retain(|name, _| vars.contains(name));
        }
    }

    if query.distinct {
        let mut seen: BTreeSet<Binding> = BTreeSet::new();
        rows.retain(|row| seen.insert(row.clone()));
    }

    let limit = match (query.limit, limit) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    Ok(Solutions { variables, rows })
}

// =============================================================================
// DEADLINE
// =============================================================================

/// A time budget started once and checked by every phase of a request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    #[must_use]
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// `QueryTimeout` carrying the full budget once it is spent.
    pub fn check(&self) -> Result<(), RdfError> {
        if self.started.elapsed() >= self.budget {
            Err(RdfError::QueryTimeout(self.budget))
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// EVALUATOR
// =============================================================================

struct Evaluator<'s, S: ?Sized> {
    store: &'s S,
    deadline: &'s Deadline,
}

impl<S: TripleStore + ?Sized> Evaluator<'_, S> {
    fn group(&self, group: &GroupPattern, seeds: Vec<Binding>) -> Result<Vec<Binding>, RdfError> {
        let mut rows = seeds;

        for pattern in plan(&group.triples, rows.first()) {
            if rows.is_empty() {
                break;
            }
            rows = self.join(pattern, rows)?;
        }

        for optional in &group.optionals {
            rows = self.left_join(optional, rows)?;
        }

        if group.exists.is_empty() && group.not_exists.is_empty() {
            return Ok(rows);
        }

        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            self.deadline.check()?;
            if self.passes_filters(group, &row)? {
                kept.push(row);
            }
        }
        Ok(kept)
    }

    fn join(&self, pattern: &QueryTriple, rows: Vec<Binding>) -> Result<Vec<Binding>, RdfError> {
        let mut out = Vec::new();
        for row in rows {
            self.deadline.check()?;
            let Some(lookup) = lookup_for(pattern, &row) else {
                continue;
            };
            for triple in self.store.matches(lookup) {
                if let Some(extended) = extend(&row, pattern, triple) {
                    self.deadline.check()?;
                    out.push(extended);
                }
            }
        }
        Ok(out)
    }

    /// Rows the optional group extends are replaced by their extensions;
    /// the rest pass through unchanged.
    fn left_join(&self, optional: &GroupPattern, rows: Vec<Binding>) -> Result<Vec<Binding>, RdfError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            self.deadline.check()?;
            let extended = self.group(optional, vec![row.clone()])?;
            if extended.is_empty() {
                out.push(row);
            } else {
                out.extend(extended);
            }
        }
        Ok(out)
    }

    fn passes_filters(&self, group: &GroupPattern, row: &Binding) -> Result<bool, RdfError> {
        for required in &group.exists {
            if self.group(required, vec![row.clone()])?.is_empty() {
                return Ok(false);
            }
        }
        for forbidden in &group.not_exists {
            if !self.group(forbidden, vec![row.clone()])?.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// =============================================================================
// PLANNING & BINDING
// =============================================================================

/// Greedy join order: repeatedly take the pattern with the most positions
/// fixed by constants or already-bound variables. Ties keep text order.
fn plan<'q>(triples: &'q [QueryTriple], seed: Option<&Binding>) -> Vec<&'q QueryTriple> {
    let mut bound: BTreeSet<&str> = seed
        .map(|row| row.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let mut remaining: Vec<&QueryTriple> = triples.iter().collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let score = |t: &QueryTriple| {
            [&t.subject, &t.predicate, &t.object]
                .into_iter()
                .filter(|p| match p {
                    TermPattern::Term(_) => true,
                    TermPattern::Variable(name) => bound.contains(name.as_str()),
                })
                .count()
        };
        let mut best = 0;
        for (idx, candidate) in remaining.iter().enumerate() {
            if score(*candidate) > score(remaining[best]) {
                best = idx;
            }
        }
        let chosen = remaining.remove(best);
        bound.extend(chosen.variables());
        ordered.push(chosen);
    }

    ordered
}

fn fixed<'a>(pattern: &'a TermPattern, row: &'a Binding) -> Option<&'a Term> {
    match pattern {
        TermPattern::Term(term) => Some(term),
        TermPattern::Variable(name) => row.get(name),
    }
}

/// The store lookup for `pattern` under `row`; `None` when a fixed term
/// cannot occupy its position (a literal subject, a non-IRI predicate).
fn lookup_for(pattern: &QueryTriple, row: &Binding) -> Option<TriplePattern> {
    let subject = match fixed(&pattern.subject, row) {
        Some(term) => Some(Subject::from_term(term)?),
        None => None,
    };
    let predicate = match fixed(&pattern.predicate, row) {
        Some(term) => Some(term.as_iri()?.clone()),
        None => None,
    };
    let object = fixed(&pattern.object, row).cloned();
    Some(TriplePattern {
        subject,
        predicate,
        object,
    })
}

/// Bind the pattern's variables to the matched triple. `None` when a
/// variable repeated within the pattern would need two values.
fn extend(row: &Binding, pattern: &QueryTriple, triple: Triple) -> Option<Binding> {
    let Triple {
        subject,
        predicate,
        object,
    } = triple;
    let mut out = row.clone();
    for (position, value) in [
        (&pattern.subject, Term::from(subject)),
        (&pattern.predicate, Term::Iri(predicate)),
        (&pattern.object, object),
    ] {
        let TermPattern::Variable(name) = position else {
            continue;
        };
        match out.get(name) {
            Some(existing) if *existing != value => return None,
            Some(_) => {}
            None => {
                out.insert(name.clone(), value);
            }
        }
    }
    Some(out)
}

// =============================================================================
// TESTS
// =============================================================================
