//! # Core Type Definitions
//!
//! This module contains all core types for the knowledge store:
//! - RDF terms (`Iri`, `Literal`, `BlankNode`, `Term`, `Subject`)
//! - Facts (`Triple`)
//! - The JSON view of a term used in query results (`TermView`)
//! - Error types (`RdfError`)
//!
//! ## Ordering Guarantees
//!
//! All term types implement `Ord`, so every index in the store is a
//! `BTreeMap`/`BTreeSet` and iteration order is deterministic.

use crate::vocab::XSD_STRING;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// IRI
// =============================================================================

/// An absolute resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iri(String);

impl Iri {
    /// Create an IRI from a string. No normalization is applied.
    #[must_use]
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the IRI carries a scheme (`scheme:rest`).
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        has_scheme(&self.0)
    }

    /// Whether the IRI is absolute and well-formed, i.e. the Turtle and
    /// N-Triples writers can emit it and read it back.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_absolute() && oxrdf::NamedNode::new(self.0.as_str()).is_ok()
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// `scheme ":"` where scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ).
pub(crate) fn has_scheme(iri: &str) -> bool {
    let Some((scheme, _)) = iri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// =============================================================================
// BLANK NODE
// =============================================================================

/// A graph-local anonymous node.
///
/// The label only has meaning inside the graph (or document) that produced
/// it. Merging into the store relabels blank nodes, see
/// [`Graph::merge_scoped`](crate::graph::Graph::merge_scoped).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlankNode(String);

impl BlankNode {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

// =============================================================================
// LITERAL
// =============================================================================

/// Datatype or language annotation of a literal.
///
/// A literal carries at most one of the two, so the choice is an enum
/// rather than two optional fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LiteralAnnotation {
    Plain,
    Datatype(Iri),
    Language(String),
}

/// A data value: lexical form plus optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    value: String,
    annotation: LiteralAnnotation,
}

impl Literal {
    /// A plain string literal.
    #[must_use]
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            annotation: LiteralAnnotation::Plain,
        }
    }

    /// A literal with an explicit datatype. `xsd:string` is the datatype
    /// every plain literal already has, so it yields a plain literal.
    #[must_use]
    pub fn typed(value: impl Into<String>, datatype: Iri) -> Self {
        let annotation = if datatype.as_str() == XSD_STRING {
            LiteralAnnotation::Plain
        } else {
            LiteralAnnotation::Datatype(datatype)
        };
        Self {
            value: value.into(),
            annotation,
        }
    }

    /// A language-tagged string.
    #[must_use]
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            annotation: LiteralAnnotation::Language(language.into()),
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn annotation(&self) -> &LiteralAnnotation {
        &self.annotation
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&Iri> {
        match &self.annotation {
            LiteralAnnotation::Datatype(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match &self.annotation {
            LiteralAnnotation::Language(tag) => Some(tag),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_string(&self.value))?;
        match &self.annotation {
            LiteralAnnotation::Plain => Ok(()),
            LiteralAnnotation::Datatype(dt) => write!(f, "^^{dt}"),
            LiteralAnnotation::Language(tag) => write!(f, "@{tag}"),
        }
    }
}

/// Escape a lexical form for a double-quoted N-Triples / Turtle string.
pub(crate) fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

// =============================================================================
// TERM & SUBJECT
// =============================================================================

/// Any RDF term. Result shaping matches exhaustively on this enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
    BlankNode(BlankNode),
}

impl Term {
    #[must_use]
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(Iri::new(iri))
    }

    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal::simple(value))
    }

    #[must_use]
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => iri.fmt(f),
            Self::Literal(lit) => lit.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

/// A term allowed in subject position: never a literal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    Iri(Iri),
    BlankNode(BlankNode),
}

impl Subject {
    #[must_use]
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(Iri::new(iri))
    }

    /// Convert a term to a subject; `None` for literals.
    #[must_use]
    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::Iri(iri) => Some(Self::Iri(iri.clone())),
            Term::BlankNode(node) => Some(Self::BlankNode(node.clone())),
            Term::Literal(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => iri.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
        }
    }
}

impl From<Iri> for Subject {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<Subject> for Term {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Iri(iri) => Self::Iri(iri),
            Subject::BlankNode(node) => Self::BlankNode(node),
        }
    }
}

// =============================================================================
// TRIPLE
// =============================================================================

/// A subject-predicate-object fact.
///
/// Identity is structural: two triples with equal components are the same
/// fact, which is what makes store insertion idempotent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    #[must_use]
    pub fn new(subject: impl Into<Subject>, predicate: Iri, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    pub(crate) fn from_refs(subject: &Subject, predicate: &Iri, object: &Term) -> Self {
        Self {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: object.clone(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

// =============================================================================
// TERM VIEW (result cells)
// =============================================================================

/// Kind tag of a result cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Uri,
    Literal,
    Blank,
}

/// The JSON shape of a bound term in a query result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermView {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl From<&Term> for TermView {
    fn from(term: &Term) -> Self {
        match term {
            Term::Iri(iri) => Self {
                kind: TermKind::Uri,
                value: iri.as_str().to_string(),
                datatype: None,
                language: None,
            },
            Term::Literal(lit) => Self {
                kind: TermKind::Literal,
                value: lit.value().to_string(),
                datatype: lit.datatype().map(|dt| dt.as_str().to_string()),
                language: lit.language().map(str::to_string),
            },
            Term::BlankNode(node) => Self {
                kind: TermKind::Blank,
                value: node.label().to_string(),
                datatype: None,
                language: None,
            },
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the knowledge store.
///
/// - Store, query and reasoner never fail on structurally valid input
/// - The boundary converts every error into a `success: false` response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RdfError {
    /// Malformed query pattern or malformed import text.
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Query evaluation exceeded its time budget.
    #[error("Query timed out after {0:?}")]
    QueryTimeout(Duration),

    /// An import or mutation was rejected; the store is unchanged.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested serialization format is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid service configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred (CLI and server boundary only).
    #[error("I/O error: {0}")]
    Io(String),
}

impl RdfError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
