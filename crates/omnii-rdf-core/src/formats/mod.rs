//! # Text Formats
//!
//! Import and export of graphs as Turtle or N-Triples text.
//!
//! Reading and writing is done by `oxttl`; this module converts between
//! its `oxrdf` terms and the store's own [`Term`](crate::types::Term) model.
//!
//! Parsing always produces a standalone [`Graph`]; nothing touches the live
//! store until the whole document has parsed. Blank node labels are kept as
//! the parser reports them, so the document-local graph round-trips; scoping
//! them to the store happens on merge.
//!
//! File I/O is in the app layer.

mod ntriples;
mod terms;
mod turtle;

use crate::graph::Graph;
use crate::types::RdfError;
use oxttl::TurtleSyntaxError;
use std::fmt;
use std::str::FromStr;

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfFormat {
    #[default]
    Turtle,
    NTriples,
}

impl RdfFormat {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::NTriples => "nt",
        }
    }

    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::NTriples => "application/n-triples",
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RdfFormat {
    type Err = RdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turtle" | "ttl" | "text/turtle" => Ok(Self::Turtle),
            "nt" | "ntriples" | "n-triples" | "application/n-triples" => Ok(Self::NTriples),
            _ => Err(RdfError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Parse a document into a standalone graph.
pub fn parse(text: &str, format: RdfFormat) -> Result<Graph, RdfError> {
    match format {
        RdfFormat::Turtle => turtle::parse(text),
        RdfFormat::NTriples => ntriples::parse(text),
    }
}

/// Serialize a graph.
///
/// Fails only if the graph holds a term the formats cannot express, such as
/// an IRI with spaces in it.
pub fn serialize(graph: &Graph, format: RdfFormat) -> Result<String, RdfError> {
    match format {
        RdfFormat::Turtle => turtle::write(graph),
        RdfFormat::NTriples => ntriples::write(graph),
    }
}

/// Parser positions are zero-based; ours are one-based.
fn syntax_error(e: &TurtleSyntaxError) -> RdfError {
    let start = e.location().start;
    RdfError::syntax(
        (start.line as usize).saturating_add(1),
        (start.column as usize).saturating_add(1),
        e.message(),
    )
}
