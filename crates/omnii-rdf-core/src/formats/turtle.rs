//! Turtle reader and writer.
//!
//! The standard prefixes are pre-bound on read, so documents may use
//! `omnii:`, `rdfs:` and friends without declaring them. The writer
//! declares only the standard prefixes the graph actually uses.

use super::syntax_error;
use super::terms::{triple_from_ox, triple_to_ox};
use crate::graph::{Graph, TripleStore};
use crate::types::{Iri, RdfError, Subject, Term};
use crate::vocab::STANDARD_PREFIXES;
use oxttl::{TurtleParser, TurtleSerializer};
use std::collections::BTreeSet;

// =============================================================================
// READER
// =============================================================================

pub(super) fn parse(text: &str) -> Result<Graph, RdfError> {
    let mut parser = TurtleParser::new();
    for (prefix, namespace) in STANDARD_PREFIXES {
        parser = parser
            .with_prefix(prefix, namespace)
            .map_err(|e| RdfError::Config(format!("prefix {prefix}: {e}")))?;
    }

    let mut graph = Graph::new();
    for triple in parser.for_slice(text.as_bytes()) {
        let triple = triple.map_err(|e| syntax_error(&e))?;
        graph.insert(triple_from_ox(triple)?);
    }
    Ok(graph)
}

// =============================================================================
// WRITER
// =============================================================================

/// Standard prefixes whose namespace some IRI in the graph starts with.
fn used_prefixes(graph: &Graph) -> Vec<(&'static str, &'static str)> {
    let mut used: BTreeSet<&str> = BTreeSet::new();
    let mut note = |iri: &Iri| {
        for (prefix, ns) in STANDARD_PREFIXES {
            if iri.as_str().starts_with(ns) {
                used.insert(prefix);
            }
        }
    };

    for triple in graph.iter() {
        if let Subject::Iri(iri) = &triple.subject {
            note(iri);
        }
        note(&triple.predicate);
        match &triple.object {
            Term::Iri(iri) => note(iri),
            Term::Literal(lit) => {
                if let Some(dt) = lit.datatype() {
                    note(dt);
                }
            }
            Term::BlankNode(_) => {}
        }
    }

    STANDARD_PREFIXES
        .iter()
        .filter(|(prefix, _)| used.contains(prefix))
        .copied()
        .collect()
}

pub(super) fn write(graph: &Graph) -> Result<String, RdfError> {
    if graph.is_empty() {
        return Ok(String::new());
    }

    let mut serializer = TurtleSerializer::new();
    for (prefix, namespace) in used_prefixes(graph) {
        serializer = serializer
            .with_prefix(prefix, namespace)
            .map_err(|e| RdfError::Config(format!("prefix {prefix}: {e}")))?;
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in graph.iter() {
        writer
            .serialize_triple(&triple_to_ox(&triple)?)
            .map_err(|e| RdfError::Io(e.to_string()))?;
    }
    let bytes = writer.finish().map_err(|e| RdfError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RdfError::Io(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
