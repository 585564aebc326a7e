//! N-Triples: one fully written-out triple per line.

use super::syntax_error;
use super::terms::{triple_from_ox, triple_to_ox};
use crate::graph::{Graph, TripleStore};
use crate::types::RdfError;
use oxttl::NTriplesParser;

pub(super) fn parse(text: &str) -> Result<Graph, RdfError> {
    let mut graph = Graph::new();
    for triple in NTriplesParser::new().for_slice(text.as_bytes()) {
        let triple = triple.map_err(|e| syntax_error(&e))?;
        graph.insert(triple_from_ox(triple)?);
    }
    Ok(graph)
}

/// `oxrdf` displays a triple in N-Triples form, without the final dot.
pub(super) fn write(graph: &Graph) -> Result<String, RdfError> {
    let mut out = String::new();
    for triple in graph.iter() {
        out.push_str(&triple_to_ox(&triple)?.to_string());
        out.push_str(" .\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_triple() {
        let doc = "<http://x.org/a> <http://x.org/p> \"v\"@en .\n\
                   _:b1 <http://x.org/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n";
        let graph = parse(doc).expect("parse");
        assert_eq!(graph.len(), 2);
        assert_eq!(write(&graph).expect("write").lines().count(), 2);
    }

    #[test]
    fn blank_labels_survive_a_round_trip() {
        let doc = "_:x <http://x.org/p> _:y .\n";
        let graph = parse(doc).expect("parse");
        assert_eq!(write(&graph).expect("write"), doc);
    }

    #[test]
    fn abbreviations_are_not_ntriples() {
        assert!(parse("<http://x.org/a> <http://x.org/b> <http://x.org/c> .").is_ok());
        assert!(parse("<http://x.org/a> a <http://x.org/C> .").is_err());
        assert!(parse("<http://x.org/a> <http://x.org/b> 5 .").is_err());
    }
}
