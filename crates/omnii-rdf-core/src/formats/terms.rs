//! Conversion between `oxrdf` terms and the store's term model.

use crate::types::{BlankNode, Iri, Literal, RdfError, Subject, Term, Triple};
use crate::vocab::XSD_STRING;

// =============================================================================
// INBOUND
// =============================================================================

fn term_from_ox(term: oxrdf::Term) -> Term {
    match term {
        oxrdf::Term::NamedNode(node) => Term::Iri(Iri::new(node.into_string())),
        oxrdf::Term::BlankNode(node) => Term::BlankNode(BlankNode::new(node.into_string())),
        oxrdf::Term::Literal(lit) => Term::Literal(literal_from_ox(&lit)),
    }
}

/// A simple literal comes back typed `xsd:string`; it is stored plain.
fn literal_from_ox(lit: &oxrdf::Literal) -> Literal {
    if let Some(language) = lit.language() {
        return Literal::lang(lit.value(), language);
    }
    let datatype = lit.datatype();
    if datatype.as_str() == XSD_STRING {
        Literal::simple(lit.value())
    } else {
        Literal::typed(lit.value(), Iri::new(datatype.as_str()))
    }
}

pub(super) fn triple_from_ox(triple: oxrdf::Triple) -> Result<Triple, RdfError> {
    let subject = match term_from_ox(oxrdf::Term::from(triple.subject)) {
        Term::Iri(iri) => Subject::Iri(iri),
        Term::BlankNode(node) => Subject::BlankNode(node),
        Term::Literal(_) => {
            return Err(RdfError::Validation("literal in subject position".to_string()));
        }
    };
    Ok(Triple {
        subject,
        predicate: Iri::new(triple.predicate.into_string()),
        object: term_from_ox(triple.object),
    })
}

// =============================================================================
// OUTBOUND
// =============================================================================

fn named_node(iri: &Iri) -> Result<oxrdf::NamedNode, RdfError> {
    oxrdf::NamedNode::new(iri.as_str())
        .map_err(|e| RdfError::Validation(format!("cannot write IRI {iri}: {e}")))
}

fn blank_node(node: &BlankNode) -> Result<oxrdf::BlankNode, RdfError> {
    oxrdf::BlankNode::new(node.label())
        .map_err(|e| RdfError::Validation(format!("cannot write blank node {node}: {e}")))
}

fn literal_to_ox(lit: &Literal) -> Result<oxrdf::Literal, RdfError> {
    match (lit.datatype(), lit.language()) {
        (Some(datatype), _) => Ok(oxrdf::Literal::new_typed_literal(
            lit.value(),
            named_node(datatype)?,
        )),
        (None, Some(language)) => {
            oxrdf::Literal::new_language_tagged_literal(lit.value(), language).map_err(|e| {
                RdfError::Validation(format!("cannot write language tag '{language}': {e}"))
            })
        }
        (None, None) => Ok(oxrdf::Literal::new_simple_literal(lit.value())),
    }
}

fn term_to_ox(term: &Term) -> Result<oxrdf::Term, RdfError> {
    Ok(match term {
        Term::Iri(iri) => named_node(iri)?.into(),
        Term::BlankNode(node) => blank_node(node)?.into(),
        Term::Literal(lit) => literal_to_ox(lit)?.into(),
    })
}

pub(super) fn triple_to_ox(triple: &Triple) -> Result<oxrdf::Triple, RdfError> {
    let predicate = named_node(&triple.predicate)?;
    let object = term_to_ox(&triple.object)?;
    Ok(match &triple.subject {
        Subject::Iri(iri) => oxrdf::Triple::new(named_node(iri)?, predicate, object),
        Subject::BlankNode(node) => oxrdf::Triple::new(blank_node(node)?, predicate, object),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::XSD_INTEGER;

    #[test]
    fn literals_keep_their_annotation() {
        for lit in [
            Literal::simple("plain"),
            Literal::lang("hallo", "de"),
            Literal::typed("7", Iri::new(XSD_INTEGER)),
        ] {
            let triple = Triple::new(
                Iri::new("http://x.org/s"),
                Iri::new("http://x.org/p"),
                lit,
            );
            let back = triple_from_ox(triple_to_ox(&triple).expect("to ox")).expect("from ox");
            assert_eq!(back, triple);
        }
    }

    #[test]
    fn unwritable_iris_are_rejected() {
        let triple = Triple::new(
            Iri::new("http://x.org/a b"),
            Iri::new("http://x.org/p"),
            Literal::simple("v"),
        );
        assert!(matches!(triple_to_ox(&triple), Err(RdfError::Validation(_))));
    }
}
