//! # Vocabulary and Runtime Constants
//!
//! Namespaces, well-known IRIs, limits and the baseline ontology.
//!
//! These are compiled into the binary and immutable at runtime.
//! The store starts from the baseline ontology and every reset returns to it.

use crate::types::{Iri, Triple};

// =============================================================================
// NAMESPACES
// =============================================================================

pub const OMNII_NS: &str = "https://omnii.ai/ontology#";
pub const CONV_NS: &str = "https://omnii.ai/conversation#";
pub const CONCEPT_NS: &str = "https://omnii.ai/concept#";
pub const TEMPORAL_NS: &str = "https://omnii.ai/temporal#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Prefixes pre-bound for every parse (queries and imports).
///
/// Order is the order used for `@prefix` lines in serialized output.
pub const STANDARD_PREFIXES: [(&str, &str); 8] = [
    ("omnii", OMNII_NS),
    ("conv", CONV_NS),
    ("concept", CONCEPT_NS),
    ("temporal", TEMPORAL_NS),
    ("rdf", RDF_NS),
    ("rdfs", RDFS_NS),
    ("owl", OWL_NS),
    ("xsd", XSD_NS),
];

// =============================================================================
// WELL-KNOWN IRIS
// =============================================================================

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_PROPERTY: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property";

pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
pub const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
pub const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
pub const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
pub const OWL_EQUIVALENT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#equivalentProperty";
pub const OWL_INVERSE_OF: &str = "http://www.w3.org/2002/07/owl#inverseOf";
pub const OWL_SYMMETRIC_PROPERTY: &str = "http://www.w3.org/2002/07/owl#SymmetricProperty";
pub const OWL_TRANSITIVE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#TransitiveProperty";
pub const OWL_SAME_AS: &str = "http://www.w3.org/2002/07/owl#sameAs";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

pub const OMNII_CONCEPT: &str = "https://omnii.ai/ontology#Concept";
pub const OMNII_BELONGS_TO_USER: &str = "https://omnii.ai/ontology#belongsToUser";
pub const OMNII_HAS_CONFIDENCE: &str = "https://omnii.ai/ontology#hasConfidence";
pub const OMNII_HAS_EVIDENCE: &str = "https://omnii.ai/ontology#hasEvidence";

pub const TEMPORAL_PREVIOUS_WEEK: &str = "https://omnii.ai/temporal#previousWeek";
pub const TEMPORAL_CURRENT_WEEK: &str = "https://omnii.ai/temporal#currentWeek";
pub const TEMPORAL_NEXT_WEEK: &str = "https://omnii.ai/temporal#nextWeek";

// =============================================================================
// LIMITS & DEFAULTS
// =============================================================================

/// Maximum length of query text accepted at the boundary (64 KiB).
pub const MAX_QUERY_LENGTH: usize = 65536;

/// Maximum length of an import document (matches the HTTP body limit).
pub const MAX_IMPORT_LENGTH: usize = 2 * 1024 * 1024;

/// Deepest nesting of `{ ... }` groups a query may use. Parsing and
/// evaluation recurse once per level.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Row limit applied when a request does not name one.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Upper bound on the row limit a request may ask for.
pub const MAX_QUERY_LIMIT: usize = 10_000;

/// Evaluation time budget when a request does not name one.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Upper bound on the evaluation time budget.
pub const MAX_QUERY_TIMEOUT_SECS: u64 = 300;

/// Iteration cap for forward chaining.
///
/// The rule catalogue reaches a fixpoint well before this on realistic
/// ontologies; the cap bounds pathological inputs.
pub const MAX_REASONING_ITERATIONS: usize = 32;

/// Cache lifetime of results computed with reasoning (15 minutes).
pub const REASONING_CACHE_TTL_SECS: u64 = 900;

/// Cache lifetime of results computed without reasoning (30 minutes).
pub const PLAIN_CACHE_TTL_SECS: u64 = 1800;

// =============================================================================
// BASELINE ONTOLOGY
// =============================================================================

const BASELINE_CLASSES: [&str; 6] = [
    "Conversation",
    "Concept",
    "Tag",
    "User",
    "Memory",
    "BrainContext",
];

const BASELINE_OBJECT_PROPERTIES: [&str; 3] = ["mentions", "relatesToConcept", "hasTag"];

const BASELINE_DATATYPE_PROPERTIES: [&str; 4] = [
    "hasConfidence",
    "hasTimestamp",
    "hasActivationStrength",
    "hasMemoryStrength",
];

const BASELINE_TEMPORAL_PROPERTIES: [&str; 4] = [
    "previousWeek",
    "currentWeek",
    "nextWeek",
    "recentModification",
];

/// The fixed ontology every fresh or reset store starts from.
///
/// Declares the domain classes, object properties, datatype properties and
/// temporal properties. Always yields 17 distinct triples.
#[must_use]
pub fn baseline_triples() -> Vec<Triple> {
    let declare = |ns: &str, local: &str, kind: &str| {
        Triple::new(
            Iri::new(format!("{ns}{local}")),
            Iri::new(RDF_TYPE),
            Iri::new(kind),
        )
    };

    let classes = BASELINE_CLASSES
        .iter()
        .map(|local| declare(OMNII_NS, local, OWL_CLASS));
    let objects = BASELINE_OBJECT_PROPERTIES
        .iter()
        .map(|local| declare(OMNII_NS, local, OWL_OBJECT_PROPERTY));
    let datatypes = BASELINE_DATATYPE_PROPERTIES
        .iter()
        .map(|local| declare(OMNII_NS, local, OWL_DATATYPE_PROPERTY));
    let temporal = BASELINE_TEMPORAL_PROPERTIES
        .iter()
        .map(|local| declare(TEMPORAL_NS, local, OWL_DATATYPE_PROPERTY));

    classes.chain(objects).chain(datatypes).chain(temporal).collect()
}
