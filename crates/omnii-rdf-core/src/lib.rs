//! # omnii-rdf-core
//!
//! The in-memory knowledge engine for the Omnii RDF service - THE LOGIC.
//!
//! This crate stores subject-predicate-object triples, answers conjunctive
//! pattern queries over them, derives new triples by forward-chaining
//! RDFS / OWL-RL rules, and caches query results by content digest.
//!
//! ## Layers
//!
//! - `types`, `vocab`: terms, triples, errors, well-known IRIs and limits
//! - `graph`: the indexed triple store
//! - `formats`: Turtle and N-Triples text round-trip
//! - `reasoner`: fixpoint rule engine
//! - `query`: pattern parser and evaluator
//! - `augment`, `cache`, `insight`, `knowledge`: the service layer
//!
//! ## Architectural Constraints
//!
//! - Synchronous: NO async, NO network dependencies
//! - Deterministic: BTree indexes, stable iteration, integer confidences
//! - Volatile: the store lives for the process; text import/export only

// =============================================================================
// MODULES
// =============================================================================

pub mod augment;
pub mod cache;
pub mod confidence;
pub mod config;
pub mod formats;
pub mod graph;
pub mod insight;
pub mod knowledge;
pub mod query;
pub mod reasoner;
pub(crate) mod syntax;
pub mod types;
pub mod vocab;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    BlankNode, Iri, Literal, LiteralAnnotation, RdfError, Subject, Term, TermKind, TermView,
    Triple,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use graph::{Graph, TriplePattern, TripleStore};
pub use query::{
    Binding, Deadline, Query, QueryOptions, Solutions, evaluate, evaluate_within,
};
pub use reasoner::{Reasoner, ReasoningReport, Rule};

// =============================================================================
// RE-EXPORTS: Service Layer
// =============================================================================

pub use augment::{BrainContext, augment_query};
pub use cache::{CacheError, CacheKey, CacheStats, CacheStore, MemoryCacheStore, QueryCache};
pub use confidence::Confidence;
pub use config::ServiceConfig;
pub use formats::RdfFormat;
pub use insight::{
    BrainAnalysis, FixedWeightInsights, InsightStrategy, NodeInsights, WorkingMemory,
};
pub use knowledge::{
    BrainAnalysisRequest, ConceptEvolutionRequest, EvolutionOutcome, ImportOutcome,
    ImportRequest, KnowledgeBase, KnowledgeMetrics, NodeAnalysisOutcome, NodeAnalysisRequest,
    QueryOutcome, QueryRequest,
};
