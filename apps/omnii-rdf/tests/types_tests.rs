//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use omnii_rdf::api::{HealthResponse, OntologyResponse};
use omnii_rdf_core::{
    BrainAnalysisRequest, ConceptEvolutionRequest, ImportRequest, QueryOutcome, QueryRequest,
    RdfFormat,
};
use serde_json::json;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse::healthy(17, 2);

    let value = serde_json::to_value(&health).unwrap();
    assert_eq!(value["status"], "healthy");
    assert_eq!(value["graph_size"], 17);
    assert_eq!(value["cache_size"], 2);
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// QUERY REQUEST TESTS
// =============================================================================

#[test]
fn test_query_request_defaults() {
    let request: QueryRequest =
        serde_json::from_value(json!({ "query": "SELECT ?s WHERE { ?s ?p ?o }" })).unwrap();

    assert_eq!(request.query_type, "SELECT");
    assert!(!request.reasoning);
    assert_eq!(request.limit, None);
    assert_eq!(request.timeout, None);
    assert!(request.brain_context.is_none());
    assert!(request.query_hash.is_none());
}

#[test]
fn test_query_request_brain_context_defaults() {
    let request: QueryRequest = serde_json::from_value(json!({
        "query": "SELECT ?s WHERE { ?s ?p ?o }",
        "brain_context": { "user_id": "u1", "channel": "sms" }
    }))
    .unwrap();

    let context = request.brain_context.unwrap();
    assert_eq!(context.user_id, "u1");
    assert!(context.temporal_reasoning);
    assert!(context.include_working_memory);
    assert_eq!(context.memory_contexts_used(), 3);
}

#[test]
fn test_query_request_missing_query_rejected() {
    let result: Result<QueryRequest, _> = serde_json::from_value(json!({ "reasoning": true }));
    assert!(result.is_err());
}

// =============================================================================
// QUERY OUTCOME TESTS
// =============================================================================

#[test]
fn test_query_failure_omits_optional_fields() {
    let outcome = QueryOutcome::failure("abc".to_string(), 3, "boom");

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "boom");
    assert_eq!(value["query_hash"], "abc");
    assert!(value.get("brain_memory_integration").is_none());
    assert!(value.get("concept_insights").is_none());
}

// =============================================================================
// IMPORT REQUEST TESTS
// =============================================================================

#[test]
fn test_import_request_defaults() {
    let request: ImportRequest = serde_json::from_value(json!({ "data": "<a> <b> <c> ." })).unwrap();

    assert_eq!(request.format, "turtle");
    assert!(request.validation);
    assert!(!request.clear_graph);
    assert!(request.named_graph.is_none());
}

#[test]
fn test_import_request_constructor_uses_format_name() {
    let request = ImportRequest::new("x", RdfFormat::NTriples);
    assert_eq!(request.format, "nt");
}

// =============================================================================
// EVOLUTION & ANALYSIS REQUEST TESTS
// =============================================================================

#[test]
fn test_evolution_request_defaults() {
    let request: ConceptEvolutionRequest =
        serde_json::from_value(json!({ "concept_id": "c", "concept_name": "C" })).unwrap();

    assert!(request.new_information.is_empty());
    assert!(request.current_properties.is_empty());
    assert_eq!(request.reasoning_depth, "intermediate");
    assert!(request.validation_required);
}

#[test]
fn test_evolution_request_keeps_raw_objects() {
    let request: ConceptEvolutionRequest = serde_json::from_value(json!({
        "concept_id": "c",
        "concept_name": "C",
        "new_information": [
            { "subject": "c", "predicate": "http://example.org/p", "object": 42 }
        ]
    }))
    .unwrap();

    assert_eq!(request.new_information[0].object, json!(42));
    assert!(request.new_information[0].confidence.is_none());
}

#[test]
fn test_analysis_request_all_optional() {
    let request: BrainAnalysisRequest = serde_json::from_value(json!({})).unwrap();
    assert!(request.full_brain_context.working_memory.active_concepts.is_empty());
    assert_eq!(
        request
            .full_brain_context
            .working_memory
            .time_window_stats
            .current_week_count,
        0
    );
}

// =============================================================================
// ONTOLOGY RESPONSE TESTS
// =============================================================================

#[test]
fn test_ontology_error_shape() {
    let response = OntologyResponse::error("Unsupported format: jsonld");

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["triple_count"], 0);
    assert!(value.get("ontology").is_none());
}

#[test]
fn test_ontology_success_shape() {
    let response = OntologyResponse::success("<a> <b> <c> .\n".to_string(), RdfFormat::NTriples, 1);

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["format"], "nt");
    assert!(value.get("error").is_none());
}
