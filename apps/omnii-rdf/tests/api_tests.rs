//! Integration tests for the Omnii RDF HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use omnii_rdf::api::{API_KEY_ENV, AppState, HealthResponse, OntologyResponse, create_router};
use omnii_rdf_core::{ImportOutcome, KnowledgeBase, QueryOutcome, TermKind};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Mutex to serialize tests since some modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

const BASELINE_TRIPLES: usize = 17;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }
}

fn lock_env() -> TestGuard {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var(API_KEY_ENV) };
    TestGuard { _guard: guard }
}

/// Create a test server over a fresh baseline knowledge base.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env();
    let router = create_router(AppState::new(KnowledgeBase::new()));
    (TestServer::new(router).unwrap(), guard)
}

/// Create a test server that requires `api_key`.
fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = lock_env();
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var(API_KEY_ENV, api_key) };
    let router = create_router(AppState::new(KnowledgeBase::new()));
    (TestServer::new(router).unwrap(), guard)
}

fn turtle_import(data: &str) -> Value {
    json!({ "data": data, "format": "turtle" })
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.graph_size, BASELINE_TRIPLES);
    assert_eq!(health.cache_size, 0);
}

#[tokio::test]
async fn test_health_reports_cached_results() {
    let (server, _guard) = create_test_server();

    server
        .post("/query")
        .json(&json!({ "query": "SELECT ?c WHERE { ?c a owl:Class }" }))
        .await
        .assert_status_ok();

    let health: HealthResponse = server.get("/health").await.json();
    assert_eq!(health.cache_size, 1);
}

// =============================================================================
// QUERY ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_query_baseline_with_limit() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/query")
        .json(&json!({ "query": "SELECT ?s ?p ?o WHERE { ?s ?p ?o }", "limit": 5 }))
        .await;

    response.assert_status_ok();
    let outcome: QueryOutcome = response.json();
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.total_results, 5);
    assert_eq!(outcome.results.len(), 5);
    assert!(!outcome.reasoning_applied);
    assert_eq!(outcome.query_hash.len(), 64);
    assert!(outcome.brain_memory_integration.is_some());
}

#[tokio::test]
async fn test_query_hash_is_stable() {
    let (server, _guard) = create_test_server();
    let body = json!({ "query": "SELECT ?c WHERE { ?c a owl:Class }" });

    let first: QueryOutcome = server.post("/query").json(&body).await.json();
    let second: QueryOutcome = server.post("/query").json(&body).await.json();

    assert_eq!(first.query_hash, second.query_hash);
    assert_eq!(first.results, second.results);
}

#[tokio::test]
async fn test_query_syntax_error_is_reported_in_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/query")
        .json(&json!({ "query": "INVALID SPARQL SYNTAX" }))
        .await;

    response.assert_status_ok();
    let outcome: QueryOutcome = response.json();
    assert!(!outcome.success);
    assert!(outcome.error.is_some());
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn test_query_empty_text_rejected() {
    let (server, _guard) = create_test_server();

    let response = server.post("/query").json(&json!({ "query": "  " })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let outcome: QueryOutcome = response.json();
    assert!(!outcome.success);
}

#[tokio::test]
async fn test_query_non_select_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/query")
        .json(&json!({
            "query": "SELECT ?s WHERE { ?s ?p ?o }",
            "query_type": "CONSTRUCT"
        }))
        .await;

    let outcome: QueryOutcome = response.json();
    assert!(!outcome.success);
}

#[tokio::test]
async fn test_query_with_brain_context() {
    let (server, _guard) = create_test_server();
    let data = "@prefix omnii: <https://omnii.ai/ontology#> .
                @prefix concept: <https://omnii.ai/concept#> .
                concept:a a omnii:Concept ; omnii:belongsToUser \"alice\" .
                concept:b a omnii:Concept ; omnii:belongsToUser \"bob\" .";
    let imported: ImportOutcome = server.post("/import-rdf").json(&turtle_import(data)).await.json();
    assert!(imported.success, "{:?}", imported.error);

    let response = server
        .post("/query")
        .json(&json!({
            "query": "SELECT ?concept WHERE { ?concept a omnii:Concept }",
            "brain_context": { "user_id": "alice", "channel": "chat" }
        }))
        .await;

    let outcome: QueryOutcome = response.json();
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.total_results, 1);
    assert_eq!(outcome.results[0]["concept"].value, "https://omnii.ai/concept#a");

    let integration = outcome.brain_memory_integration.unwrap();
    assert_eq!(integration.concepts_analyzed, 1);
    assert_eq!(integration.memory_contexts_used, 3);
    assert!(integration.temporal_reasoning_applied);

    let insights = outcome.concept_insights.unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].concept_id, "a");
}

#[tokio::test]
async fn test_query_with_reasoning() {
    let (server, _guard) = create_test_server();
    let data = "@prefix ex: <http://example.org/> .
                ex:Dog rdfs:subClassOf ex:Animal .
                ex:rex a ex:Dog .";
    server.post("/import-rdf").json(&turtle_import(data)).await.assert_status_ok();

    let query = "SELECT ?x WHERE { ?x a <http://example.org/Animal> }";
    let plain: QueryOutcome = server.post("/query").json(&json!({ "query": query })).await.json();
    assert_eq!(plain.total_results, 0);

    let reasoned: QueryOutcome = server
        .post("/query")
        .json(&json!({ "query": query, "reasoning": true }))
        .await
        .json();
    assert!(reasoned.reasoning_applied);
    assert_eq!(reasoned.total_results, 1);
    assert_eq!(reasoned.results[0]["x"].value, "http://example.org/rex");
    assert_ne!(plain.query_hash, reasoned.query_hash);
}

// =============================================================================
// IMPORT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_import_then_query() {
    let (server, _guard) = create_test_server();
    let data = "@prefix ex: <http://example.org/> .
                ex:c1 a omnii:Concept ; rdfs:label \"First\" .";

    let response = server.post("/import-rdf").json(&turtle_import(data)).await;
    response.assert_status_ok();
    let outcome: ImportOutcome = response.json();
    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.triples_imported, 2);
    assert_eq!(outcome.total_triples, BASELINE_TRIPLES + 2);
    assert_eq!(outcome.format, "turtle");

    let result: QueryOutcome = server
        .post("/query")
        .json(&json!({ "query": "SELECT ?x ?label WHERE { ?x a omnii:Concept . ?x rdfs:label ?label }" }))
        .await
        .json();
    assert_eq!(result.total_results, 1);
    assert_eq!(result.results[0]["label"].kind, TermKind::Literal);
    assert_eq!(result.results[0]["label"].value, "First");
}

#[tokio::test]
async fn test_import_invalidates_cached_query() {
    let (server, _guard) = create_test_server();
    let query = json!({ "query": "SELECT ?x WHERE { ?x a omnii:Concept }" });

    let before: QueryOutcome = server.post("/query").json(&query).await.json();
    assert_eq!(before.total_results, 0);

    let data = "<http://example.org/c1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://omnii.ai/ontology#Concept> .";
    let imported: ImportOutcome = server
        .post("/import-rdf")
        .json(&json!({ "data": data, "format": "nt" }))
        .await
        .json();
    assert!(imported.success, "{:?}", imported.error);

    let after: QueryOutcome = server.post("/query").json(&query).await.json();
    assert_eq!(after.total_results, 1);
}

#[tokio::test]
async fn test_import_malformed_leaves_store_unchanged() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/import-rdf")
        .json(&turtle_import("@prefix ex: <http://example.org/> .\nex:a ex:b"))
        .await;

    response.assert_status_ok();
    let outcome: ImportOutcome = response.json();
    assert!(!outcome.success);
    assert_eq!(outcome.triples_imported, 0);
    assert_eq!(outcome.total_triples, BASELINE_TRIPLES);

    let health: HealthResponse = server.get("/health").await.json();
    assert_eq!(health.graph_size, BASELINE_TRIPLES);
}

#[tokio::test]
async fn test_import_unknown_format_fails() {
    let (server, _guard) = create_test_server();

    let outcome: ImportOutcome = server
        .post("/import-rdf")
        .json(&json!({ "data": "<a> <b> <c> .", "format": "rdfxml" }))
        .await
        .json();

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("rdfxml"));
}

#[tokio::test]
async fn test_import_empty_data_rejected() {
    let (server, _guard) = create_test_server();

    let response = server.post("/import-rdf").json(&turtle_import("")).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_clear_graph_reseeds() {
    let (server, _guard) = create_test_server();
    server
        .post("/import-rdf")
        .json(&turtle_import("<http://example.org/a> <http://example.org/p> \"1\" ."))
        .await
        .assert_status_ok();

    let outcome: ImportOutcome = server
        .post("/import-rdf")
        .json(&json!({
            "data": "<http://example.org/b> <http://example.org/p> \"2\" .",
            "clear_graph": true
        }))
        .await
        .json();

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.total_triples, BASELINE_TRIPLES + 1);
}

// =============================================================================
// CONCEPT EVOLUTION TESTS
// =============================================================================

#[tokio::test]
async fn test_evolve_concept_with_low_activation() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/evolve-concept")
        .json(&json!({
            "concept_id": "rust",
            "concept_name": "Rust",
            "current_properties": { "activation_strength": 0.5 },
            "new_information": [{
                "subject": "rust",
                "predicate": "http://example.org/relatedTo",
                "object": "systems programming",
                "confidence": 0.9
            }]
        }))
        .await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["evolution_applied"], true);
    assert_eq!(outcome["confidence_score"], 0.85);
    assert_eq!(outcome["validation_status"], "auto_approved");

    let changes = outcome["changes_detected"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["property"], "activation_strength");
    assert_eq!(changes[0]["new_value"], "0.8");
    assert_eq!(changes[0]["evidence_strength"], 0.9);

    let chain = outcome["reasoning_chain"].as_array().unwrap();
    assert_eq!(chain.len(), 2);
    assert!(chain[0].as_str().unwrap().starts_with("Added triple: "));

    let updates = &outcome["brain_memory_updates"];
    assert_eq!(updates["graph_concept_updated"], true);
    assert_eq!(updates["memory_consolidation_triggered"], false);
    assert_eq!(updates["time_window_impacts"]["current_week"], true);
}

#[tokio::test]
async fn test_evolve_concept_is_queryable() {
    let (server, _guard) = create_test_server();
    let query = json!({ "query": "SELECT ?x ?label WHERE { ?x a omnii:Concept . ?x rdfs:label ?label }" });

    let before: QueryOutcome = server.post("/query").json(&query).await.json();
    assert_eq!(before.total_results, 0);

    server
        .post("/evolve-concept")
        .json(&json!({ "concept_id": "memory", "concept_name": "Memory" }))
        .await
        .assert_status_ok();

    let after: QueryOutcome = server.post("/query").json(&query).await.json();
    assert_eq!(after.total_results, 1);
    assert_eq!(after.results[0]["x"].value, "https://omnii.ai/concept#memory");
    assert_eq!(after.results[0]["label"].value, "Memory");
}

#[tokio::test]
async fn test_evolve_concept_invalid_object_writes_nothing() {
    let (server, _guard) = create_test_server();

    let outcome: Value = server
        .post("/evolve-concept")
        .json(&json!({
            "concept_id": "rust",
            "concept_name": "Rust",
            "new_information": [{
                "subject": "rust",
                "predicate": "http://example.org/tags",
                "object": ["a", "b"]
            }]
        }))
        .await
        .json();

    assert_eq!(outcome["success"], false);
    assert!(outcome["error"].is_string());

    let health: HealthResponse = server.get("/health").await.json();
    assert_eq!(health.graph_size, BASELINE_TRIPLES);
}

#[tokio::test]
async fn test_evolve_concept_empty_id_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/evolve-concept")
        .json(&json!({ "concept_id": "", "concept_name": "Nothing" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// BRAIN MEMORY ANALYSIS TESTS
// =============================================================================

#[tokio::test]
async fn test_analyze_brain_memory() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/analyze-brain-memory")
        .json(&json!({
            "full_brain_context": {
                "working_memory": {
                    "active_concepts": ["c1", "c2", "c3", "c4", "c5", "c6"],
                    "time_window_stats": { "current_week_count": 9, "previous_week_count": 4 }
                }
            }
        }))
        .await;

    response.assert_status_ok();
    let analysis: Value = response.json();
    assert_eq!(analysis["success"], true);
    assert_eq!(analysis["concept_insights"].as_array().unwrap().len(), 6);
    assert_eq!(analysis["concept_insights"][0]["insight_type"], "semantic_connection");

    let patterns = analysis["temporal_patterns"].as_array().unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0]["pattern_type"], "increasing_activity");
    assert_eq!(patterns[0]["confidence"], 0.8);

    let recommendations = analysis["consolidation_recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(
        recommendations[0]["concepts_involved"].as_array().unwrap().len(),
        5
    );
}

#[tokio::test]
async fn test_analyze_empty_request() {
    let (server, _guard) = create_test_server();

    let analysis: Value = server
        .post("/analyze-brain-memory")
        .json(&json!({}))
        .await
        .json();

    assert_eq!(analysis["success"], true);
    assert!(analysis["concept_insights"].as_array().unwrap().is_empty());
    assert!(analysis["temporal_patterns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_node_output() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/rdf/analyze")
        .json(&json!({
            "nodeProcessing": { "concepts": ["rust", "axum", "tokio"] },
            "rdfData": {
                "full_brain_context": {
                    "working_memory": {
                        "active_concepts": ["c1", "c2"],
                        "time_window_stats": { "current_week_count": 9, "previous_week_count": 4 }
                    }
                }
            }
        }))
        .await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["confidence"], 0.85);
    assert_eq!(outcome["processed_by"], "omnii_rdf");

    let analysis = &outcome["analysis"];
    let patterns = analysis["ai_insights"]["semantic_patterns"].as_array().unwrap();
    assert_eq!(patterns.len(), 3);
    assert_eq!(patterns[0]["concept_id"], "rust");
    assert_eq!(patterns[0]["pattern_type"], "concept_activation");
    assert_eq!(patterns[0]["confidence"], 0.8);
    assert_eq!(
        analysis["ai_insights"]["confidence_metrics"]["analysis_depth"],
        "comprehensive"
    );

    assert_eq!(
        analysis["brain_memory_analysis"]["concept_insights"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
    assert_eq!(analysis["processing_summary"]["concepts_analyzed"], 3);
    assert_eq!(analysis["processing_summary"]["patterns_found"], 1);
    assert_eq!(analysis["processing_summary"]["consolidation_recommendations"], 0);
}

#[tokio::test]
async fn test_analyze_node_output_inline_memory() {
    let (server, _guard) = create_test_server();

    let outcome: Value = server
        .post("/api/rdf/analyze")
        .json(&json!({
            "full_brain_context": {
                "working_memory": { "active_concepts": ["x", "y", "z", "u", "v", "w"] }
            }
        }))
        .await
        .json();

    assert_eq!(outcome["success"], true);
    let analysis = &outcome["analysis"];
    assert!(analysis["ai_insights"]["semantic_patterns"].as_array().unwrap().is_empty());
    assert_eq!(analysis["processing_summary"]["consolidation_recommendations"], 1);
}

#[tokio::test]
async fn test_analyze_node_output_rejects_blank_concept() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/rdf/analyze")
        .json(&json!({ "nodeProcessing": { "concepts": ["ok", "  "] } }))
        .await;

    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["success"], false);
    assert_eq!(outcome["confidence"], 0.0);
    assert!(outcome.get("analysis").is_none());
    assert!(outcome["error"].as_str().unwrap().contains("non-empty"));
}

// =============================================================================
// ONTOLOGY & METRICS TESTS
// =============================================================================

#[tokio::test]
async fn test_ontology_default_turtle() {
    let (server, _guard) = create_test_server();

    let response = server.get("/ontology").await;

    response.assert_status_ok();
    let ontology: OntologyResponse = response.json();
    assert!(ontology.success);
    assert_eq!(ontology.format.as_deref(), Some("turtle"));
    assert_eq!(ontology.triple_count, BASELINE_TRIPLES);
    assert!(ontology.ontology.unwrap().contains("@prefix"));
}

#[tokio::test]
async fn test_ontology_ntriples() {
    let (server, _guard) = create_test_server();

    let ontology: OntologyResponse = server.get("/ontology?format=nt").await.json();

    assert!(ontology.success);
    assert_eq!(
        ontology.ontology.unwrap().lines().count(),
        BASELINE_TRIPLES
    );
}

#[tokio::test]
async fn test_ontology_unknown_format() {
    let (server, _guard) = create_test_server();

    let response = server.get("/ontology?format=jsonld").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let ontology: OntologyResponse = response.json();
    assert!(!ontology.success);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    let metrics: Value = response.json();
    assert_eq!(metrics["graph_size"], BASELINE_TRIPLES);
    assert_eq!(metrics["ontology_classes"], 6);
    assert_eq!(metrics["cache_stats"]["connected"], true);
    assert_eq!(metrics["namespaces"].as_array().unwrap().len(), 8);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_cors_headers_present() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/health")
        .add_header("Origin", HeaderValue::from_static("http://localhost:3000"))
        .await;

    response.assert_status_ok();
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_some()
    );
}

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/nonexistent").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    let response = server.get("/query").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/query")
        .content_type("application/json")
        .text("{not json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let (server, _guard) = create_auth_test_server("test-secret-key");

    let response = server
        .get("/metrics")
        .add_header(
            "Authorization",
            HeaderValue::from_static("Bearer test-secret-key"),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let (server, _guard) = create_auth_test_server("test-secret-key");

    let response = server
        .get("/metrics")
        .add_header("Authorization", HeaderValue::from_static("test-secret-key"))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_auth_test_server("test-secret-key");

    let response = server
        .post("/query")
        .add_header("Authorization", HeaderValue::from_static("Bearer wrong-key"))
        .json(&json!({ "query": "SELECT ?s WHERE { ?s ?p ?o }" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_auth_test_server("test-secret-key");

    let response = server.get("/ontology").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let (server, _guard) = create_auth_test_server("test-secret-key");

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let (server, _guard) = create_auth_test_server("test-secret-key");

    let response = server
        .get("/metrics")
        .add_header("Authorization", HeaderValue::from_static("Bearer "))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
