//! # API Endpoint Handlers
//!
//! Domain failures are answered with HTTP 200 and `success: false`; only a
//! request rejected at the boundary gets a 4xx, and only a crashed worker
//! gets a 500.
//!
//! Query evaluation and imports are CPU-bound, so they run on the blocking
//! pool holding an owned lock guard.

use super::{
    AppState,
    types::{
        HealthResponse, OntologyParams, OntologyResponse, check_evolution, check_import,
        check_query,
    },
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use omnii_rdf_core::{
    BrainAnalysis, BrainAnalysisRequest, ConceptEvolutionRequest, EvolutionOutcome,
    ImportOutcome, ImportRequest, NodeAnalysisOutcome, NodeAnalysisRequest, QueryOutcome,
    QueryRequest,
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Liveness plus store and cache sizes.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let knowledge = state.knowledge.read().await;
    Json(HealthResponse::healthy(
        knowledge.len(),
        knowledge.cache_stats().key_count,
    ))
}

// =============================================================================
// QUERY HANDLER
// =============================================================================

pub async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    if let Err(msg) = check_query(&request) {
        return (
            StatusCode::BAD_REQUEST,
            Json(QueryOutcome::failure(String::new(), 0, msg)),
        );
    }

    let guard = state.knowledge.clone().read_owned().await;
    match tokio::task::spawn_blocking(move || guard.query(&request)).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)),
        Err(e) => {
            tracing::error!(error = %e, "Query worker failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(QueryOutcome::failure(
                    String::new(),
                    0,
                    "query worker failed",
                )),
            )
        }
    }
}

// =============================================================================
// IMPORT HANDLER
// =============================================================================

pub async fn import_handler(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> impl IntoResponse {
    if let Err(msg) = check_import(&request) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ImportOutcome::failure(&request.format, 0, msg)),
        );
    }

    let format = request.format.clone();
    let mut guard = state.knowledge.clone().write_owned().await;
    match tokio::task::spawn_blocking(move || guard.import(&request)).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)),
        Err(e) => {
            tracing::error!(error = %e, "Import worker failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ImportOutcome::failure(&format, 0, "import worker failed")),
            )
        }
    }
}

// =============================================================================
// EVOLUTION HANDLER
// =============================================================================

pub async fn evolve_handler(
    State(state): State<AppState>,
    Json(request): Json<ConceptEvolutionRequest>,
) -> impl IntoResponse {
    if let Err(msg) = check_evolution(&request) {
        return (
            StatusCode::BAD_REQUEST,
            Json(EvolutionOutcome::failure(&request.concept_id, msg)),
        );
    }

    let mut knowledge = state.knowledge.write().await;
    (StatusCode::OK, Json(knowledge.evolve_concept(&request)))
}

// =============================================================================
// ANALYSIS HANDLER
// =============================================================================

pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<BrainAnalysisRequest>,
) -> Json<BrainAnalysis> {
    let knowledge = state.knowledge.read().await;
    Json(knowledge.analyze_brain_memory(&request))
}

/// Node-processing output analyzed alongside its working memory.
pub async fn analyze_nodes_handler(
    State(state): State<AppState>,
    Json(request): Json<NodeAnalysisRequest>,
) -> Json<NodeAnalysisOutcome> {
    let knowledge = state.knowledge.read().await;
    let outcome = knowledge.analyze_nodes(&request);
    if let Some(error) = &outcome.error {
        tracing::warn!(error = %error, "Node analysis rejected");
    }
    Json(outcome)
}

// =============================================================================
// ONTOLOGY & METRICS
// =============================================================================

/// Serialize the base graph, Turtle unless `?format=` says otherwise.
pub async fn ontology_handler(
    State(state): State<AppState>,
    Query(params): Query<OntologyParams>,
) -> impl IntoResponse {
    let format = match params.format() {
        Ok(format) => format,
        Err(msg) => return (StatusCode::BAD_REQUEST, Json(OntologyResponse::error(msg))),
    };

    let knowledge = state.knowledge.read().await;
    match knowledge.serialize_ontology(format) {
        Ok(text) => (
            StatusCode::OK,
            Json(OntologyResponse::success(text, format, knowledge.len())),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Ontology serialization failed");
            (StatusCode::OK, Json(OntologyResponse::error(e.to_string())))
        }
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let knowledge = state.knowledge.read().await;
    Json(knowledge.metrics())
}
