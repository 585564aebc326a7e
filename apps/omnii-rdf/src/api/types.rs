//! # API Request/Response Types
//!
//! Request and outcome bodies for the knowledge operations live in
//! `omnii-rdf-core`; this module adds the boundary-only shapes and the
//! checks that reject a request before it reaches the knowledge base.

use omnii_rdf_core::{ConceptEvolutionRequest, ImportRequest, QueryRequest, RdfFormat};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub graph_size: usize,
    pub cache_size: usize,
}

impl HealthResponse {
    #[must_use]
    pub fn healthy(graph_size: usize, cache_size: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            graph_size,
            cache_size,
        }
    }
}

// =============================================================================
// ONTOLOGY
// =============================================================================

/// Query string of `GET /ontology`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OntologyParams {
    #[serde(default)]
    pub format: Option<String>,
}

impl OntologyParams {
    /// The requested format, Turtle when absent.
    pub fn format(&self) -> Result<RdfFormat, String> {
        match &self.format {
            Some(name) => name.parse().map_err(|e| format!("{e}")),
            None => Ok(RdfFormat::Turtle),
        }
    }
}

/// The serialized base graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub triple_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OntologyResponse {
    #[must_use]
    pub fn success(ontology: String, format: RdfFormat, triple_count: usize) -> Self {
        Self {
            success: true,
            ontology: Some(ontology),
            format: Some(format.name().to_string()),
            triple_count,
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            ontology: None,
            format: None,
            triple_count: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// BOUNDARY VALIDATION
// =============================================================================

/// Reject a query whose text is blank.
///
/// Length and query-form checks happen in the knowledge base so the CLI
/// gets them too.
pub fn check_query(request: &QueryRequest) -> Result<(), String> {
    if request.query.trim().is_empty() {
        return Err("query must not be empty".to_string());
    }
    if let Some(context) = &request.brain_context
        && context.user_id.trim().is_empty()
    {
        return Err("brain_context.user_id must not be empty".to_string());
    }
    Ok(())
}

/// Reject an import with no data.
pub fn check_import(request: &ImportRequest) -> Result<(), String> {
    if request.data.trim().is_empty() {
        return Err("data must not be empty".to_string());
    }
    Ok(())
}

/// Reject an evolution without a concept id.
pub fn check_evolution(request: &ConceptEvolutionRequest) -> Result<(), String> {
    if request.concept_id.trim().is_empty() {
        return Err("concept_id must not be empty".to_string());
    }
    Ok(())
}
