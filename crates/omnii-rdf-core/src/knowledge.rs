//! # Knowledge Base
//!
//! The service object that ties the store, reasoner, query engine, context
//! augmenter, result cache and insight strategy together.
//!
//! - Read operations (`query`, `analyze_brain_memory`, `metrics`) take
//!   `&self` and may run concurrently
//! - Mutations (`import`, `evolve_concept`, `clear`) take `&mut self`,
//!   validate fully before the first write, and drop the whole result cache
//! - No operation returns `Err`: failures become `success: false` outcomes

use crate::augment::{BrainContext, augment_query};
use crate::cache::{CacheKey, CacheStats, CacheStore, MemoryCacheStore, QueryCache};
use crate::config::ServiceConfig;
use crate::confidence::Confidence;
use crate::formats::{self, RdfFormat};
use crate::graph::{Graph, TriplePattern, TripleStore};
use crate::insight::{
    ACTIVATION_STRENGTH, BrainAnalysis, ConceptInsight, DetectedChange, FixedWeightInsights,
    InsightStrategy, NodeInsights, WorkingMemory,
};
use crate::query::{Deadline, Query, evaluate_within};
use crate::reasoner::Reasoner;
use crate::types::{Iri, Literal, RdfError, Subject, Term, TermView, Triple};
use crate::vocab::{
    CONCEPT_NS, MAX_IMPORT_LENGTH, MAX_QUERY_LENGTH, OMNII_CONCEPT, OMNII_HAS_CONFIDENCE,
    OMNII_HAS_EVIDENCE, OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_OBJECT_PROPERTY, RDF_TYPE,
    RDFS_LABEL, STANDARD_PREFIXES, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, baseline_triples,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

fn default_true() -> bool {
    true
}

fn default_query_type() -> String {
    "SELECT".to_string()
}

fn default_format() -> String {
    RdfFormat::Turtle.name().to_string()
}

fn default_reasoning_depth() -> String {
    "intermediate".to_string()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// QUERY
// =============================================================================

/// A query as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_query_type")]
    pub query_type: String,
    #[serde(default)]
    pub reasoning: bool,
    /// Seconds; the configured default when absent.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Row cap; the configured default when absent.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Extra prefix bindings on top of the standard ones.
    #[serde(default)]
    pub namespaces: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub brain_context: Option<BrainContext>,
    /// Caller-computed cache key, used verbatim instead of the digest.
    #[serde(default)]
    pub query_hash: Option<String>,
}

impl QueryRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            query_type: default_query_type(),
            reasoning: false,
            timeout: None,
            limit: None,
            namespaces: None,
            brain_context: None,
            query_hash: None,
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: BrainContext) -> Self {
        self.brain_context = Some(context);
        self
    }
}

/// How the context shaped a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainMemoryIntegration {
    pub concepts_analyzed: usize,
    pub memory_contexts_used: usize,
    pub temporal_reasoning_applied: bool,
    pub concept_evolutions_triggered: usize,
    pub updates_queued: usize,
}

/// Result of [`KnowledgeBase::query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub success: bool,
    pub results: Vec<BTreeMap<String, TermView>>,
    pub reasoning_applied: bool,
    pub execution_time_ms: u64,
    pub query_hash: String,
    pub total_results: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brain_memory_integration: Option<BrainMemoryIntegration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_insights: Option<Vec<ConceptInsight>>,
}

impl QueryOutcome {
    #[must_use]
    pub fn failure(query_hash: String, execution_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            reasoning_applied: false,
            execution_time_ms,
            query_hash,
            total_results: 0,
            error: Some(error.into()),
            brain_memory_integration: None,
            concept_insights: None,
        }
    }
}

// =============================================================================
// IMPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub data: String,
    #[serde(default = "default_format")]
    pub format: String,
    /// Report parse failures as validation failures.
    #[serde(default = "default_true")]
    pub validation: bool,
    /// Empty the store and re-seed the baseline before merging.
    #[serde(default)]
    pub clear_graph: bool,
    /// Accepted for compatibility; the store holds a single default graph.
    #[serde(default)]
    pub named_graph: Option<String>,
}

impl ImportRequest {
    #[must_use]
    pub fn new(data: impl Into<String>, format: RdfFormat) -> Self {
        Self {
            data: data.into(),
            format: format.name().to_string(),
            validation: true,
            clear_graph: false,
            named_graph: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub success: bool,
    /// Triples that were not already in the store.
    pub triples_imported: usize,
    pub total_triples: usize,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutcome {
    #[must_use]
    pub fn failure(format: &str, total_triples: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            triples_imported: 0,
            total_triples,
            format: format.to_string(),
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// EVOLUTION
// =============================================================================

/// One fact to attach while evolving a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInformation {
    /// An `http(s)` IRI, or anything else to mean the concept itself.
    pub subject: String,
    pub predicate: String,
    pub object: Value,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEvolutionRequest {
    pub concept_id: String,
    pub concept_name: String,
    #[serde(default)]
    pub current_properties: Map<String, Value>,
    #[serde(default)]
    pub new_information: Vec<NewInformation>,
    #[serde(default)]
    pub evidence_sources: Vec<Value>,
    #[serde(default)]
    pub brain_memory_context: Map<String, Value>,
    #[serde(default = "default_reasoning_depth")]
    pub reasoning_depth: String,
    #[serde(default = "default_true")]
    pub validation_required: bool,
}

impl ConceptEvolutionRequest {
    #[must_use]
    pub fn new(concept_id: impl Into<String>, concept_name: impl Into<String>) -> Self {
        Self {
            concept_id: concept_id.into(),
            concept_name: concept_name.into(),
            current_properties: Map::new(),
            new_information: Vec::new(),
            evidence_sources: Vec::new(),
            brain_memory_context: Map::new(),
            reasoning_depth: default_reasoning_depth(),
            validation_required: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindowImpacts {
    pub previous_week: bool,
    pub current_week: bool,
    pub next_week: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainMemoryUpdates {
    pub graph_concept_updated: bool,
    pub related_concepts_affected: Vec<String>,
    pub memory_consolidation_triggered: bool,
    pub time_window_impacts: TimeWindowImpacts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionOutcome {
    pub success: bool,
    pub concept_id: String,
    pub evolution_applied: bool,
    pub confidence_score: Confidence,
    pub changes_detected: Vec<DetectedChange>,
    pub reasoning_chain: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brain_memory_updates: Option<BrainMemoryUpdates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvolutionOutcome {
    #[must_use]
    pub fn failure(concept_id: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            concept_id: concept_id.to_string(),
            evolution_applied: false,
            confidence_score: Confidence::ZERO,
            changes_detected: Vec::new(),
            reasoning_chain: Vec::new(),
            brain_memory_updates: None,
            validation_status: None,
            error: Some(error.into()),
        }
    }
}

const EVOLUTION_CONFIDENCE: Confidence = Confidence::from_permille(850);

/// More changes than this mark an evolution as consolidation-worthy.
const CONSOLIDATION_CHANGE_THRESHOLD: usize = 2;

/// Characters that cannot appear in an IRI local part.
const FORBIDDEN_ID_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '^', '`', '\\'];

// =============================================================================
// ANALYSIS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullBrainContext {
    pub working_memory: WorkingMemory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainAnalysisRequest {
    pub brain_memory_context: Map<String, Value>,
    pub rdf_analysis_request: Map<String, Value>,
    pub expected_outputs: Map<String, Value>,
    pub full_brain_context: FullBrainContext,
}

/// Concepts an upstream processing node reported as active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeProcessing {
    pub concepts: Vec<String>,
}

/// Combined analysis input: node output plus a working-memory snapshot.
///
/// The snapshot is read from `rdfData` when present, otherwise from the
/// top-level fields of the request itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAnalysisRequest {
    #[serde(rename = "nodeProcessing")]
    pub node_processing: NodeProcessing,
    #[serde(rename = "rdfData", skip_serializing_if = "Option::is_none")]
    pub rdf_data: Option<BrainAnalysisRequest>,
    #[serde(flatten)]
    pub inline: BrainAnalysisRequest,
}

impl NodeAnalysisRequest {
    /// The working-memory snapshot this request carries.
    pub fn brain_request(&self) -> &BrainAnalysisRequest {
        self.rdf_data.as_ref().unwrap_or(&self.inline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub concepts_analyzed: usize,
    pub patterns_found: usize,
    pub consolidation_recommendations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalysis {
    pub brain_memory_analysis: BrainAnalysis,
    pub ai_insights: NodeInsights,
    pub processing_summary: ProcessingSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalysisOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<NodeAnalysis>,
    pub confidence: Confidence,
    pub processed_by: String,
    pub analysis_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeAnalysisOutcome {
    #[must_use]
    pub fn failure(analysis_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            confidence: Confidence::ZERO,
            processed_by: PROCESSED_BY.to_string(),
            analysis_time_ms,
            error: Some(error.into()),
        }
    }
}

/// Service name reported on node analyses.
const PROCESSED_BY: &str = "omnii_rdf";

// =============================================================================
// METRICS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeMetrics {
    pub graph_size: usize,
    pub cache_stats: CacheStats,
    pub namespaces: Vec<String>,
    pub ontology_classes: usize,
    pub ontology_properties: usize,
}

// =============================================================================
// KNOWLEDGE BASE
// =============================================================================

/// The long-lived base graph plus everything that reads or writes it.
#[derive(Debug)]
pub struct KnowledgeBase {
    graph: Graph,
    cache: QueryCache,
    reasoner: Reasoner,
    insights: Box<dyn InsightStrategy>,
    config: ServiceConfig,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    /// A knowledge base with default tunables, seeded with the baseline.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ServiceConfig) -> Self {
        let graph: Graph = baseline_triples().into_iter().collect();
        info!(triples = graph.len(), "Knowledge base seeded with baseline ontology");
        Self {
            graph,
            cache: QueryCache::new(
                Box::new(MemoryCacheStore::new()),
                config.reasoning_ttl(),
                config.plain_ttl(),
            ),
            reasoner: Reasoner::rdfs_owl(config.reasoning.max_iterations),
            insights: Box::new(FixedWeightInsights),
            config,
        }
    }

    /// Swap the cache backend. Existing entries are discarded.
    #[must_use]
    pub fn with_cache_store(mut self, store: Box<dyn CacheStore>) -> Self {
        self.cache = QueryCache::new(
            store,
            self.config.reasoning_ttl(),
            self.config.plain_ttl(),
        );
        self
    }

    #[must_use]
    pub fn with_insights(mut self, insights: Box<dyn InsightStrategy>) -> Self {
        self.insights = insights;
        self
    }

    #[must_use]
    pub fn with_reasoner(mut self, reasoner: Reasoner) -> Self {
        self.reasoner = reasoner;
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Evict expired cache entries; returns how many were dropped.
    pub fn purge_expired_cache(&self) -> usize {
        self.cache.purge_expired()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Run a query: augment, look up the cache, optionally reason, evaluate.
    pub fn query(&self, request: &QueryRequest) -> QueryOutcome {
        let started = Instant::now();

        let key = match &request.query_hash {
            Some(hash) => Some(CacheKey::from_raw(hash.clone())),
            None => CacheKey::for_query(
                &request.query,
                request.reasoning,
                request.brain_context.as_ref(),
            )
            .map_err(|e| warn!(error = %e, "Cache key unavailable, bypassing cache"))
            .ok(),
        };
        let query_hash = key.as_ref().map(ToString::to_string).unwrap_or_default();

        if let Some(key) = &key
            && let Some(mut hit) = self.cache.get::<QueryOutcome>(key)
        {
            // the key ignores the limit, so a hit may hold more rows than asked for
            let limits = &self.config.query;
            hit.results
                .truncate(limits.clamp_limit(request.limit.unwrap_or(limits.default_limit)));
            hit.total_results = hit.results.len();
            return hit;
        }

        match self.run_query(request) {
            Ok(mut outcome) => {
                outcome.query_hash = query_hash;
                outcome.execution_time_ms = elapsed_ms(started);
                if let Some(key) = &key {
                    self.cache.put(key, &outcome, request.reasoning);
                }
                info!(
                    results = outcome.total_results,
                    reasoning = request.reasoning,
                    elapsed_ms = outcome.execution_time_ms,
                    "Query executed"
                );
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Query failed");
                QueryOutcome::failure(query_hash, elapsed_ms(started), e.to_string())
            }
        }
    }

    fn run_query(&self, request: &QueryRequest) -> Result<QueryOutcome, RdfError> {
        if !request.query_type.eq_ignore_ascii_case("SELECT") {
            return Err(RdfError::Validation(format!(
                "unsupported query_type '{}', only SELECT is supported",
                request.query_type
            )));
        }
        if request.query.len() > MAX_QUERY_LENGTH {
            return Err(RdfError::Validation(format!(
                "query exceeds {MAX_QUERY_LENGTH} bytes"
            )));
        }

        let limits = &self.config.query;
        let limit = limits.clamp_limit(request.limit.unwrap_or(limits.default_limit));
        let deadline = Deadline::start(
            limits.clamp_timeout(request.timeout.unwrap_or(limits.default_timeout_secs)),
        );

        let context = request.brain_context.as_ref();
        let text = augment_query(&request.query, context)?;
        let no_prefixes = BTreeMap::new();
        let query = Query::parse_with_prefixes(
            &text,
            request.namespaces.as_ref().unwrap_or(&no_prefixes),
        )?;

        let working: Cow<'_, Graph> = if request.reasoning {
            let (expanded, report) = self.reasoner.expand_within(&self.graph, &deadline)?;
            info!(
                base = self.graph.len(),
                expanded = expanded.len(),
                iterations = report.iterations,
                fixpoint = report.reached_fixpoint,
                "Reasoning applied"
            );
            Cow::Owned(expanded)
        } else {
            Cow::Borrowed(&self.graph)
        };

        // the request limit trims the returned rows only; insights see every row
        let mut solutions = evaluate_within(working.as_ref(), &query, None, &deadline)?;
        debug!(rows = solutions.rows.len(), limit, "Query evaluated");

        let insights: Vec<ConceptInsight> = match context {
            Some(ctx) => solutions
                .rows
                .iter()
                .flat_map(|row| self.insights.row_insights(row, ctx))
                .collect(),
            None => Vec::new(),
        };
        solutions.rows.truncate(limit);

        let results: Vec<BTreeMap<String, TermView>> = solutions
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(name, term)| (name.clone(), TermView::from(term)))
                    .collect()
            })
            .collect();

        Ok(QueryOutcome {
            success: true,
            total_results: results.len(),
            results,
            reasoning_applied: request.reasoning,
            execution_time_ms: 0,
            query_hash: String::new(),
            error: None,
            brain_memory_integration: Some(BrainMemoryIntegration {
                concepts_analyzed: insights.len(),
                memory_contexts_used: context.map_or(0, BrainContext::memory_contexts_used),
                temporal_reasoning_applied: context.is_some_and(|c| c.temporal_reasoning),
                concept_evolutions_triggered: 0,
                updates_queued: 0,
            }),
            concept_insights: Some(insights),
        })
    }

    /// Analyze a working-memory snapshot with the insight strategy.
    pub fn analyze_brain_memory(&self, request: &BrainAnalysisRequest) -> BrainAnalysis {
        let memory = &request.full_brain_context.working_memory;
        if memory.active_concepts.iter().any(|c| c.trim().is_empty()) {
            return BrainAnalysis::failure("active concept identifiers must be non-empty");
        }
        let analysis = self.insights.analyze(memory);
        debug!(
            insights = analysis.concept_insights.len(),
            patterns = analysis.temporal_patterns.len(),
            "Brain memory analyzed"
        );
        analysis
    }

    /// Analyze node-processing output together with its working memory.
    pub fn analyze_nodes(&self, request: &NodeAnalysisRequest) -> NodeAnalysisOutcome {
        let start = Instant::now();
        let concepts = &request.node_processing.concepts;
        if concepts.iter().any(|c| c.trim().is_empty()) {
            return NodeAnalysisOutcome::failure(
                elapsed_ms(start),
                "node concept identifiers must be non-empty",
            );
        }

        let brain = self.analyze_brain_memory(request.brain_request());
        if !brain.success {
            let error = brain.error.unwrap_or_default();
            return NodeAnalysisOutcome::failure(elapsed_ms(start), error);
        }

        let ai_insights = self.insights.node_insights(concepts);
        let confidence = ai_insights.confidence_metrics.overall_confidence;
        let processing_summary = ProcessingSummary {
            concepts_analyzed: ai_insights.semantic_patterns.len(),
            patterns_found: brain.temporal_patterns.len(),
            consolidation_recommendations: brain.consolidation_recommendations.len(),
        };
        debug!(
            concepts = processing_summary.concepts_analyzed,
            patterns = processing_summary.patterns_found,
            "Node output analyzed"
        );

        NodeAnalysisOutcome {
            success: true,
            analysis: Some(NodeAnalysis {
                brain_memory_analysis: brain,
                ai_insights,
                processing_summary,
            }),
            confidence,
            processed_by: PROCESSED_BY.to_string(),
            analysis_time_ms: elapsed_ms(start),
            error: None,
        }
    }

    /// Serialize the whole base graph.
    pub fn serialize_ontology(&self, format: RdfFormat) -> Result<String, RdfError> {
        formats::serialize(&self.graph, format)
    }

    pub fn metrics(&self) -> KnowledgeMetrics {
        let rdf_type = Iri::new(RDF_TYPE);
        let typed = |kind: &str| {
            self.graph
                .matches(
                    TriplePattern::any()
                        .with_predicate(rdf_type.clone())
                        .with_object(Term::iri(kind)),
                )
                .count()
        };
        KnowledgeMetrics {
            graph_size: self.graph.len(),
            cache_stats: self.cache.stats(),
            namespaces: STANDARD_PREFIXES
                .iter()
                .map(|(prefix, _)| (*prefix).to_string())
                .collect(),
            ontology_classes: typed(OWL_CLASS),
            ontology_properties: typed(OWL_OBJECT_PROPERTY)
                .saturating_add(typed(OWL_DATATYPE_PROPERTY)),
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Empty the store, re-seed the baseline and drop the cache.
    pub fn clear(&mut self) {
        self.reseed();
        self.cache.invalidate_all();
        info!(triples = self.graph.len(), "Knowledge base cleared");
    }

    fn reseed(&mut self) {
        self.graph.clear();
        self.graph.extend(baseline_triples());
    }

    /// Parse, then (optionally clear and) merge. A parse failure leaves the
    /// store untouched.
    pub fn import(&mut self, request: &ImportRequest) -> ImportOutcome {
        match self.run_import(request) {
            Ok((added, format)) => {
                info!(
                    added,
                    total = self.graph.len(),
                    format = format.name(),
                    "RDF import completed"
                );
                ImportOutcome {
                    success: true,
                    triples_imported: added,
                    total_triples: self.graph.len(),
                    format: format.name().to_string(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "RDF import rejected");
                ImportOutcome::failure(&request.format, self.graph.len(), e.to_string())
            }
        }
    }

    fn run_import(&mut self, request: &ImportRequest) -> Result<(usize, RdfFormat), RdfError> {
        let format: RdfFormat = request.format.parse()?;
        if request.data.len() > MAX_IMPORT_LENGTH {
            return Err(RdfError::Validation(format!(
                "import exceeds {MAX_IMPORT_LENGTH} bytes"
            )));
        }
        if let Some(name) = &request.named_graph {
            warn!(named_graph = %name, "Named graphs unsupported, importing into default graph");
        }

        let parsed = formats::parse(&request.data, format).map_err(|e| {
            if request.validation {
                RdfError::Validation(e.to_string())
            } else {
                e
            }
        })?;

        if request.clear_graph {
            self.reseed();
        }
        let added = self.graph.merge_scoped(parsed);
        self.cache.invalidate_all();
        Ok((added, format))
    }

    /// Attach new facts to a concept and report proposed property changes.
    pub fn evolve_concept(&mut self, request: &ConceptEvolutionRequest) -> EvolutionOutcome {
        let facts = match plan_evolution(request) {
            Ok(facts) => facts,
            Err(e) => {
                warn!(concept = %request.concept_id, error = %e, "Concept evolution rejected");
                return EvolutionOutcome::failure(&request.concept_id, e.to_string());
            }
        };

        let concept = Iri::new(format!("{CONCEPT_NS}{}", request.concept_id));
        self.graph.insert(Triple::new(
            concept.clone(),
            Iri::new(RDF_TYPE),
            Iri::new(OMNII_CONCEPT),
        ));
        self.graph.insert(Triple::new(
            concept.clone(),
            Iri::new(RDFS_LABEL),
            Literal::simple(request.concept_name.as_str()),
        ));

        let mut reasoning_chain = Vec::with_capacity(facts.len().saturating_add(1));
        for fact in facts {
            let subject = fact
                .subject
                .map_or_else(|| Subject::Iri(concept.clone()), Subject::Iri);
            let triple = Triple::new(subject.clone(), fact.predicate, fact.object);
            reasoning_chain.push(format!("Added triple: {triple}"));
            self.graph.insert(triple);

            if let Some(confidence) = fact.confidence {
                let evidence = self.graph.fresh_blank_node();
                self.graph.insert(Triple::new(
                    evidence.clone(),
                    Iri::new(OMNII_HAS_CONFIDENCE),
                    confidence,
                ));
                self.graph
                    .insert(Triple::new(subject, Iri::new(OMNII_HAS_EVIDENCE), evidence));
            }
        }
        self.cache.invalidate_all();

        let changes_detected = self.insights.evolution_changes(&request.current_properties);
        if !changes_detected.is_empty() {
            reasoning_chain
                .push("Increased activation strength based on brain memory evidence".to_string());
        }
        info!(
            concept = %request.concept_id,
            changes = changes_detected.len(),
            "Concept evolved"
        );

        EvolutionOutcome {
            success: true,
            concept_id: request.concept_id.clone(),
            evolution_applied: !changes_detected.is_empty(),
            confidence_score: EVOLUTION_CONFIDENCE,
            brain_memory_updates: Some(BrainMemoryUpdates {
                graph_concept_updated: true,
                related_concepts_affected: Vec::new(),
                memory_consolidation_triggered: changes_detected.len()
                    > CONSOLIDATION_CHANGE_THRESHOLD,
                time_window_impacts: TimeWindowImpacts {
                    previous_week: false,
                    current_week: true,
                    next_week: false,
                },
            }),
            changes_detected,
            reasoning_chain,
            validation_status: Some(
                if request.validation_required {
                    "auto_approved"
                } else {
                    "not_required"
                }
                .to_string(),
            ),
            error: None,
        }
    }
}

// =============================================================================
// EVOLUTION PLANNING
// =============================================================================

/// A validated fact ready to write. `subject: None` means the concept.
struct PlannedFact {
    subject: Option<Iri>,
    predicate: Iri,
    object: Term,
    confidence: Option<Literal>,
}

/// Validate the whole request before anything is written.
fn plan_evolution(request: &ConceptEvolutionRequest) -> Result<Vec<PlannedFact>, RdfError> {
    let id = &request.concept_id;
    if id.is_empty()
        || id
            .chars()
            .any(|c| c.is_whitespace() || FORBIDDEN_ID_CHARS.contains(&c))
        || !Iri::new(format!("{CONCEPT_NS}{id}")).is_valid()
    {
        return Err(RdfError::Validation(format!(
            "concept_id '{id}' is not a valid IRI local name"
        )));
    }
    if let Some(current) = request.current_properties.get(ACTIVATION_STRENGTH)
        && !current.is_number()
    {
        return Err(RdfError::Validation(format!(
            "{ACTIVATION_STRENGTH} must be a number"
        )));
    }

    request
        .new_information
        .iter()
        .enumerate()
        .map(|(idx, info)| {
            let predicate = Iri::new(info.predicate.as_str());
            if !predicate.is_valid() {
                return Err(RdfError::Validation(format!(
                    "new_information[{idx}]: predicate '{}' is not a valid absolute IRI",
                    info.predicate
                )));
            }
            let object = json_object_term(&info.object).ok_or_else(|| {
                RdfError::Validation(format!(
                    "new_information[{idx}]: object must be a string, number or boolean"
                ))
            })?;
            let confidence = match info.confidence {
                Some(c) if !c.is_finite() => {
                    return Err(RdfError::Validation(format!(
                        "new_information[{idx}]: confidence must be finite"
                    )));
                }
                Some(c) => Some(Literal::typed(c.to_string(), Iri::new(XSD_DOUBLE))),
                None => None,
            };
            let subject = info
                .subject
                .starts_with("http")
                .then(|| Iri::new(info.subject.as_str()));
            if let Some(iri) = subject.as_ref().filter(|iri| !iri.is_valid()) {
                return Err(RdfError::Validation(format!(
                    "new_information[{idx}]: subject '{}' is not a valid absolute IRI",
                    iri.as_str()
                )));
            }
            Ok(PlannedFact {
                subject,
                predicate,
                object,
                confidence,
            })
        })
        .collect()
}

fn json_object_term(value: &Value) -> Option<Term> {
    match value {
        Value::String(s) => Some(Term::Literal(Literal::simple(s.as_str()))),
        Value::Bool(b) => Some(Term::Literal(Literal::typed(
            b.to_string(),
            Iri::new(XSD_BOOLEAN),
        ))),
        Value::Number(n) => {
            let datatype = if n.is_f64() { XSD_DOUBLE } else { XSD_INTEGER };
            Some(Term::Literal(Literal::typed(n.to_string(), Iri::new(datatype))))
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
