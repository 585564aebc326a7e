//! # Insight Strategies
//!
//! Heuristic scoring kept behind one narrow trait so the store, query
//! engine and reasoner never depend on it.
//!
//! [`FixedWeightInsights`] is the shipped strategy: constant confidences and
//! simple threshold comparisons, no internal state. Replacing it with a
//! learned model means implementing [`InsightStrategy`] and handing it to
//! `KnowledgeBase::with_insights`.

use crate::augment::BrainContext;
use crate::confidence::Confidence;
use crate::query::Binding;
use crate::types::TermView;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    SemanticConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    IncreasingActivity,
    ConceptActivation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    MemoryConsolidation,
}

/// One scored observation about a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptInsight {
    pub concept_id: String,
    pub insight_type: InsightKind,
    pub confidence: Confidence,
    pub description: String,
}

/// Activity counts per time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindowStats {
    pub current_week_count: u64,
    pub previous_week_count: u64,
}

/// Snapshot of what the caller currently has "in mind".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingMemory {
    pub active_concepts: Vec<String>,
    pub time_window_stats: TimeWindowStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalPattern {
    pub pattern_type: PatternKind,
    pub confidence: Confidence,
    pub description: String,
    pub temporal_distribution: TimeWindowStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationRecommendation {
    pub recommendation_type: RecommendationKind,
    pub confidence: Confidence,
    pub description: String,
    pub concepts_involved: Vec<String>,
}

/// Result of a working-memory analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainAnalysis {
    pub success: bool,
    pub concept_insights: Vec<ConceptInsight>,
    pub temporal_patterns: Vec<TemporalPattern>,
    pub semantic_connections: Vec<ConceptInsight>,
    pub consolidation_recommendations: Vec<ConsolidationRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BrainAnalysis {
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// A concept reported active by an upstream processing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticPattern {
    pub concept_id: String,
    pub pattern_type: PatternKind,
    pub confidence: Confidence,
    pub ai_analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub overall_confidence: Confidence,
    pub analysis_depth: String,
    pub data_quality: String,
    pub reasoning_strength: Confidence,
}

/// Strategy output for a node-processing analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInsights {
    pub semantic_patterns: Vec<SemanticPattern>,
    pub concept_relationships: Vec<ConceptInsight>,
    pub temporal_insights: Vec<TemporalPattern>,
    pub confidence_metrics: ConfidenceMetrics,
}

/// A property change proposed during concept evolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedChange {
    pub property: String,
    pub old_value: String,
    pub new_value: String,
    pub evidence_strength: Confidence,
    pub temporal_context: String,
}

// =============================================================================
// STRATEGY
// =============================================================================

/// Heuristic scoring seam.
///
/// Implementations must be deterministic pure functions of their inputs.
pub trait InsightStrategy: Send + Sync + fmt::Debug {
    /// Insights derived from one result row of a context-scoped query.
    fn row_insights(&self, row: &Binding, context: &BrainContext) -> Vec<ConceptInsight>;

    /// Patterns and recommendations over a working-memory snapshot.
    fn analyze(&self, working_memory: &WorkingMemory) -> BrainAnalysis;

    /// Changes implied by a concept's current properties.
    fn evolution_changes(&self, current_properties: &Map<String, Value>) -> Vec<DetectedChange>;

    /// Patterns for the concepts an upstream node reported as active.
    fn node_insights(&self, concepts: &[String]) -> NodeInsights;
}

/// Row variable that names the concept a result is about.
pub const CONCEPT_VARIABLE: &str = "concept";

/// Property checked by [`FixedWeightInsights::evolution_changes`].
pub const ACTIVATION_STRENGTH: &str = "activation_strength";

const SEMANTIC_CONNECTION: Confidence = Confidence::from_permille(750);
const INCREASING_ACTIVITY: Confidence = Confidence::from_permille(800);
const MEMORY_CONSOLIDATION: Confidence = Confidence::from_permille(850);
const ACTIVATION_EVIDENCE: Confidence = Confidence::from_permille(900);
const CONCEPT_ACTIVATION: Confidence = Confidence::from_permille(800);
const OVERALL_CONFIDENCE: Confidence = Confidence::from_permille(850);
const REASONING_STRENGTH: Confidence = Confidence::from_permille(900);
const ACTIVATION_TARGET: &str = "0.8";
const ACTIVATION_THRESHOLD: f64 = 0.8;
const CONSOLIDATION_MIN_INSIGHTS: usize = 5;

/// Constant-weight rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWeightInsights;

impl InsightStrategy for FixedWeightInsights {
    fn row_insights(&self, row: &Binding, context: &BrainContext) -> Vec<ConceptInsight> {
        let Some(term) = row.get(CONCEPT_VARIABLE) else {
            return Vec::new();
        };
        let value = TermView::from(term).value;
        let concept_id = match value.rsplit_once('#') {
            Some((_, fragment)) => fragment.to_string(),
            None => value,
        };
        vec![ConceptInsight {
            concept_id,
            insight_type: InsightKind::SemanticConnection,
            confidence: SEMANTIC_CONNECTION,
            description: format!(
                "Concept identified in {} context with temporal reasoning",
                context.channel
            ),
        }]
    }

    fn analyze(&self, working_memory: &WorkingMemory) -> BrainAnalysis {
        let concept_insights: Vec<ConceptInsight> = working_memory
            .active_concepts
            .iter()
            .map(|concept| ConceptInsight {
                concept_id: concept.clone(),
                insight_type: InsightKind::SemanticConnection,
                confidence: SEMANTIC_CONNECTION,
                description: "Active concept in working memory with semantic connections"
                    .to_string(),
            })
            .collect();

        let stats = working_memory.time_window_stats;
        let mut temporal_patterns = Vec::new();
        if stats.current_week_count > stats.previous_week_count {
            temporal_patterns.push(TemporalPattern {
                pattern_type: PatternKind::IncreasingActivity,
                confidence: INCREASING_ACTIVITY,
                description: "Increasing concept activity in current week".to_string(),
                temporal_distribution: stats,
            });
        }

        let mut consolidation_recommendations = Vec::new();
        if concept_insights.len() > CONSOLIDATION_MIN_INSIGHTS {
            consolidation_recommendations.push(ConsolidationRecommendation {
                recommendation_type: RecommendationKind::MemoryConsolidation,
                confidence: MEMORY_CONSOLIDATION,
                description: "High concept activity suggests memory consolidation opportunity"
                    .to_string(),
                concepts_involved: working_memory
                    .active_concepts
                    .iter()
                    .take(CONSOLIDATION_MIN_INSIGHTS)
                    .cloned()
                    .collect(),
            });
        }

        BrainAnalysis {
            success: true,
            concept_insights,
            temporal_patterns,
            semantic_connections: Vec::new(),
            consolidation_recommendations,
            error: None,
        }
    }

    fn evolution_changes(&self, current_properties: &Map<String, Value>) -> Vec<DetectedChange> {
        let current = current_properties.get(ACTIVATION_STRENGTH);
        let strength = current.and_then(Value::as_f64).unwrap_or_default();
        if strength >= ACTIVATION_THRESHOLD {
            return Vec::new();
        }
        let old_value = match current {
            Some(Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        };
        vec![DetectedChange {
            property: ACTIVATION_STRENGTH.to_string(),
            old_value,
            new_value: ACTIVATION_TARGET.to_string(),
            evidence_strength: ACTIVATION_EVIDENCE,
            temporal_context: "current_week".to_string(),
        }]
    }

    fn node_insights(&self, concepts: &[String]) -> NodeInsights {
        NodeInsights {
            semantic_patterns: concepts
                .iter()
                .map(|concept| SemanticPattern {
                    concept_id: concept.clone(),
                    pattern_type: PatternKind::ConceptActivation,
                    confidence: CONCEPT_ACTIVATION,
                    ai_analysis: "Concept shows strong semantic connections".to_string(),
                })
                .collect(),
            concept_relationships: Vec::new(),
            temporal_insights: Vec::new(),
            confidence_metrics: ConfidenceMetrics {
                overall_confidence: OVERALL_CONFIDENCE,
                analysis_depth: "comprehensive".to_string(),
                data_quality: "high".to_string(),
                reasoning_strength: REASONING_STRENGTH,
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Term;
    use serde_json::json;

    fn memory(concepts: usize, current: u64, previous: u64) -> WorkingMemory {
        WorkingMemory {
            active_concepts: (0..concepts).map(|i| format!("c{i}")).collect(),
            time_window_stats: TimeWindowStats {
                current_week_count: current,
                previous_week_count: previous,
            },
        }
    }

    #[test]
    fn concept_row_yields_fragment_id() {
        let row = Binding::from([(
            "concept".to_string(),
            Term::iri("https://omnii.ai/concepts#rust"),
        )]);
        let ctx = BrainContext::new("u1", "slack");
        let insights = FixedWeightInsights.row_insights(&row, &ctx);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].concept_id, "rust");
        assert_eq!(insights[0].confidence, Confidence::from_permille(750));
        assert!(insights[0].description.contains("slack"));
    }

    #[test]
    fn rows_without_concept_yield_nothing() {
        let row = Binding::from([("s".to_string(), Term::iri("http://x.org/a"))]);
        let ctx = BrainContext::new("u1", "chat");
        assert!(FixedWeightInsights.row_insights(&row, &ctx).is_empty());
    }

    #[test]
    fn increasing_activity_needs_strict_growth() {
        assert_eq!(FixedWeightInsights.analyze(&memory(1, 5, 3)).temporal_patterns.len(), 1);
        assert!(FixedWeightInsights.analyze(&memory(1, 3, 3)).temporal_patterns.is_empty());
    }

    #[test]
    fn consolidation_needs_more_than_five() {
        let five = FixedWeightInsights.analyze(&memory(5, 0, 0));
        assert_eq!(five.concept_insights.len(), 5);
        assert!(five.consolidation_recommendations.is_empty());

        let seven = FixedWeightInsights.analyze(&memory(7, 0, 0));
        let rec = &seven.consolidation_recommendations[0];
        assert_eq!(rec.concepts_involved, vec!["c0", "c1", "c2", "c3", "c4"]);
        assert_eq!(rec.confidence, Confidence::from_permille(850));
    }

    #[test]
    fn weak_activation_proposes_change() {
        let props = json!({ "activation_strength": 0.5 });
        let changes = FixedWeightInsights.evolution_changes(props.as_object().expect("object"));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, "0.5");
        assert_eq!(changes[0].new_value, "0.8");

        let missing = FixedWeightInsights.evolution_changes(&Map::new());
        assert_eq!(missing[0].old_value, "0");

        let strong = json!({ "activation_strength": 0.8 });
        assert!(
            FixedWeightInsights
                .evolution_changes(strong.as_object().expect("object"))
                .is_empty()
        );
    }

    #[test]
    fn node_concepts_become_activation_patterns() {
        let insights = FixedWeightInsights.node_insights(&["rust".to_string(), "go".to_string()]);
        assert_eq!(insights.semantic_patterns.len(), 2);
        assert_eq!(insights.semantic_patterns[1].concept_id, "go");
        assert_eq!(
            insights.semantic_patterns[0].confidence,
            Confidence::from_permille(800)
        );
        assert_eq!(
            insights.confidence_metrics.overall_confidence,
            Confidence::from_permille(850)
        );

        let value = serde_json::to_value(&insights).expect("serialize");
        assert_eq!(value["semantic_patterns"][0]["pattern_type"], "concept_activation");
        assert_eq!(value["confidence_metrics"]["reasoning_strength"], json!(0.9));
        assert!(FixedWeightInsights.node_insights(&[]).semantic_patterns.is_empty());
    }

    #[test]
    fn analysis_json_shape() {
        let value = serde_json::to_value(FixedWeightInsights.analyze(&memory(1, 2, 1)))
            .expect("serialize");
        assert_eq!(value["temporal_patterns"][0]["pattern_type"], "increasing_activity");
        assert_eq!(value["concept_insights"][0]["insight_type"], "semantic_connection");
        assert_eq!(value["temporal_patterns"][0]["confidence"], json!(0.8));
        assert!(value.get("error").is_none());
    }
}
