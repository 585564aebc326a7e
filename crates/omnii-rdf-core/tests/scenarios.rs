//! # End-to-End Scenarios
//!
//! Behaviour of a [`KnowledgeBase`] seen only through its public operations.
//!
//! ## Groups
//! - S0: Baseline queries
//! - S1: Import then query
//! - S2: Rejected mutations
//! - S3: Cache discipline
//! - S4: Context and reasoning

use omnii_rdf_core::vocab::{OMNII_CONCEPT, OMNII_NS};
use omnii_rdf_core::{
    BrainContext, CacheKey, ConceptEvolutionRequest, ImportRequest, KnowledgeBase, QueryRequest,
    RdfFormat, TermKind,
};

const ALL: &str = "SELECT ?s ?p ?o WHERE { ?s ?p ?o }";

fn concept_import() -> ImportRequest {
    ImportRequest::new(
        format!(
            "@prefix ex: <http://example.org/> .\n\
             ex:c1 a <{OMNII_CONCEPT}> ."
        ),
        RdfFormat::Turtle,
    )
}

// =============================================================================
// S0: BASELINE QUERIES
// =============================================================================

mod s0_baseline {
    use super::*;

    /// S0.1: LIMIT caps rows at min(limit, store size).
    #[test]
    fn limited_scan_of_baseline() {
        let kb = KnowledgeBase::new();
        let outcome = kb.query(&QueryRequest::new(ALL).with_limit(5));
        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(outcome.total_results, 5.min(kb.len()));
        assert!(!outcome.reasoning_applied);
    }

    /// S0.2: Every cell carries its term kind.
    #[test]
    fn cells_are_typed() {
        let kb = KnowledgeBase::new();
        let outcome = kb.query(&QueryRequest::new(ALL));
        assert_eq!(outcome.total_results, 17);
        for row in &outcome.results {
            assert_eq!(row["s"].kind, TermKind::Uri);
            assert_eq!(row["p"].kind, TermKind::Uri);
        }
    }
}

// =============================================================================
// S1: IMPORT THEN QUERY
// =============================================================================

mod s1_import_then_query {
    use super::*;

    /// S1.1: An imported concept is the only instance found.
    #[test]
    fn imported_concept_is_found() {
        let mut kb = KnowledgeBase::new();
        let imported = kb.import(&concept_import());
        assert!(imported.success, "{:?}", imported.error);
        assert_eq!(imported.triples_imported, 1);

        let outcome = kb.query(&QueryRequest::new(
            "SELECT ?x WHERE { ?x rdf:type omnii:Concept }",
        ));
        assert_eq!(outcome.total_results, 1);
        assert_eq!(outcome.results[0]["x"].value, "http://example.org/c1");
    }

    /// S1.2: Optional variables stay absent when nothing matches.
    #[test]
    fn optional_without_match_keeps_row() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.import(&concept_import()).success);

        let outcome = kb.query(&QueryRequest::new(
            "SELECT ?x ?label WHERE { ?x a omnii:Concept . OPTIONAL { ?x rdfs:label ?label } }",
        ));
        assert_eq!(outcome.total_results, 1);
        assert!(outcome.results[0].contains_key("x"));
        assert!(!outcome.results[0].contains_key("label"));
    }

    /// S1.3: Blank nodes from separate imports never merge.
    #[test]
    fn blank_nodes_are_scoped_per_import() {
        let mut kb = KnowledgeBase::new();
        let data = "_:b <http://example.org/p> \"x\" .";
        assert!(kb.import(&ImportRequest::new(data, RdfFormat::NTriples)).success);
        assert!(kb.import(&ImportRequest::new(data, RdfFormat::NTriples)).success);

        let outcome = kb.query(&QueryRequest::new(
            "SELECT ?b WHERE { ?b <http://example.org/p> \"x\" }",
        ));
        assert_eq!(outcome.total_results, 2);
        assert!(outcome.results.iter().all(|r| r["b"].kind == TermKind::Blank));
    }
}

// =============================================================================
// S2: REJECTED MUTATIONS
// =============================================================================

mod s2_rejected_mutations {
    use super::*;

    /// S2.1: Malformed import text leaves the store as it was.
    #[test]
    fn malformed_import_changes_nothing() {
        let mut kb = KnowledgeBase::new();
        let before = kb.len();
        let outcome = kb.import(&ImportRequest::new(
            "@prefix ex: <http://example.org/> .\nex:a ex:b",
            RdfFormat::Turtle,
        ));
        assert!(!outcome.success);
        assert_eq!(outcome.triples_imported, 0);
        assert_eq!(kb.len(), before);
    }

    /// S2.2: A clear-and-import with bad data does not clear.
    #[test]
    fn failed_clear_graph_import_keeps_data() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.import(&concept_import()).success);
        let before = kb.len();

        let request = ImportRequest {
            clear_graph: true,
            ..ImportRequest::new("not rdf at all", RdfFormat::Turtle)
        };
        assert!(!kb.import(&request).success);
        assert_eq!(kb.len(), before);
    }
}

// =============================================================================
// S3: CACHE DISCIPLINE
// =============================================================================

mod s3_cache {
    use super::*;

    /// S3.1: Digest depends on text, reasoning flag and context.
    #[test]
    fn digest_inputs() {
        let ctx = BrainContext::new("u1", "chat");
        let base = CacheKey::for_query(ALL, false, None).expect("key");
        assert_eq!(base, CacheKey::for_query(ALL, false, None).expect("key"));
        assert_ne!(base, CacheKey::for_query(ALL, true, None).expect("key"));
        assert_ne!(base, CacheKey::for_query(ALL, false, Some(&ctx)).expect("key"));
        assert_ne!(
            base,
            CacheKey::for_query("SELECT * WHERE { ?s ?p ?o }", false, None).expect("key")
        );
    }

    /// S3.2: A mutation forces recomputation instead of a stale hit.
    #[test]
    fn import_forces_recompute() {
        let mut kb = KnowledgeBase::new();
        let request = QueryRequest::new("SELECT ?x WHERE { ?x a omnii:Concept }");
        assert_eq!(kb.query(&request).total_results, 0);
        assert!(kb.import(&concept_import()).success);
        assert_eq!(kb.query(&request).total_results, 1);
    }

    /// S3.3: Evolving a concept also invalidates cached results.
    #[test]
    fn evolve_forces_recompute() {
        let mut kb = KnowledgeBase::new();
        let request = QueryRequest::new("SELECT ?x WHERE { ?x a omnii:Concept }");
        assert_eq!(kb.query(&request).total_results, 0);

        let outcome = kb.evolve_concept(&ConceptEvolutionRequest::new("rust", "Rust"));
        assert!(outcome.success, "{:?}", outcome.error);
        let after = kb.query(&request);
        assert_eq!(after.total_results, 1);
        assert_eq!(after.results[0]["x"].value, "https://omnii.ai/concept#rust");
    }
}

// =============================================================================
// S4: CONTEXT AND REASONING
// =============================================================================

mod s4_context_and_reasoning {
    use super::*;

    /// S4.1: A context limits rows to the user's concepts and picks up
    /// temporal strengths when present.
    #[test]
    fn context_scopes_to_user() {
        let mut kb = KnowledgeBase::new();
        let data = format!(
            "@prefix omnii: <{OMNII_NS}> .
             @prefix temporal: <https://omnii.ai/temporal#> .
             @prefix concept: <https://omnii.ai/concept#> .
             concept:a a omnii:Concept ; omnii:belongsToUser \"alice\" ;
                 temporal:previousWeek 0.2 ; temporal:currentWeek 0.5 ; temporal:nextWeek 0.7 .
             concept:b a omnii:Concept ; omnii:belongsToUser \"alice\" .
             concept:c a omnii:Concept ; omnii:belongsToUser \"bob\" ."
        );
        assert!(kb.import(&ImportRequest::new(data, RdfFormat::Turtle)).success);

        let outcome = kb.query(
            &QueryRequest::new("SELECT * WHERE { ?concept a omnii:Concept }")
                .with_context(BrainContext::new("alice", "voice")),
        );
        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(outcome.total_results, 2);

        let with_strength: Vec<_> = outcome
            .results
            .iter()
            .filter(|r| r.contains_key("current_week_strength"))
            .collect();
        assert_eq!(with_strength.len(), 1);
        assert_eq!(with_strength[0]["concept"].value, "https://omnii.ai/concept#a");
        assert_eq!(with_strength[0]["current_week_strength"].value, "0.5");

        let insights = outcome.concept_insights.unwrap_or_default();
        assert_eq!(insights.len(), 2);
        assert!(insights[0].description.contains("voice"));
    }

    /// S4.2: Subproperty and domain rules surface implied types.
    #[test]
    fn reasoning_derives_types() {
        let mut kb = KnowledgeBase::new();
        let data = "@prefix ex: <http://example.org/> .
                    ex:mentorOf rdfs:subPropertyOf ex:knows .
                    ex:knows rdfs:domain ex:Person .
                    ex:ada ex:mentorOf ex:alan .";
        assert!(kb.import(&ImportRequest::new(data, RdfFormat::Turtle)).success);

        let text = "SELECT ?who WHERE { ?who a <http://example.org/Person> }";
        assert_eq!(kb.query(&QueryRequest::new(text)).total_results, 0);

        let reasoned = kb.query(&QueryRequest::new(text).with_reasoning(true));
        assert!(reasoned.reasoning_applied);
        assert_eq!(reasoned.total_results, 1);
        assert_eq!(reasoned.results[0]["who"].value, "http://example.org/ada");
    }
}
