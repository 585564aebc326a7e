//! # Reasoner
//!
//! Forward-chaining RDFS / OWL-RL subset.
//!
//! The reasoner works on a copy of the store: it clones the base graph,
//! applies every rule to the working set and adds what is new, and repeats
//! until an iteration adds nothing (fixpoint) or the iteration cap is hit.
//! The base graph is never modified.
//!
//! Rules are plain structs implementing [`Rule`]; the catalogue is fixed
//! at construction. Rule output is collected into a `BTreeSet`, so the
//! inferred closure is deterministic.

use crate::graph::{Graph, TripleStore};
use crate::query::Deadline;
use crate::types::{Iri, RdfError, Subject, Term, Triple};
use crate::vocab::{
    MAX_REASONING_ITERATIONS, OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_EQUIVALENT_CLASS,
    OWL_EQUIVALENT_PROPERTY, OWL_INVERSE_OF, OWL_OBJECT_PROPERTY, OWL_SAME_AS,
    OWL_SYMMETRIC_PROPERTY, OWL_TRANSITIVE_PROPERTY, RDF_PROPERTY, RDF_TYPE, RDFS_CLASS,
    RDFS_DOMAIN, RDFS_RANGE, RDFS_SUB_CLASS_OF, RDFS_SUB_PROPERTY_OF,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use tracing::debug;

// =============================================================================
// RULE TRAIT
// =============================================================================

/// A monotone inference rule.
///
/// `apply` returns conclusions derivable in one step from `graph`. It may
/// return facts already present; the reasoner filters them.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, graph: &Graph) -> Vec<Triple>;
}

// =============================================================================
// REPORT
// =============================================================================

/// Summary of one expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReasoningReport {
    /// Iterations that added at least one fact.
    pub iterations: usize,
    /// Facts added on top of the base graph.
    pub inferred: usize,
    /// `false` when the iteration cap stopped expansion early.
    pub reached_fixpoint: bool,
    /// Facts contributed per rule.
    pub rule_stats: BTreeMap<String, usize>,
}

// =============================================================================
// REASONER
// =============================================================================

pub struct Reasoner {
    rules: Vec<Box<dyn Rule>>,
    max_iterations: usize,
}

impl std::fmt::Debug for Reasoner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reasoner")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::rdfs_owl(MAX_REASONING_ITERATIONS)
    }
}

impl Reasoner {
    /// A reasoner with no rules.
    #[must_use]
    pub fn empty(max_iterations: usize) -> Self {
        Self {
            rules: Vec::new(),
            max_iterations,
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// The standard RDFS / OWL-RL catalogue.
    #[must_use]
    pub fn rdfs_owl(max_iterations: usize) -> Self {
        Self::empty(max_iterations)
            .with_rule(SubClassTransitivity)
            .with_rule(TypeInheritance)
            .with_rule(SubPropertyTransitivity)
            .with_rule(SubPropertyInheritance)
            .with_rule(DomainTyping)
            .with_rule(RangeTyping)
            .with_rule(EquivalentClass)
            .with_rule(EquivalentProperty)
            .with_rule(InverseOf)
            .with_rule(SymmetricProperty)
            .with_rule(TransitiveProperty)
            .with_rule(SameAs)
            .with_rule(SchemaTyping)
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Compute the closure of `base` under the rule catalogue.
    ///
    /// Returns the expanded copy; `base` is untouched.
    #[must_use]
    pub fn expand(&self, base: &Graph) -> (Graph, ReasoningReport) {
        let Ok(expanded) = self.saturate(base, || Ok::<(), Infallible>(()));
        expanded
    }

    /// [`expand`](Self::expand) under a time budget, checked before every
    /// rule application.
    pub fn expand_within(
        &self,
        base: &Graph,
        deadline: &Deadline,
    ) -> Result<(Graph, ReasoningReport), RdfError> {
        self.saturate(base, || deadline.check())
    }

    fn saturate<E>(
        &self,
        base: &Graph,
        mut check: impl FnMut() -> Result<(), E>,
    ) -> Result<(Graph, ReasoningReport), E> {
        let mut graph = base.clone();
        let mut report = ReasoningReport::default();

        while report.iterations < self.max_iterations {
            let mut fresh: BTreeSet<Triple> = BTreeSet::new();
            for rule in &self.rules {
                check()?;
                let before = fresh.len();
                fresh.extend(
                    rule.apply(&graph)
                        .into_iter()
                        .filter(|t| !graph.contains(t)),
                );
                let contributed = fresh.len().saturating_sub(before);
                if contributed > 0 {
                    let entry = report.rule_stats.entry(rule.name().to_string()).or_default();
                    *entry = entry.saturating_add(contributed);
                }
            }

            if fresh.is_empty() {
                report.reached_fixpoint = true;
                break;
            }

            report.iterations = report.iterations.saturating_add(1);
            report.inferred = report.inferred.saturating_add(fresh.len());
            graph.extend(fresh);
        }

        if !report.reached_fixpoint {
            check()?;
            // one more pass to tell "capped" from "finished on the last round"
            report.reached_fixpoint = self
                .rules
                .iter()
                .all(|rule| rule.apply(&graph).iter().all(|t| graph.contains(t)));
        }

        debug!(
            base = base.len(),
            inferred = report.inferred,
            iterations = report.iterations,
            fixpoint = report.reached_fixpoint,
            "Reasoning expansion complete"
        );

        Ok((graph, report))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn iri(value: &str) -> Iri {
    Iri::new(value)
}

/// A term usable as a subject (IRI or blank node).
fn node(term: &Term) -> Option<Subject> {
    Subject::from_term(term)
}

/// A subject that is an IRI, as used in predicate position.
fn property(subject: &Subject) -> Option<&Iri> {
    match subject {
        Subject::Iri(iri) => Some(iri),
        Subject::BlankNode(_) => None,
    }
}

/// `a p b . b p c => a p c` for a fixed predicate.
fn transitive_closure_step(graph: &Graph, predicate: &Iri) -> Vec<Triple> {
    let mut out = Vec::new();
    for (a, b) in graph.pairs(predicate) {
        let Some(b) = node(b) else { continue };
        for c in graph.objects(&b, predicate) {
            out.push(Triple::new(a.clone(), predicate.clone(), c.clone()));
        }
    }
    out
}

// =============================================================================
// RULE CATALOGUE
// =============================================================================

/// rdfs11: `A subClassOf B . B subClassOf C => A subClassOf C`
pub struct SubClassTransitivity;

impl Rule for SubClassTransitivity {
    fn name(&self) -> &'static str {
        "rdfs11-subclass-transitivity"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        transitive_closure_step(graph, &iri(RDFS_SUB_CLASS_OF))
    }
}

/// rdfs9: `x type A . A subClassOf B => x type B`
pub struct TypeInheritance;

impl Rule for TypeInheritance {
    fn name(&self) -> &'static str {
        "rdfs9-type-inheritance"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let rdf_type = iri(RDF_TYPE);
        let sub_class = iri(RDFS_SUB_CLASS_OF);
        let mut out = Vec::new();
        for (x, class) in graph.pairs(&rdf_type) {
            let Some(class) = node(class) else { continue };
            for sup in graph.objects(&class, &sub_class) {
                out.push(Triple::new(x.clone(), rdf_type.clone(), sup.clone()));
            }
        }
        out
    }
}

/// rdfs5: `p subPropertyOf q . q subPropertyOf r => p subPropertyOf r`
pub struct SubPropertyTransitivity;

impl Rule for SubPropertyTransitivity {
    fn name(&self) -> &'static str {
        "rdfs5-subproperty-transitivity"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        transitive_closure_step(graph, &iri(RDFS_SUB_PROPERTY_OF))
    }
}

/// rdfs7: `s p o . p subPropertyOf q => s q o`
pub struct SubPropertyInheritance;

impl Rule for SubPropertyInheritance {
    fn name(&self) -> &'static str {
        "rdfs7-subproperty-inheritance"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let mut out = Vec::new();
        for (p, q) in graph.pairs(&iri(RDFS_SUB_PROPERTY_OF)) {
            let (Some(p), Some(q)) = (property(p), q.as_iri()) else {
                continue;
            };
            for (s, o) in graph.pairs(p) {
                out.push(Triple::new(s.clone(), q.clone(), o.clone()));
            }
        }
        out
    }
}

/// rdfs2: `p domain C . s p o => s type C`
pub struct DomainTyping;

impl Rule for DomainTyping {
    fn name(&self) -> &'static str {
        "rdfs2-domain"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let rdf_type = iri(RDF_TYPE);
        let mut out = Vec::new();
        for (p, class) in graph.pairs(&iri(RDFS_DOMAIN)) {
            let Some(p) = property(p) else { continue };
            for (s, _) in graph.pairs(p) {
                out.push(Triple::new(s.clone(), rdf_type.clone(), class.clone()));
            }
        }
        out
    }
}

/// rdfs3: `p range C . s p o => o type C`, skipped for literal objects.
pub struct RangeTyping;

impl Rule for RangeTyping {
    fn name(&self) -> &'static str {
        "rdfs3-range"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let rdf_type = iri(RDF_TYPE);
        let mut out = Vec::new();
        for (p, class) in graph.pairs(&iri(RDFS_RANGE)) {
            let Some(p) = property(p) else { continue };
            for (_, o) in graph.pairs(p) {
                let Some(o) = node(o) else { continue };
                out.push(Triple::new(o, rdf_type.clone(), class.clone()));
            }
        }
        out
    }
}

/// `A equivalentClass B => A subClassOf B . B subClassOf A`
pub struct EquivalentClass;

impl Rule for EquivalentClass {
    fn name(&self) -> &'static str {
        "owl-equivalent-class"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        mutual(graph, &iri(OWL_EQUIVALENT_CLASS), &iri(RDFS_SUB_CLASS_OF))
    }
}

/// `p equivalentProperty q => p subPropertyOf q . q subPropertyOf p`
pub struct EquivalentProperty;

impl Rule for EquivalentProperty {
    fn name(&self) -> &'static str {
        "owl-equivalent-property"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        mutual(graph, &iri(OWL_EQUIVALENT_PROPERTY), &iri(RDFS_SUB_PROPERTY_OF))
    }
}

fn mutual(graph: &Graph, equivalence: &Iri, order: &Iri) -> Vec<Triple> {
    let mut out = Vec::new();
    for (a, b) in graph.pairs(equivalence) {
        out.push(Triple::new(a.clone(), order.clone(), b.clone()));
        if let Some(b) = node(b) {
            out.push(Triple::new(b, order.clone(), Term::from(a.clone())));
        }
    }
    out
}

/// `p inverseOf q . s p o => o q s` (and the converse for q)
pub struct InverseOf;

impl Rule for InverseOf {
    fn name(&self) -> &'static str {
        "owl-inverse-of"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let mut out = Vec::new();
        for (p, q) in graph.pairs(&iri(OWL_INVERSE_OF)) {
            let (Some(p), Some(q)) = (property(p), q.as_iri()) else {
                continue;
            };
            for (forward, backward) in [(p, q), (q, p)] {
                for (s, o) in graph.pairs(forward) {
                    let Some(o) = node(o) else { continue };
                    out.push(Triple::new(o, backward.clone(), Term::from(s.clone())));
                }
            }
        }
        out
    }
}

/// `p type SymmetricProperty . s p o => o p s`
pub struct SymmetricProperty;

impl Rule for SymmetricProperty {
    fn name(&self) -> &'static str {
        "owl-symmetric-property"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let mut out = Vec::new();
        for p in graph.subjects(&iri(RDF_TYPE), &Term::iri(OWL_SYMMETRIC_PROPERTY)) {
            let Some(p) = property(p) else { continue };
            for (s, o) in graph.pairs(p) {
                let Some(o) = node(o) else { continue };
                out.push(Triple::new(o, p.clone(), Term::from(s.clone())));
            }
        }
        out
    }
}

/// `p type TransitiveProperty . a p b . b p c => a p c`
pub struct TransitiveProperty;

impl Rule for TransitiveProperty {
    fn name(&self) -> &'static str {
        "owl-transitive-property"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        graph
            .subjects(&iri(RDF_TYPE), &Term::iri(OWL_TRANSITIVE_PROPERTY))
            .filter_map(property)
            .flat_map(|p| transitive_closure_step(graph, p))
            .collect()
    }
}

/// `a sameAs b => b sameAs a`, and transitivity.
pub struct SameAs;

impl Rule for SameAs {
    fn name(&self) -> &'static str {
        "owl-same-as"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let same_as = iri(OWL_SAME_AS);
        let mut out = transitive_closure_step(graph, &same_as);
        for (a, b) in graph.pairs(&same_as) {
            if let Some(b) = node(b) {
                out.push(Triple::new(b, same_as.clone(), Term::from(a.clone())));
            }
        }
        out
    }
}

/// OWL declarations imply their RDFS counterparts:
/// `C type owl:Class => C type rdfs:Class`,
/// `p type owl:ObjectProperty|owl:DatatypeProperty => p type rdf:Property`.
pub struct SchemaTyping;

impl Rule for SchemaTyping {
    fn name(&self) -> &'static str {
        "owl-schema-typing"
    }

    fn apply(&self, graph: &Graph) -> Vec<Triple> {
        let rdf_type = iri(RDF_TYPE);
        let implied = [
            (OWL_CLASS, RDFS_CLASS),
            (OWL_OBJECT_PROPERTY, RDF_PROPERTY),
            (OWL_DATATYPE_PROPERTY, RDF_PROPERTY),
        ];
        let mut out = Vec::new();
        for (owl, rdfs) in implied {
            for subject in graph.subjects(&rdf_type, &Term::iri(owl)) {
                out.push(Triple::new(subject.clone(), rdf_type.clone(), Term::iri(rdfs)));
            }
        }
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================
