//! # Triple Store
//!
//! The indexed in-memory fact store.
//!
//! This module implements the `TripleStore` trait.
//! Every fact is indexed three ways (subject-predicate-object,
//! predicate-object-subject, object-subject-predicate) so any pattern with
//! at least one bound position is answered from the index whose leading
//! key is bound. All indexes use `BTreeMap`/`BTreeSet` for deterministic
//! ordering.

use crate::types::{BlankNode, Iri, Subject, Term, Triple};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TRIPLE PATTERN
// =============================================================================

/// A lookup pattern: each position is either bound or a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: Option<Subject>,
    pub predicate: Option<Iri>,
    pub object: Option<Term>,
}

impl TriplePattern {
    /// The all-wildcard pattern.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: Iri) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }
}

// =============================================================================
// TRIPLESTORE TRAIT
// =============================================================================

/// The TripleStore trait defines the fact store operations.
///
/// Insertion is idempotent: inserting a fact already present leaves the
/// store unchanged. The count always equals the number of distinct facts.
pub trait TripleStore {
    /// Insert a fact. Returns `true` if it was not already present.
    fn insert(&mut self, triple: Triple) -> bool;

    /// Remove a fact. Returns `true` if it was present.
    fn remove(&mut self, triple: &Triple) -> bool;

    /// Whether the fact is present.
    fn contains(&self, triple: &Triple) -> bool;

    /// Every fact matching the pattern, in deterministic order.
    fn matches(&self, pattern: TriplePattern) -> Box<dyn Iterator<Item = Triple> + '_>;

    /// Number of distinct facts.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every fact.
    fn clear(&mut self);
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

type Index<A, B, C> = BTreeMap<A, BTreeMap<B, BTreeSet<C>>>;

/// The main Graph structure.
///
/// The three indexes always hold exactly the same set of facts.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// subject -> predicate -> objects
    spo: Index<Subject, Iri, Term>,

    /// predicate -> object -> subjects
    pos: Index<Iri, Term, Subject>,

    /// object -> subject -> predicates
    osp: Index<Term, Subject, Iri>,

    len: usize,

    /// Counter for store-scoped blank node labels.
    next_blank_id: u64,
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.spo == other.spo
    }
}

impl Eq for Graph {}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over every fact in subject-predicate-object order.
    pub fn iter(&self) -> impl Iterator<Item = Triple> + '_ {
        self.spo.iter().flat_map(|(s, preds)| {
            preds
                .iter()
                .flat_map(move |(p, objs)| objs.iter().map(move |o| Triple::from_refs(s, p, o)))
        })
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &Subject,
        predicate: &Iri,
    ) -> impl Iterator<Item = &'a Term> + use<'a> {
        self.spo
            .get(subject)
            .and_then(|preds| preds.get(predicate))
            .into_iter()
            .flatten()
    }

    /// Subjects of `(?, predicate, object)`.
    pub fn subjects<'a>(
        &'a self,
        predicate: &Iri,
        object: &Term,
    ) -> impl Iterator<Item = &'a Subject> + use<'a> {
        self.pos
            .get(predicate)
            .and_then(|objs| objs.get(object))
            .into_iter()
            .flatten()
    }

    /// Every `(subject, object)` pair connected by `predicate`.
    pub fn pairs<'a>(
        &'a self,
        predicate: &Iri,
    ) -> impl Iterator<Item = (&'a Subject, &'a Term)> + use<'a> {
        self.pos
            .get(predicate)
            .into_iter()
            .flat_map(|objs| objs.iter().flat_map(|(o, subs)| subs.iter().map(move |s| (s, o))))
    }

    /// Number of distinct subjects.
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.spo.len()
    }

    /// Mint a blank node whose label is unused in this store.
    pub fn fresh_blank_node(&mut self) -> BlankNode {
        loop {
            let node = BlankNode::new(format!("n{}", self.next_blank_id));
            self.next_blank_id = self.next_blank_id.saturating_add(1);
            let as_subject = Subject::BlankNode(node.clone());
            let as_object = Term::BlankNode(node.clone());
            if !self.spo.contains_key(&as_subject) && !self.osp.contains_key(&as_object) {
                return node;
            }
        }
    }

    /// Merge another graph, scoping its blank nodes to this store.
    ///
    /// Every distinct blank node of `other` is relabelled to a fresh store
    /// label, so blank nodes from separate imports never collide even when
    /// their document labels do. Returns the number of facts added.
    pub fn merge_scoped(&mut self, other: Graph) -> usize {
        let mut relabel: BTreeMap<BlankNode, BlankNode> = BTreeMap::new();
        let mut added = 0usize;

        for triple in other.iter() {
            let subject = match triple.subject {
                Subject::BlankNode(node) => Subject::BlankNode(self.scoped(&mut relabel, node)),
                iri => iri,
            };
            let object = match triple.object {
                Term::BlankNode(node) => Term::BlankNode(self.scoped(&mut relabel, node)),
                term => term,
            };
            if self.insert(Triple {
                subject,
                predicate: triple.predicate,
                object,
            }) {
                added = added.saturating_add(1);
            }
        }

        added
    }

    fn scoped(&mut self, relabel: &mut BTreeMap<BlankNode, BlankNode>, node: BlankNode) -> BlankNode {
        if let Some(existing) = relabel.get(&node) {
            return existing.clone();
        }
        let fresh = self.fresh_blank_node();
        relabel.insert(node, fresh.clone());
        fresh
    }

    fn remove_nested<A: Ord, B: Ord, C: Ord>(index: &mut Index<A, B, C>, a: &A, b: &B, c: &C) -> bool {
        let Some(inner) = index.get_mut(a) else {
            return false;
        };
        let Some(leaf) = inner.get_mut(b) else {
            return false;
        };
        if !leaf.remove(c) {
            return false;
        }
        if leaf.is_empty() {
            inner.remove(b);
        }
        if inner.is_empty() {
            index.remove(a);
        }
        true
    }
}

impl TripleStore for Graph {
    fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        let inserted = self
            .spo
            .entry(subject.clone())
            .or_default()
            .entry(predicate.clone())
            .or_default()
            .insert(object.clone());
        if !inserted {
            return false;
        }

        self.pos
            .entry(predicate.clone())
            .or_default()
            .entry(object.clone())
            .or_default()
            .insert(subject.clone());
        self.osp
            .entry(object)
            .or_default()
            .entry(subject)
            .or_default()
            .insert(predicate);
        self.len = self.len.saturating_add(1);
        true
    }

    fn remove(&mut self, triple: &Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        if !Self::remove_nested(&mut self.spo, subject, predicate, object) {
            return false;
        }
        Self::remove_nested(&mut self.pos, predicate, object, subject);
        Self::remove_nested(&mut self.osp, object, subject, predicate);
        self.len = self.len.saturating_sub(1);
        true
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.spo
            .get(&triple.subject)
            .and_then(|preds| preds.get(&triple.predicate))
            .is_some_and(|objs| objs.contains(&triple.object))
    }

    fn matches(&self, pattern: TriplePattern) -> Box<dyn Iterator<Item = Triple> + '_> {
        let TriplePattern {
            subject,
            predicate,
            object,
        } = pattern;

        match (subject, predicate, object) {
            (Some(s), Some(p), Some(o)) => {
                let triple = Triple {
                    subject: s,
                    predicate: p,
                    object: o,
                };
                let hit = self.contains(&triple);
                Box::new(hit.then_some(triple).into_iter())
            }
            (Some(s), Some(p), None) => Box::new(
                self.spo
                    .get_key_value(&s)
                    .into_iter()
                    .flat_map(move |(s, preds)| {
                        preds
                            .get_key_value(&p)
                            .into_iter()
                            .flat_map(move |(p, objs)| objs.iter().map(move |o| Triple::from_refs(s, p, o)))
                    }),
            ),
            (Some(s), None, Some(o)) => Box::new(
                self.osp
                    .get_key_value(&o)
                    .into_iter()
                    .flat_map(move |(o, subs)| {
                        subs.get_key_value(&s)
                            .into_iter()
                            .flat_map(move |(s, preds)| preds.iter().map(move |p| Triple::from_refs(s, p, o)))
                    }),
            ),
            (Some(s), None, None) => Box::new(self.spo.get_key_value(&s).into_iter().flat_map(
                |(s, preds)| {
                    preds
                        .iter()
                        .flat_map(move |(p, objs)| objs.iter().map(move |o| Triple::from_refs(s, p, o)))
                },
            )),
            (None, Some(p), Some(o)) => Box::new(
                self.pos
                    .get_key_value(&p)
                    .into_iter()
                    .flat_map(move |(p, objs)| {
                        objs.get_key_value(&o)
                            .into_iter()
                            .flat_map(move |(o, subs)| subs.iter().map(move |s| Triple::from_refs(s, p, o)))
                    }),
            ),
            (None, Some(p), None) => Box::new(self.pos.get_key_value(&p).into_iter().flat_map(
                |(p, objs)| {
                    objs.iter()
                        .flat_map(move |(o, subs)| subs.iter().map(move |s| Triple::from_refs(s, p, o)))
                },
            )),
            (None, None, Some(o)) => Box::new(self.osp.get_key_value(&o).into_iter().flat_map(
                |(o, subs)| {
                    subs.iter()
                        .flat_map(move |(s, preds)| preds.iter().map(move |p| Triple::from_refs(s, p, o)))
                },
            )),
            (None, None, None) => Box::new(self.iter()),
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.spo.clear();
        self.pos.clear();
        self.osp.clear();
        self.len = 0;
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
