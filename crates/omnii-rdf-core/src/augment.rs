//! # Context Augmenter
//!
//! Rewrites query text so results are scoped to a user and, optionally,
//! enriched with the temporal strength bindings.
//!
//! The insertion point is located structurally: the text is tokenized, so
//! a `WHERE {` inside an IRI, string or comment is never mistaken for the
//! outer block. Text with no `WHERE {` passes through untouched; text with
//! more than one is rejected rather than guessed at.

use crate::syntax::{Token, tokenize};
use crate::types::{Literal, RdfError};
use crate::vocab::{
    OMNII_BELONGS_TO_USER, TEMPORAL_CURRENT_WEEK, TEMPORAL_NEXT_WEEK, TEMPORAL_PREVIOUS_WEEK,
};
use serde::{Deserialize, Serialize};

const DEFAULT_MEMORY_WINDOW_HOURS: u32 = 168;

fn default_memory_window_hours() -> u32 {
    DEFAULT_MEMORY_WINDOW_HOURS
}

fn default_true() -> bool {
    true
}

/// The user/channel/time-window scope a query runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainContext {
    pub user_id: String,
    pub channel: String,
    #[serde(default = "default_memory_window_hours")]
    pub memory_window_hours: u32,
    #[serde(default = "default_true")]
    pub include_working_memory: bool,
    #[serde(default = "default_true")]
    pub include_episodic_memory: bool,
    #[serde(default = "default_true")]
    pub include_semantic_memory: bool,
    #[serde(default = "default_true")]
    pub temporal_reasoning: bool,
}

impl BrainContext {
    /// A context with every memory kind and temporal reasoning enabled.
    #[must_use]
    pub fn new(user_id: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            channel: channel.into(),
            memory_window_hours: DEFAULT_MEMORY_WINDOW_HOURS,
            include_working_memory: true,
            include_episodic_memory: true,
            include_semantic_memory: true,
            temporal_reasoning: true,
        }
    }

    /// Number of memory kinds this context draws on.
    #[must_use]
    pub fn memory_contexts_used(&self) -> usize {
        [
            self.include_working_memory,
            self.include_episodic_memory,
            self.include_semantic_memory,
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }
}

/// Rewrite `query` for `context`.
///
/// No context, or no `WHERE {`, returns the text unchanged. Otherwise a
/// user filter (and, with temporal reasoning, the temporal optional block)
/// is inserted right after the brace, keyed on the first variable in the
/// block.
pub fn augment_query(query: &str, context: Option<&BrainContext>) -> Result<String, RdfError> {
    let Some(context) = context else {
        return Ok(query.to_string());
    };

    let tokens = tokenize(query)?;
    let items = &tokens.items;

    let openings: Vec<usize> = items
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| {
            matches!(&pair[0].token, Token::Word(w) if w.eq_ignore_ascii_case("WHERE"))
                && pair[1].token == Token::LBrace
        })
        .map(|(idx, _)| idx.saturating_add(1))
        .collect();

    let brace = match openings.as_slice() {
        [] => return Ok(query.to_string()),
        [brace] => *brace,
        [_, second, ..] => {
            let at = &items[*second];
            return Err(RdfError::syntax(
                at.line,
                at.column,
                format!(
                    "cannot augment: {} WHERE blocks, expected exactly one",
                    openings.len()
                ),
            ));
        }
    };

    let Some(primary) = items[brace..].iter().find_map(|s| match &s.token {
        Token::Variable(name) => Some(name.as_str()),
        _ => None,
    }) else {
        return Ok(query.to_string());
    };

    let insert_at = items[brace].end;
    let mut scoped = String::with_capacity(query.len().saturating_add(256));
    scoped.push_str(&query[..insert_at]);
    scoped.push_str(&scope_clauses(primary, context));
    scoped.push_str(&query[insert_at..]);
    Ok(scoped)
}

fn scope_clauses(var: &str, context: &BrainContext) -> String {
    let user = Literal::simple(context.user_id.as_str());
    let mut out = format!(" FILTER EXISTS {{ ?{var} <{OMNII_BELONGS_TO_USER}> {user} . }}");
    if context.temporal_reasoning {
        out.push_str(&format!(
            " OPTIONAL {{ ?{var} <{TEMPORAL_PREVIOUS_WEEK}> ?previous_week_strength . \
             ?{var} <{TEMPORAL_CURRENT_WEEK}> ?current_week_strength . \
             ?{var} <{TEMPORAL_NEXT_WEEK}> ?next_week_strength . }}"
        ));
    }
    out.push(' ');
    out
}
