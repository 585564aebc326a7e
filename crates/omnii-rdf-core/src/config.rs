//! # Service Configuration
//!
//! Tunables for the knowledge base, loaded from an optional TOML file.
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! [cache]
//! reasoning_ttl_secs = 900
//! plain_ttl_secs = 1800
//!
//! [reasoning]
//! max_iterations = 32
//!
//! [query]
//! default_limit = 100
//! max_limit = 10000
//! default_timeout_secs = 10
//! max_timeout_secs = 300
//! ```

use crate::types::RdfError;
use crate::vocab::{
    DEFAULT_QUERY_LIMIT, DEFAULT_QUERY_TIMEOUT_SECS, MAX_QUERY_LIMIT, MAX_QUERY_TIMEOUT_SECS,
    MAX_REASONING_ITERATIONS, PLAIN_CACHE_TTL_SECS, REASONING_CACHE_TTL_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub reasoning_ttl_secs: u64,
    pub plain_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reasoning_ttl_secs: REASONING_CACHE_TTL_SECS,
            plain_ttl_secs: PLAIN_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReasoningConfig {
    pub max_iterations: usize,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_REASONING_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_QUERY_LIMIT,
            max_limit: MAX_QUERY_LIMIT,
            default_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            max_timeout_secs: MAX_QUERY_TIMEOUT_SECS,
        }
    }
}

impl QueryConfig {
    /// Clamp a requested row limit to `1..=max_limit`.
    #[must_use]
    pub fn clamp_limit(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_limit.max(1))
    }

    /// Clamp a requested timeout to `1..=max_timeout_secs` seconds.
    #[must_use]
    pub fn clamp_timeout(&self, requested_secs: u64) -> Duration {
        Duration::from_secs(requested_secs.clamp(1, self.max_timeout_secs.max(1)))
    }
}

/// All knowledge-base tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub reasoning: ReasoningConfig,
    pub query: QueryConfig,
}

impl ServiceConfig {
    /// Parse TOML text, then check the values make sense together.
    pub fn from_toml_str(text: &str) -> Result<Self, RdfError> {
        let config: Self = toml::from_str(text).map_err(|e| RdfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RdfError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RdfError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), RdfError> {
        if self.cache.reasoning_ttl_secs == 0 || self.cache.plain_ttl_secs == 0 {
            return Err(RdfError::Config("cache TTLs must be positive".into()));
        }
        if self.reasoning.max_iterations == 0 {
            return Err(RdfError::Config(
                "reasoning.max_iterations must be positive".into(),
            ));
        }
        let q = &self.query;
        if q.default_limit == 0 || q.default_limit > q.max_limit {
            return Err(RdfError::Config(format!(
                "query.default_limit must be in 1..={}",
                q.max_limit
            )));
        }
        if q.default_timeout_secs == 0 || q.default_timeout_secs > q.max_timeout_secs {
            return Err(RdfError::Config(format!(
                "query.default_timeout_secs must be in 1..={}",
                q.max_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn reasoning_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.reasoning_ttl_secs)
    }

    pub fn plain_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.plain_ttl_secs)
    }
}
