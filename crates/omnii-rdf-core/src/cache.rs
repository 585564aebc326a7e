//! # Result Cache
//!
//! Content-addressed TTL cache for query outcomes.
//!
//! Keys are BLAKE3 digests of the canonical JSON of
//! `{query, reasoning, brain_context}`, so semantically identical requests
//! share an entry. Entries expire by TTL only (no LRU) and the whole cache
//! is dropped on every store mutation.
//!
//! The cache is an optimisation, never a source of truth: a backend fault,
//! an encode failure or a decode failure is logged and treated as a miss.

use crate::augment::BrainContext;
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

// =============================================================================
// KEY
// =============================================================================

/// A cache key: lowercase hex digest, or a caller-supplied hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct DigestInput<'a> {
    query: &'a str,
    reasoning: bool,
    brain_context: Option<&'a BrainContext>,
}

impl CacheKey {
    /// Digest of the original query text, the reasoning flag and the
    /// context. Structurally equal inputs always give equal keys.
    pub fn for_query(
        query: &str,
        reasoning: bool,
        context: Option<&BrainContext>,
    ) -> Result<Self, CacheError> {
        let canonical = serde_json::to_vec(&DigestInput {
            query,
            reasoning,
            brain_context: context,
        })
        .map_err(|e| CacheError::Codec(e.to_string()))?;
        Ok(Self(blake3::hash(&canonical).to_hex().to_string()))
    }

    /// Use a hash the caller computed.
    #[must_use]
    pub fn from_raw(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),

    #[error("cache payload codec failure: {0}")]
    Codec(String),
}

/// A key-value backend with per-entry expiry.
///
/// Implementations must allow concurrent `get`/`put` from many threads.
pub trait CacheStore: Send + Sync {
    /// The payload, if present and not expired.
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a payload; overwrites (last write wins).
    fn put(&self, key: CacheKey, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Drop every entry.
    fn invalidate_all(&self) -> Result<(), CacheError>;

    /// Number of live (unexpired) entries.
    fn len(&self) -> Result<usize, CacheError>;

    /// Drop expired entries, returning how many were removed.
    fn purge_expired(&self) -> Result<usize, CacheError>;
}

// =============================================================================
// IN-PROCESS BACKEND
// =============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Sharded in-memory backend; a lookup only locks its own shard.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.payload.clone())),
            Some(_) => {}
        }
        // shard guard is released above; removing under it would deadlock
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    fn put(&self, key: CacheKey, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                expires_at,
            },
        );
        Ok(())
    }

    fn invalidate_all(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count())
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

// =============================================================================
// TYPED FACADE
// =============================================================================

/// Backend health as reported by metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub connected: bool,
    pub key_count: usize,
}

/// Typed, fault-absorbing wrapper over a [`CacheStore`].
pub struct QueryCache {
    store: Box<dyn CacheStore>,
    reasoning_ttl: Duration,
    plain_ttl: Duration,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("reasoning_ttl", &self.reasoning_ttl)
            .field("plain_ttl", &self.plain_ttl)
            .finish()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new(store: Box<dyn CacheStore>, reasoning_ttl: Duration, plain_ttl: Duration) -> Self {
        Self {
            store,
            reasoning_ttl,
            plain_ttl,
        }
    }

    /// Lifetime of an entry computed with or without reasoning.
    #[must_use]
    pub fn ttl_for(&self, reasoning: bool) -> Duration {
        if reasoning {
            self.reasoning_ttl
        } else {
            self.plain_ttl
        }
    }

    /// Look up and decode; any failure is a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = match self.store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached payload undecodable, treating as miss");
                None
            }
        }
    }

    /// Encode and store; failures are logged and dropped.
    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T, reasoning: bool) {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache encode failed, entry skipped");
                return;
            }
        };
        if let Err(e) = self.store.put(key.clone(), payload, self.ttl_for(reasoning)) {
            warn!(key = %key, error = %e, "Cache write failed, entry skipped");
        }
    }

    /// Drop every entry. Called on each store mutation.
    pub fn invalidate_all(&self) {
        match self.store.invalidate_all() {
            Ok(()) => debug!("Query cache invalidated"),
            Err(e) => warn!(error = %e, "Cache invalidation failed"),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired().unwrap_or_else(|e| {
            warn!(error = %e, "Cache purge failed");
            0
        })
    }

    /// Live entry count (0 when the backend is unreachable).
    pub fn len(&self) -> usize {
        self.stats().key_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        match self.store.len() {
            Ok(key_count) => CacheStats {
                connected: true,
                key_count,
            },
            Err(e) => {
                warn!(error = %e, "Cache stats unavailable");
                CacheStats {
                    connected: false,
                    key_count: 0,
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        rows: Vec<String>,
    }

    fn cache() -> QueryCache {
        QueryCache::new(
            Box::new(MemoryCacheStore::new()),
            Duration::from_secs(900),
            Duration::from_secs(1800),
        )
    }

    /// A backend that is always down.
    struct Offline;

    impl CacheStore for Offline {
        fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Backend("offline".into()))
        }
        fn put(&self, _: CacheKey, _: Vec<u8>, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("offline".into()))
        }
        fn invalidate_all(&self) -> Result<(), CacheError> {
            Err(CacheError::Backend("offline".into()))
        }
        fn len(&self) -> Result<usize, CacheError> {
            Err(CacheError::Backend("offline".into()))
        }
        fn purge_expired(&self) -> Result<usize, CacheError> {
            Err(CacheError::Backend("offline".into()))
        }
    }

    #[test]
    fn digest_is_structural() {
        let ctx = BrainContext::new("u1", "chat");
        let a = CacheKey::for_query("SELECT * { ?s ?p ?o }", true, Some(&ctx)).expect("key");
        let b = CacheKey::for_query("SELECT * { ?s ?p ?o }", true, Some(&ctx.clone()))
            .expect("key");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn digest_is_sensitive_to_every_input() {
        let ctx = BrainContext::new("u1", "chat");
        let base = CacheKey::for_query("q", true, Some(&ctx)).expect("key");
        let other_user = BrainContext::new("u2", "chat");
        let no_temporal = BrainContext {
            temporal_reasoning: false,
            ..ctx.clone()
        };
        for variant in [
            CacheKey::for_query("q2", true, Some(&ctx)),
            CacheKey::for_query("q", false, Some(&ctx)),
            CacheKey::for_query("q", true, None),
            CacheKey::for_query("q", true, Some(&other_user)),
            CacheKey::for_query("q", true, Some(&no_temporal)),
        ] {
            assert_ne!(variant.expect("key"), base);
        }
    }

    #[test]
    fn put_then_get() {
        let cache = cache();
        let key = CacheKey::from_raw("k");
        let value = Payload {
            rows: vec!["a".into()],
        };
        cache.put(&key, &value, false);
        assert_eq!(cache.get::<Payload>(&key), Some(value));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_everything() {
        let cache = cache();
        for i in 0..5 {
            cache.put(&CacheKey::from_raw(format!("k{i}")), &i, true);
        }
        assert_eq!(cache.len(), 5);
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<i32>(&CacheKey::from_raw("k0")), None);
    }

    #[test]
    fn expired_entries_are_misses() {
        let store = MemoryCacheStore::new();
        let key = CacheKey::from_raw("gone");
        store
            .put(key.clone(), b"1".to_vec(), Duration::ZERO)
            .expect("put");
        assert_eq!(store.get(&key).expect("get"), None);
        assert_eq!(store.len().expect("len"), 0);

        store
            .put(CacheKey::from_raw("a"), b"1".to_vec(), Duration::ZERO)
            .expect("put");
        store
            .put(CacheKey::from_raw("b"), b"1".to_vec(), Duration::from_secs(60))
            .expect("put");
        assert_eq!(store.purge_expired().expect("purge"), 1);
        assert_eq!(store.len().expect("len"), 1);
    }

    #[test]
    fn undecodable_payload_is_a_miss() {
        let cache = cache();
        let key = CacheKey::from_raw("k");
        cache.put(&key, &"not a payload", false);
        assert_eq!(cache.get::<Payload>(&key), None);
    }

    #[test]
    fn backend_faults_degrade_to_miss() {
        let cache = QueryCache::new(Box::new(Offline), Duration::ZERO, Duration::ZERO);
        let key = CacheKey::from_raw("k");
        cache.put(&key, &1, false);
        assert_eq!(cache.get::<i32>(&key), None);
        cache.invalidate_all();
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(
            cache.stats(),
            CacheStats {
                connected: false,
                key_count: 0
            }
        );
    }

    #[test]
    fn ttl_depends_on_reasoning() {
        let cache = cache();
        assert_eq!(cache.ttl_for(true), Duration::from_secs(900));
        assert_eq!(cache.ttl_for(false), Duration::from_secs(1800));
    }
}
