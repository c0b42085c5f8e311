//! Time-bounded memoization of upstream detail lookups
//!
//! [`DetailCache`] stores successful fetch results for a fixed TTL measured
//! from write time. Failed fetches are never stored, so every caller retries
//! on its next access. Entries are never updated in place; a refetch replaces
//! the entry with a fresh value and a fresh expiry.
//!
//! Concurrent callers that miss on the same key each run their own fetch.
//! Fetches are idempotent, so the racing writes converge to equal values; the
//! cache does not keep an in-flight registry to collapse them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// TTL cache keyed by item identifier, shared across tasks
///
/// Cloning is cheap; clones share the same storage.
#[derive(Debug)]
pub struct DetailCache<T> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
}

impl<T> Clone for DetailCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            ttl: self.ttl,
        }
    }
}

impl<T: Clone> DetailCache<T> {
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Return the fresh cached value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` with a fresh expiry, replacing any previous entry
    pub async fn insert(&self, key: impl Into<String>, value: T) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_fresh(now));
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Return the cached value for `key`, or run `fetch` and cache its success
    ///
    /// `fetch` is not invoked on a fresh hit. Errors are returned to the caller
    /// and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            tracing::trace!(key, "detail cache hit");
            return Ok(value);
        }

        tracing::trace!(key, "detail cache miss");
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
