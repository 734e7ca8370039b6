use analysis_core::ResultCache;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Internal cache entry with timestamp
struct CacheEntry {
    data: String,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        // A clock step backwards yields a negative age, which counts as fresh
        (Utc::now() - self.cached_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }
}

/// Process-local result cache with per-entry TTL.
#[derive(Default)]
pub struct InMemoryResultCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let fresh = entry.is_fresh();
            if !fresh {
                removed += 1;
            }
            fresh
        });
        removed
    }

    /// Removes `key` only if the entry under it is still expired, so a
    /// concurrent `put` of a fresh value survives.
    fn evict_stale(&self, key: &str) {
        self.entries.remove_if(key, |_, entry| !entry.is_fresh());
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn get(&self, key: &str) -> Option<String> {
        let fresh = {
            let entry = self.entries.get(key)?;
            entry.is_fresh().then(|| entry.data.clone())
        };
        if fresh.is_none() {
            self.evict_stale(key);
        }
        fresh
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                cached_at: Utc::now(),
                ttl,
            },
        );
    }
}

/// Cache key for an assessment: the ticker plus a SHA-256 over the inputs that
/// determine the score.
pub fn assessment_cache_key(ticker: &str, fingerprint: &[u8]) -> String {
    format!(
        "assessment:{}:{}",
        ticker.to_uppercase(),
        hex::encode(Sha256::digest(fingerprint))
    )
}
