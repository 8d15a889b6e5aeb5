//! Verification result cache with TTL expiry.
//!
//! Stale entries are treated as absent on read. They are only removed when
//! the cache is bounded and needs room, or on [`VerificationCache::purge_expired`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mentor_core::{VerificationPolicy, VerificationStatus};
use tokio::sync::RwLock;

/// A cached verification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub status: VerificationStatus,
    pub checked_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is still fresh at `now` for the given TTL.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.checked_at < ttl
    }
}

/// Thread-safe URL -> verdict cache.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct VerificationCache {
    ttl: Duration,
    /// Maximum number of entries, if bounded.
    capacity: Option<usize>,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl VerificationCache {
    /// Create an unbounded cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            capacity: None,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a cache holding at most `capacity` entries.
    pub fn bounded(ttl: Duration, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(ttl)
        }
    }

    /// Create an unbounded cache using the policy TTL.
    pub fn from_policy(policy: &VerificationPolicy) -> Self {
        Self::new(policy.ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the entry for `url` if it is still fresh.
    pub async fn get(&self, url: &str) -> Option<CacheEntry> {
        self.get_at(url, Utc::now()).await
    }

    /// Get the entry for `url` if it is fresh at `now`.
    pub async fn get_at(&self, url: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        entries
            .get(url)
            .copied()
            .filter(|entry| entry.is_fresh(now, self.ttl))
    }

    /// Store a verdict, overwriting any previous entry for `url`.
    pub async fn put(&self, url: &str, status: VerificationStatus, checked_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;

        if let Some(capacity) = self.capacity {
            if entries.len() >= capacity && !entries.contains_key(url) {
                let now = Utc::now();
                let ttl = self.ttl;
                entries.retain(|_, entry| entry.is_fresh(now, ttl));

                if entries.len() >= capacity {
                    // Evict the oldest verdict
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, entry)| entry.checked_at)
                        .map(|(key, _)| key.clone());
                    if let Some(key) = oldest {
                        entries.remove(&key);
                    }
                }
            }
        }

        entries.insert(url.to_string(), CacheEntry { status, checked_at });
    }

    /// Drop every stale entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Utc::now();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - entries.len()
    }

    /// Number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
