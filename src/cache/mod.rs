//! Short-lived result cache keyed by a fingerprint of the request text.
//!
//! Entries expire after a fixed TTL (moka `time_to_live`), so an expired entry
//! is a miss on the next read. Only complete results are ever inserted.
//! Concurrent identical requests may both compute; the last insert wins.

pub mod types;

#[cfg(test)]
mod tests;

pub use types::{
    CacheInfo, CacheStatus, VERITY_STATUS_HEADER, VERITY_STATUS_HEALTHY, VERITY_STATUS_NOT_READY,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::config::Config;
use crate::hashing::{NormalizationPolicy, fingerprint};
use crate::pipeline::ClassificationResult;

pub struct ResultCache {
    entries: Cache<[u8; 32], Arc<ClassificationResult>>,
    policy: NormalizationPolicy,
    ttl: Duration,
    capacity: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(capacity: u64, ttl: Duration, policy: NormalizationPolicy) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            policy,
            ttl,
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_capacity,
            config.cache_ttl(),
            config.cache_normalization,
        )
    }

    /// Fingerprint used as the key for `text`.
    #[inline]
    pub fn key(&self, text: &str) -> [u8; 32] {
        fingerprint(text, self.policy)
    }

    pub fn get(&self, text: &str) -> Option<Arc<ClassificationResult>> {
        let found = self.entries.get(&self.key(text));
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        debug!(hit = found.is_some(), text_len = text.len(), "Result cache lookup");
        found
    }

    /// Stores `result`, replacing any entry for the same fingerprint.
    pub fn put(&self, text: &str, result: Arc<ClassificationResult>) -> [u8; 32] {
        let key = self.key(text);
        self.entries.insert(key, result);
        key
    }

    pub fn invalidate(&self, text: &str) {
        self.entries.invalidate(&self.key(text));
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Approximate entry count (see moka's `entry_count`).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies pending evictions so `len` is exact. Mostly for tests.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    /// Statistics snapshot; flushes pending maintenance first so `entries` is exact.
    pub fn info(&self) -> CacheInfo {
        self.entries.run_pending_tasks();
        CacheInfo {
            entries: self.entries.entry_count(),
            ttl_secs: self.ttl.as_secs(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            normalization: self.policy,
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .field("policy", &self.policy)
            .finish()
    }
}
