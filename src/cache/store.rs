// Cache store for reading and writing cached API responses.
// Handles JSON serialization, TTL checking, LRU eviction and storage quota recovery.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;

use super::clock::{Clock, SystemClock};
use super::storage::Storage;

/// Prefix shared by every cache key, so unrelated stored data is never touched.
pub const CACHE_PREFIX: &str = "github-search:";

/// Default TTL for API responses: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default upper bound on cached entries.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Wrapper for cached data with metadata, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub created_at: DateTime<Utc>,
    /// Validity window from `created_at`, in milliseconds.
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
    /// Last successful read; falls back to `created_at` when missing.
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            created_at: now,
            ttl_ms: ttl.as_millis().try_into().unwrap_or(u64::MAX),
            last_accessed: Some(now),
        }
    }

    /// Check if this entry has outlived its TTL at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age_ms = now.signed_duration_since(self.created_at).num_milliseconds();
        age_ms > 0 && age_ms as u64 > self.ttl_ms
    }
}

/// The recency fields of an entry, all eviction needs to read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryMeta {
    created_at: DateTime<Utc>,
    #[serde(default)]
    last_accessed: Option<DateTime<Utc>>,
}

impl EntryMeta {
    fn recency(&self) -> DateTime<Utc> {
        self.last_accessed.unwrap_or(self.created_at)
    }
}

/// Bounded, expiring key-value cache over a `Storage`.
///
/// Every operation is total: storage and serialization failures are logged
/// and degrade to a miss or a dropped write.
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
    // Serializes compound read-modify-write sequences (evict then write, read then touch).
    ops: Mutex<()>,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>, max_entries: usize) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            max_entries: max_entries.max(1),
            ops: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Read a live entry, refreshing its recency. Expired entries are deleted.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let _ops = self.lock();
        let full_key = namespaced(key);

        let raw = match self.storage.get_item(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "Failed to read from cache");
                return None;
            }
        };

        let mut entry: CacheEntry<Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key, error = %err, "Unreadable cache entry treated as a miss");
                return None;
            }
        };

        let now = self.clock.now();
        if entry.is_expired(now) {
            debug!(key, "Cache entry expired");
            self.delete(&full_key);
            return None;
        }

        entry.last_accessed = Some(now);
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(err) = self.storage.set_item(&full_key, &json) {
                    warn!(key, error = %err, "Failed to refresh cache entry recency");
                }
            }
            Err(err) => warn!(key, error = %err, "Failed to serialize cache entry"),
        }

        match serde_json::from_value(entry.data) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(key, error = %err, "Cached data has an unexpected shape");
                None
            }
        }
    }

    /// Write an entry, evicting least-recently-used entries to stay within bounds.
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let _ops = self.lock();
        let full_key = namespaced(key);

        let entry = CacheEntry::new(data, self.clock.now(), ttl);
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(err) => {
                warn!(key, error = %err, "Failed to serialize cache entry");
                return;
            }
        };

        // Excludes the key being written
        let others = self
            .namespaced_keys()
            .into_iter()
            .filter(|existing| *existing != full_key)
            .count();
        if others >= self.max_entries {
            let evicted = self.evict_lru(self.max_entries - 1, Some(full_key.as_str()));
            debug!(evicted, "Evicted cache entries to make room");
        }

        match self.storage.set_item(&full_key, &json) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded) => {
                let live = self.namespaced_keys().len();
                let keep = (live / 2).min(live.saturating_sub(1));
                let evicted = self.evict_lru(keep, None);
                warn!(key, evicted, "Storage quota exceeded, evicted cache entries");

                if let Err(err) = self.storage.set_item(&full_key, &json) {
                    warn!(key, error = %err, "Dropping cache write after quota recovery");
                }
            }
            Err(err) => warn!(key, error = %err, "Failed to write to cache"),
        }
    }

    pub fn remove(&self, key: &str) {
        let _ops = self.lock();
        self.delete(&namespaced(key));
    }

    /// Delete every namespaced entry, leaving unrelated keys alone.
    pub fn clear(&self) {
        let _ops = self.lock();
        for key in self.namespaced_keys() {
            self.delete(&key);
        }
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        let _ops = self.lock();
        self.namespaced_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn namespaced_keys(&self) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|key| key.starts_with(CACHE_PREFIX))
                .collect(),
            Err(err) => {
                warn!(error = %err, "Failed to enumerate cache entries");
                Vec::new()
            }
        }
    }

    fn delete(&self, full_key: &str) {
        if let Err(err) = self.storage.remove_item(full_key) {
            warn!(key = full_key, error = %err, "Failed to remove from cache");
        }
    }

    /// Delete unreadable entries, then the least recently used ones until
    /// at most `keep` remain besides `spared`. Returns the number of deleted keys.
    fn evict_lru(&self, keep: usize, spared: Option<&str>) -> usize {
        let mut removed = 0;
        let mut live: Vec<(String, DateTime<Utc>)> = Vec::new();

        for key in self.namespaced_keys() {
            if spared == Some(key.as_str()) {
                continue;
            }

            let meta = self
                .storage
                .get_item(&key)
                .ok()
                .flatten()
                .and_then(|raw| serde_json::from_str::<EntryMeta>(&raw).ok());

            match meta {
                Some(meta) => live.push((key, meta.recency())),
                None => {
                    debug!(key = %key, "Removing unreadable cache entry");
                    self.delete(&key);
                    removed += 1;
                }
            }
        }

        live.sort_by_key(|(_, recency)| *recency);
        let excess = live.len().saturating_sub(keep);
        for (key, _) in live.into_iter().take(excess) {
            self.delete(&key);
            removed += 1;
        }

        removed
    }
}

fn namespaced(key: &str) -> String {
    format!("{}{}", CACHE_PREFIX, key)
}
