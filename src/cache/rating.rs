//! Persistent, time-bounded rating cache with negative-result tombstones.
//!
//! [`RatingCache`] maps a normalized title to either a resolved
//! [`RatingResult`] or a "missing" tombstone, so titles known to have no
//! rating never hit the providers again until the entry expires.
//!
//! # Expiry
//!
//! Entries carry their wall-clock creation time (unix millis) so the TTL
//! survives restarts. Expiry is lazy: an expired entry reads as absent and
//! is overwritten by the next write for that title. Flushes leave expired
//! entries out of the persisted blob.
//!
//! # Durability
//!
//! The in-memory view (an unbounded moka cache) is authoritative. Entries
//! leave it only by expiring or through [`RatingCache::clear`]. It is written
//! to the [`KeyValueStore`] every `flush_every` writes and on explicit
//! [`RatingCache::flush`]. A crash may lose the last few writes. Storage
//! failures are logged and never fail the caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use moka::Expiry;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::telemetry;
use crate::title::TitleKey;
use crate::types::RatingResult;
use crate::Result;

/// Store key under which the cache blob is persisted.
pub const CACHE_STORE_KEY: &str = "ratingCache";

/// Default lifetime of a cache entry: 7 days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Configuration for the rating cache.
///
/// ```rust
/// # use marquee::cache::RatingCacheConfig;
/// # use std::time::Duration;
/// let config = RatingCacheConfig::new()
///     .missing_ttl(Duration::from_secs(24 * 3600))
///     .flush_every(25);
/// ```
#[derive(Debug, Clone)]
pub struct RatingCacheConfig {
    /// Lifetime of found entries. Default: 7 days.
    pub ttl: Duration,
    /// Lifetime of "missing" tombstones. Default: 7 days.
    pub missing_ttl: Duration,
    /// Persist after this many writes. Default: 10. 0 disables
    /// write-triggered flushes.
    pub flush_every: u64,
}

impl Default for RatingCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            missing_ttl: DEFAULT_TTL,
            flush_every: 10,
        }
    }
}

impl RatingCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn missing_ttl(mut self, ttl: Duration) -> Self {
        self.missing_ttl = ttl;
        self
    }

    pub fn flush_every(mut self, n: u64) -> Self {
        self.flush_every = n;
        self
    }
}

/// One cached resolution. `is_missing` is true exactly when `result` is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    result: Option<RatingResult>,
    is_missing: bool,
    created_at: u64,
}

impl CacheEntry {
    pub fn found(result: RatingResult, created_at: u64) -> Self {
        Self {
            result: Some(result),
            is_missing: false,
            created_at,
        }
    }

    pub fn missing(created_at: u64) -> Self {
        Self {
            result: None,
            is_missing: true,
            created_at,
        }
    }

    pub fn result(&self) -> Option<&RatingResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<RatingResult> {
        self.result
    }

    pub fn is_missing(&self) -> bool {
        self.is_missing
    }

    /// Creation time in unix milliseconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    fn is_consistent(&self) -> bool {
        self.is_missing == self.result.is_none()
    }
}

/// Title → rating/tombstone cache backed by a durable store.
pub struct RatingCache {
    entries: Cache<TitleKey, CacheEntry>,
    store: Arc<dyn KeyValueStore>,
    config: RatingCacheConfig,
    writes: AtomicU64,
    /// Serializes snapshots and their writes, so the store only ever moves
    /// forward.
    persist_lock: tokio::sync::Mutex<()>,
}

impl RatingCache {
    /// Create an empty cache that persists to `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: RatingCacheConfig) -> Self {
        Self {
            entries: Cache::builder()
                .expire_after(EntryExpiry {
                    ttl: config.ttl,
                    missing_ttl: config.missing_ttl,
                })
                .build(),
            store,
            config,
            writes: AtomicU64::new(0),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a cache seeded from whatever `store` holds.
    ///
    /// A missing blob gives an empty cache. An unreadable blob, or one that is
    /// not a JSON object, is logged and also gives an empty cache. Entries
    /// that fail to parse, entries whose `isMissing` flag disagrees with
    /// their result, and already expired entries are dropped one by one.
    pub async fn load(store: Arc<dyn KeyValueStore>, config: RatingCacheConfig) -> Self {
        let cache = Self::new(store, config);
        let blob = match cache.store.get(CACHE_STORE_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return cache,
            Err(e) => {
                warn!(error = %e, "failed to read persisted rating cache");
                return cache;
            }
        };
        let persisted: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&blob) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "corrupt persisted rating cache, starting empty");
                return cache;
            }
        };

        let now = now_millis();
        let mut loaded = 0usize;
        for (title, raw) in persisted {
            let entry: CacheEntry = match serde_json::from_value(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(title = %title, error = %e, "dropping unreadable cache entry");
                    continue;
                }
            };
            if !entry.is_consistent() {
                warn!(title = %title, "dropping inconsistent cache entry");
                continue;
            }
            if cache.is_expired(&entry, now) {
                continue;
            }
            cache.entries.insert(TitleKey::new(&title), entry);
            loaded += 1;
        }
        debug!(entries = loaded, "loaded rating cache");
        cache
    }

    /// Look up a live entry for `title`.
    pub fn get(&self, title: &str) -> Option<CacheEntry> {
        self.get_by_key(&TitleKey::new(title))
    }

    pub(crate) fn get_by_key(&self, key: &TitleKey) -> Option<CacheEntry> {
        match self.entries.get(key) {
            Some(entry) if !self.is_expired(&entry, now_millis()) => {
                let kind = if entry.is_missing { "missing" } else { "found" };
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "kind" => kind).increment(1);
                Some(entry)
            }
            _ => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Record a resolved rating.
    pub async fn put_found(&self, title: &str, result: RatingResult) {
        self.put(title, CacheEntry::found(result, now_millis()))
            .await;
    }

    /// Record that no rating exists for `title`.
    pub async fn put_missing(&self, title: &str) {
        self.put(title, CacheEntry::missing(now_millis())).await;
    }

    async fn put(&self, title: &str, entry: CacheEntry) {
        self.entries.insert(TitleKey::new(title), entry);
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.flush_every > 0 && writes % self.config.flush_every == 0 {
            self.flush().await;
        }
    }

    /// Persist the live entries. Failures are logged, not returned.
    pub async fn flush(&self) {
        if let Err(e) = self.persist().await {
            metrics::counter!(telemetry::CACHE_FLUSH_FAILURES_TOTAL).increment(1);
            warn!(error = %e, "failed to persist rating cache");
        }
    }

    /// Persist the live entries, returning any storage error.
    pub async fn try_flush(&self) -> Result<()> {
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let now = now_millis();
        let snapshot: BTreeMap<String, CacheEntry> = self
            .entries
            .iter()
            .filter(|(_, entry)| !self.is_expired(entry, now))
            .map(|(key, entry)| (key.as_str().to_string(), entry))
            .collect();
        let blob = serde_json::to_string(&snapshot)?;
        self.store.set(CACHE_STORE_KEY, &blob).await?;
        debug!(entries = snapshot.len(), "persisted rating cache");
        Ok(())
    }

    /// Drop every entry, in memory and in the store.
    pub async fn clear(&self) {
        let _guard = self.persist_lock.lock().await;
        self.entries.invalidate_all();
        if let Err(e) = self.store.set(CACHE_STORE_KEY, "{}").await {
            warn!(error = %e, "failed to clear persisted rating cache");
        }
    }

    /// Number of entries held in memory, expired ones included.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &RatingCacheConfig {
        &self.config
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        let ttl = if entry.is_missing {
            self.config.missing_ttl
        } else {
            self.config.ttl
        };
        let age = Duration::from_millis(now.saturating_sub(entry.created_at));
        age >= ttl
    }
}

/// Longest delay handed to moka; entries living longer still read as live
/// until their own TTL says otherwise.
const MAX_EVICTION_DELAY: Duration = Duration::from_secs(365 * 24 * 3600);

/// Evicts an entry once its own TTL, measured from `createdAt`, has run out.
/// There is no size bound.
struct EntryExpiry {
    ttl: Duration,
    missing_ttl: Duration,
}

impl EntryExpiry {
    fn remaining(&self, entry: &CacheEntry) -> Option<Duration> {
        let ttl = if entry.is_missing {
            self.missing_ttl
        } else {
            self.ttl
        };
        let age = Duration::from_millis(now_millis().saturating_sub(entry.created_at));
        Some(ttl.saturating_sub(age).min(MAX_EVICTION_DELAY))
    }
}

impl Expiry<TitleKey, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &TitleKey,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.remaining(entry)
    }

    fn expire_after_update(
        &self,
        _key: &TitleKey,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.remaining(entry)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
