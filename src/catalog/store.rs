//! Time-and-size bounded storage for resolved catalog records.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::entities::ExternalPlaceRecord;

use super::config::CatalogCacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "catalog::store";

pub const METRIC_CACHE_HIT: &str = "tripwise_catalog_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "tripwise_catalog_cache_miss_total";
pub const METRIC_CACHE_EVICT: &str = "tripwise_catalog_cache_evict_total";
pub const METRIC_CACHE_EXPIRED: &str = "tripwise_catalog_cache_expired_total";

struct CacheEntry {
    record: ExternalPlaceRecord,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Catalog records keyed by external id.
///
/// The inner `LruCache` is unbounded; capacity is enforced by [`PlaceStore::insert`]
/// after expired entries are dropped, so a stale entry never pushes out a live one.
pub struct PlaceStore {
    ttl: Duration,
    max_entries: NonZeroUsize,
    entries: Mutex<LruCache<i64, CacheEntry>>,
}

impl PlaceStore {
    pub fn new(config: &CatalogCacheConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_entries: config.max_entries_non_zero(),
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Look up a live record and mark it most recently used.
    pub fn get(&self, external_id: i64) -> Option<ExternalPlaceRecord> {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");

        let expired = match entries.peek(&external_id) {
            Some(entry) => entry.is_expired(now),
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                return None;
            }
        };

        if expired {
            entries.pop(&external_id);
            counter!(METRIC_CACHE_EXPIRED).increment(1);
            counter!(METRIC_CACHE_MISS).increment(1);
            return None;
        }

        counter!(METRIC_CACHE_HIT).increment(1);
        entries.get(&external_id).map(|entry| entry.record.clone())
    }

    /// Store a record, then evict. Returns how many entries were dropped.
    pub fn insert(&self, record: ExternalPlaceRecord) -> usize {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "insert");

        if !self.ttl.is_zero() {
            let entry = CacheEntry {
                expires_at: now + self.ttl,
                record,
            };
            entries.put(entry.record.external_id, entry);
        }

        self.evict_locked(&mut entries, now)
    }

    fn evict_locked(&self, entries: &mut LruCache<i64, CacheEntry>, now: Instant) -> usize {
        let expired: Vec<i64> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            entries.pop(id);
        }

        let mut evicted = 0;
        while entries.len() > self.max_entries.get() {
            if entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }

        if !expired.is_empty() {
            counter!(METRIC_CACHE_EXPIRED).increment(expired.len() as u64);
        }
        if evicted > 0 {
            counter!(METRIC_CACHE_EVICT).increment(evicted as u64);
            debug!(
                target = "catalog::store",
                evicted,
                len = entries.len(),
                "evicted least recently used catalog records"
            );
        }

        expired.len() + evicted
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn record(external_id: i64, title: &str) -> ExternalPlaceRecord {
        ExternalPlaceRecord {
            external_id,
            title: Some(title.to_string()),
        }
    }

    fn store(ttl_seconds: u64, max_entries: usize) -> PlaceStore {
        PlaceStore::new(&CatalogCacheConfig {
            enabled: true,
            ttl_seconds,
            max_entries,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn entry_lives_until_ttl_boundary() {
        let store = store(60, 8);
        store.insert(record(10, "Vase"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get(10), Some(record(10, "Vase")));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get(10), None);
        assert!(store.is_empty());
    }

    #[test]
    fn lru_eviction_drops_least_recently_touched() {
        let store = store(300, 2);
        store.insert(record(1, "one"));
        store.insert(record(2, "two"));

        assert_eq!(store.insert(record(3, "three")), 1);

        assert!(store.get(1).is_none());
        assert!(store.get(2).is_some());
        assert!(store.get(3).is_some());
    }

    #[test]
    fn lookup_protects_entry_from_eviction() {
        let store = store(300, 2);
        store.insert(record(1, "one"));
        store.insert(record(2, "two"));

        assert!(store.get(1).is_some());
        store.insert(record(3, "three"));

        assert!(store.get(1).is_some());
        assert!(store.get(2).is_none());
        assert!(store.get(3).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_go_before_live_ones() {
        let store = store(10, 2);
        store.insert(record(1, "old"));
        tokio::time::advance(Duration::from_secs(5)).await;
        store.insert(record(2, "fresh"));
        tokio::time::advance(Duration::from_secs(6)).await;

        // Record 1 has expired, so inserting 3 leaves 2 in place.
        store.insert(record(3, "newest"));
        assert_eq!(store.len(), 2);
        assert!(store.get(2).is_some());
        assert!(store.get(3).is_some());
    }

    #[test]
    fn reinsert_replaces_record() {
        let store = store(300, 4);
        store.insert(record(5, "before"));
        store.insert(record(5, "after"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(5), Some(record(5, "after")));
    }

    #[test]
    fn zero_ttl_stores_nothing() {
        let store = store(0, 4);
        assert_eq!(store.insert(record(1, "one")), 0);
        assert!(store.get(1).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn clear_empties_store() {
        let store = store(300, 4);
        store.insert(record(1, "one"));
        store.insert(record(2, "two"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = store(300, 4);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.lock().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        store.insert(record(1, "one"));
        assert!(store.get(1).is_some());
    }
}
