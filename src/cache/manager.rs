//! In-memory cache manager with per-entry expiry
//!
//! Provides a `CacheManager` that keeps cloned values in a shared map with
//! expiry timestamps. Expired entries are never returned; they are dropped on
//! lookup or by `purge_expired`. The map is bounded: inserting a new key into
//! a full cache first drops expired entries, then the oldest one.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{Cache, DEFAULT_MAX_ENTRIES};

/// Wrapper struct for a cached value
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached; the oldest entry is evicted first
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T, now: DateTime<Utc>, ttl: std::time::Duration) -> Self {
        // A TTL too large for chrono saturates to the far future.
        let expires_at = Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            data,
            cached_at: now,
            expires_at,
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide store of cached values keyed by string
///
/// Starts empty and lives as long as its owner; nothing is persisted. Reads
/// and writes may come from any number of tasks. Concurrent writes to the
/// same key are last-writer-wins. At most `max_entries` entries are held.
#[derive(Debug)]
pub struct CacheManager<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    max_entries: usize,
}

impl<T> Default for CacheManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheManager<T> {
    /// Creates an empty cache holding up to `DEFAULT_MAX_ENTRIES` entries
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Creates an empty cache holding up to `max_entries` entries
    ///
    /// A capacity of zero stores nothing.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Maximum number of entries held at once
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl<T: Clone> CacheManager<T> {
    /// Reads a value as of `now`, removing it if it has expired
    fn read_at(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if !entry.is_expired_at(now) => return Some(entry.data.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock; another task may have refreshed it.
        if let Some(entry) = entries.get(key) {
            if !entry.is_expired_at(now) {
                return Some(entry.data.clone());
            }
            entries.remove(key);
        }
        None
    }

    fn write_at(&self, key: &str, data: T, ttl: std::time::Duration, now: DateTime<Utc>) {
        if self.max_entries == 0 {
            return;
        }

        let entry = CacheEntry::new(data, now, ttl);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !entry.is_expired_at(now));
            while entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.cached_at)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(oldest) => {
                        entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        entries.insert(key.to_string(), entry);
    }

    fn purge_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

impl<T> Cache<T> for CacheManager<T>
where
    T: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<T> {
        self.read_at(key, Utc::now())
    }

    fn set(&self, key: &str, value: T, ttl: std::time::Duration) {
        self.write_at(key, value, ttl, Utc::now());
    }

    fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    fn purge_expired(&self) -> usize {
        self.purge_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    #[derive(Debug, Clone, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn data(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    const TEN_MINUTES: StdDuration = StdDuration::from_secs(600);

    #[test]
    fn test_read_returns_none_for_missing_key() {
        let cache: CacheManager<TestData> = CacheManager::new();

        assert!(cache.get("nonexistent_key").is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_read_returns_fresh_data() {
        let cache = CacheManager::new();
        let fresh = data("fresh", 100);

        cache.set("fresh_key", fresh.clone(), TEN_MINUTES);

        assert_eq!(cache.get("fresh_key"), Some(fresh));
    }

    #[test]
    fn test_entry_is_absent_at_exact_expiry() {
        let cache = CacheManager::new();
        let t0 = Utc::now();

        cache.write_at("k", data("a", 1), TEN_MINUTES, t0);

        let just_before = t0 + Duration::seconds(599);
        let at_expiry = t0 + Duration::seconds(600);
        assert!(cache.read_at("k", just_before).is_some());
        assert!(cache.read_at("k", at_expiry).is_none(), "Entry must be absent at T + TTL");
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let cache = CacheManager::new();
        let t0 = Utc::now();
        cache.write_at("k", data("a", 1), TEN_MINUTES, t0);

        assert!(cache.read_at("k", t0 + Duration::minutes(11)).is_none());

        // Even reading "in the past" must not resurrect it.
        assert!(cache.read_at("k", t0).is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = CacheManager::new();

        cache.set("expired_key", data("expired", 0), StdDuration::ZERO);

        assert!(cache.get("expired_key").is_none(), "Cache with 0 TTL should be expired");
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let cache = CacheManager::new();

        cache.set("forever", data("forever", 1), StdDuration::MAX);

        assert!(cache.get("forever").is_some());
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let cache = CacheManager::new();

        cache.set("overwrite_key", data("first", 1), TEN_MINUTES);
        cache.set("overwrite_key", data("second", 2), TEN_MINUTES);

        assert_eq!(cache.get("overwrite_key"), Some(data("second", 2)), "Cache should contain latest data");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_removes_only_expired() {
        let cache = CacheManager::new();
        let t0 = Utc::now();
        cache.write_at("old", data("old", 1), StdDuration::from_secs(60), t0);
        cache.write_at("new", data("new", 2), TEN_MINUTES, t0);

        let removed = cache.purge_at(t0 + Duration::minutes(5));

        assert_eq!(removed, 1);
        assert!(cache.read_at("old", t0).is_none());
        assert!(cache.read_at("new", t0).is_some());
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let cache: Arc<CacheManager<TestData>> = Arc::new(CacheManager::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let key = format!("key_{}", j % 10);
                        cache.set(&key, data("w", i), TEN_MINUTES);
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Worker thread should not panic");
        }

        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_distinct_keys_are_bounded_by_capacity() {
        let cache = CacheManager::with_capacity(100);

        for i in 0..5000 {
            cache.set(&format!("starships:manufacturer=m{}:page=1:limit=10", i), data("d", i), TEN_MINUTES);
        }

        assert_eq!(cache.len(), 100);
        assert!(cache.entries.read().unwrap().len() <= 100);
        // The most recent write always survives.
        assert!(cache.get("starships:manufacturer=m4999:page=1:limit=10").is_some());
    }

    #[test]
    fn test_full_cache_evicts_oldest_entry() {
        let cache = CacheManager::with_capacity(2);
        let t0 = Utc::now();
        cache.write_at("first", data("a", 1), TEN_MINUTES, t0);
        cache.write_at("second", data("b", 2), TEN_MINUTES, t0 + Duration::seconds(1));

        cache.write_at("third", data("c", 3), TEN_MINUTES, t0 + Duration::seconds(2));

        let now = t0 + Duration::seconds(3);
        assert!(cache.read_at("first", now).is_none(), "Oldest entry should be evicted");
        assert!(cache.read_at("second", now).is_some());
        assert!(cache.read_at("third", now).is_some());
    }

    #[test]
    fn test_full_cache_evicts_expired_before_oldest() {
        let cache = CacheManager::with_capacity(2);
        let t0 = Utc::now();
        cache.write_at("old_but_fresh", data("a", 1), TEN_MINUTES, t0);
        cache.write_at("short_lived", data("b", 2), StdDuration::from_secs(1), t0 + Duration::seconds(1));

        cache.write_at("new", data("c", 3), TEN_MINUTES, t0 + Duration::seconds(5));

        let now = t0 + Duration::seconds(6);
        assert!(cache.read_at("old_but_fresh", now).is_some(), "Live entry should survive");
        assert!(cache.read_at("new", now).is_some());
        assert_eq!(cache.entries.read().unwrap().len(), 2);
    }

    #[test]
    fn test_overwrite_in_full_cache_evicts_nothing() {
        let cache = CacheManager::with_capacity(2);

        cache.set("a", data("a", 1), TEN_MINUTES);
        cache.set("b", data("b", 2), TEN_MINUTES);
        cache.set("a", data("a", 3), TEN_MINUTES);

        assert_eq!(cache.get("a"), Some(data("a", 3)));
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = CacheManager::with_capacity(0);

        cache.set("k", data("a", 1), TEN_MINUTES);

        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }
}
