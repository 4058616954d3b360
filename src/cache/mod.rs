//! Cache module for storing filtered upstream results in memory
//!
//! This module provides the `Cache` abstraction the fetcher reads and writes,
//! the `CacheManager` that implements it, and `CacheKey`, which derives a
//! stable string key from the request parameters.

mod manager;

pub use manager::CacheManager;

use std::fmt;
use std::time::Duration;

/// Default time-to-live for cached results
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default bound on the number of cached results
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Key/value store with per-entry expiry
///
/// An entry must never be returned once its TTL has elapsed.
pub trait Cache<T>: Send + Sync {
    /// Returns the value for `key` if present and not expired
    fn get(&self, key: &str) -> Option<T>;

    /// Stores `value` under `key`, replacing any previous entry
    fn set(&self, key: &str, value: T, ttl: Duration);

    /// Number of live (non-expired) entries
    fn len(&self) -> usize;

    /// Whether there are no live entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops expired entries, returning how many were removed
    fn purge_expired(&self) -> usize;
}

/// Cache key for one `(manufacturer, page, limit)` combination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key from request parameters
    ///
    /// The manufacturer is trimmed and lower-cased, so `None`, `""` and
    /// `"  "` all map to the same key, as do differently-cased filters.
    pub fn new(manufacturer: Option<&str>, page: u32, limit: u32) -> Self {
        let manufacturer = manufacturer.map(|m| m.trim().to_lowercase()).unwrap_or_default();
        Self(format!(
            "starships:manufacturer={}:page={}:limit={}",
            manufacturer, page, limit
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
