//! Starship retrieval pipeline
//!
//! `StarshipFetcher` answers `(manufacturer, page, limit)` queries: it serves
//! cached results while they are fresh, otherwise fetches one upstream page,
//! filters it by manufacturer, truncates it to `limit` and caches the result.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, error};

use crate::cache::{Cache, CacheKey};
use crate::data::{Starship, StarshipPage, Transport};

/// Default page size when the caller does not give one
pub const DEFAULT_LIMIT: u32 = 10;

/// Message surfaced for failures that are not upstream errors
const UNEXPECTED_FAILURE_MESSAGE: &str = "An unexpected error occurred while processing starships";

/// Errors returned by `StarshipFetcher::fetch`
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a non-2xx status, or could not be reached at all
    #[error("Error fetching starships from the external API: {message}")]
    UpstreamUnavailable {
        /// Upstream status, absent for transport-level failures
        status: Option<u16>,
        /// Diagnostic detail
        message: String,
    },

    /// Anything else; the message is safe to show to clients
    #[error("{0}")]
    UnexpectedFailure(String),
}

/// Parameters of one starship lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarshipQuery {
    /// Case-insensitive manufacturer substring; blank means no filter
    pub manufacturer: Option<String>,
    /// Upstream page number, 1-based
    pub page: u32,
    /// Maximum number of starships returned
    pub limit: u32,
}

impl Default for StarshipQuery {
    fn default() -> Self {
        Self {
            manufacturer: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl StarshipQuery {
    pub fn new(manufacturer: Option<String>, page: u32, limit: u32) -> Self {
        Self {
            manufacturer,
            page,
            limit,
        }
    }

    /// Trimmed, lower-cased manufacturer filter, or `None` when blank
    pub fn normalized_manufacturer(&self) -> Option<String> {
        self.manufacturer
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_lowercase)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.manufacturer.as_deref(), self.page, self.limit)
    }
}

/// Keeps starships whose manufacturer contains the filter, then takes the first `limit`
///
/// Upstream order is preserved. With no filter every starship is kept.
pub fn filter_and_limit(starships: Vec<Starship>, manufacturer: Option<&str>, limit: u32) -> Vec<Starship> {
    starships
        .into_iter()
        .filter(|ship| manufacturer.map_or(true, |needle| ship.matches_manufacturer(needle)))
        .take(limit as usize)
        .collect()
}

/// Fetches, filters and caches starships from the upstream catalog
#[derive(Clone)]
pub struct StarshipFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn Cache<Vec<Starship>>>,
    base_url: String,
    ttl: Duration,
}

impl StarshipFetcher {
    /// Creates a fetcher over the given transport and cache
    ///
    /// # Arguments
    /// * `transport` - Issues the upstream GET requests
    /// * `cache` - Shared result cache, empty at startup
    /// * `base_url` - Catalog endpoint; `page` is appended as a query parameter
    /// * `ttl` - How long a cached result stays fresh
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn Cache<Vec<Starship>>>,
        base_url: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            transport,
            cache,
            base_url: base_url.into(),
            ttl,
        }
    }

    /// The cache this fetcher reads and writes
    pub fn cache(&self) -> &Arc<dyn Cache<Vec<Starship>>> {
        &self.cache
    }

    /// Returns the starships matching `query`
    ///
    /// # Returns
    /// * `Ok(Vec<Starship>)` - Possibly empty, at most `query.limit` long
    /// * `Err(FetchError::UpstreamUnavailable)` - Upstream failed or was unreachable
    /// * `Err(FetchError::UnexpectedFailure)` - Any other failure
    ///
    /// # Behavior
    /// - A fresh cache entry for the query is returned without any upstream call
    /// - Otherwise exactly one upstream request is made for `query.page`
    /// - An undecodable body or missing `results` yields an empty list
    /// - The cache is written only once the whole pipeline has completed, so
    ///   dropping this future part way leaves the cache untouched
    /// - No retries
    pub async fn fetch(&self, query: &StarshipQuery) -> Result<Vec<Starship>, FetchError> {
        let key = query.cache_key();

        if let Some(cached) = self.cache.get(key.as_str()) {
            debug!(key = %key, count = cached.len(), "Starship cache hit");
            return Ok(cached);
        }
        debug!(key = %key, "Starship cache miss");

        let url = self.page_url(query.page)?;
        let response = match self.transport.get(url.as_str()).await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %url, error = %e, "HTTP request error occurred while fetching starships");
                return Err(FetchError::UpstreamUnavailable {
                    status: None,
                    message: e.to_string(),
                });
            }
        };

        if !response.is_success() {
            error!(
                url = %url,
                status = response.status,
                "HTTP request error occurred while fetching starships"
            );
            return Err(FetchError::UpstreamUnavailable {
                status: Some(response.status),
                message: format!("upstream responded with status {}", response.status),
            });
        }

        let starships = StarshipPage::decode_lenient(&response.body);
        let upstream_count = starships.len();
        let manufacturer = query.normalized_manufacturer();
        let result = filter_and_limit(starships, manufacturer.as_deref(), query.limit);

        debug!(
            key = %key,
            upstream = upstream_count,
            returned = result.len(),
            "Fetched starships from upstream"
        );

        self.cache.set(key.as_str(), result.clone(), self.ttl);
        Ok(result)
    }

    /// Builds the upstream URL for `page`
    fn page_url(&self, page: u32) -> Result<Url, FetchError> {
        Url::parse_with_params(&self.base_url, &[("page", page.to_string())]).map_err(|e| {
            error!(base_url = %self.base_url, error = %e, "Invalid upstream base URL");
            FetchError::UnexpectedFailure(UNEXPECTED_FAILURE_MESSAGE.to_string())
        })
    }
}
