//! Core data models for the starship proxy
//!
//! This module contains the types decoded from the upstream starship catalog
//! and the transport used to reach it.

pub mod swapi;

pub use swapi::{HttpTransport, Transport, TransportError, UpstreamResponse};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base URL of the public starship catalog
pub const DEFAULT_BASE_URL: &str = "https://swapi.dev/api/starships/";

/// A single starship record from the upstream catalog
///
/// Only `name` and `manufacturer` are interpreted. Every other upstream field
/// is kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Starship {
    /// Display name of the starship
    #[serde(default)]
    pub name: String,
    /// Manufacturer(s), as a comma separated string upstream
    #[serde(default)]
    pub manufacturer: String,
    /// Remaining upstream fields, passed through opaquely
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Starship {
    /// Creates a starship with no pass-through fields
    pub fn new(name: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
            extra: Map::new(),
        }
    }

    /// Returns true if the manufacturer contains `needle`, ignoring case
    ///
    /// `needle` is expected to be trimmed and lower-cased already.
    pub fn matches_manufacturer(&self, needle: &str) -> bool {
        self.manufacturer.to_lowercase().contains(needle)
    }
}

/// One page of the upstream catalog
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StarshipPage {
    /// Total number of starships upstream
    #[serde(default)]
    pub count: Option<u64>,
    /// URL of the next page, if any
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any
    #[serde(default)]
    pub previous: Option<String>,
    /// The starships on this page
    #[serde(default)]
    pub results: Option<Vec<Starship>>,
}

impl StarshipPage {
    /// Consumes the page, yielding its starships (empty if `results` was absent)
    pub fn into_starships(self) -> Vec<Starship> {
        self.results.unwrap_or_default()
    }

    /// Decodes a response body, degrading to an empty list
    ///
    /// A body that is not a valid page, or a page without `results`, is not
    /// an error: the caller simply sees no starships.
    pub fn decode_lenient(body: &str) -> Vec<Starship> {
        match serde_json::from_str::<StarshipPage>(body) {
            Ok(page) => {
                if page.results.is_none() {
                    tracing::warn!("Upstream page has no results field; treating as empty");
                }
                page.into_starships()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode upstream starship page; treating as empty");
                Vec::new()
            }
        }
    }
}
