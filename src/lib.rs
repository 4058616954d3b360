//! Starship proxy library
//!
//! Fetches starships from the public Star Wars catalog, filters them by
//! manufacturer, caches each result for a fixed interval and serves them
//! over HTTP.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod fetcher;
pub mod sweeper;
pub mod web;

pub use fetcher::{FetchError, StarshipFetcher, StarshipQuery};
