//! Upstream catalog transport
//!
//! This module provides the `Transport` abstraction used by the fetcher to
//! issue GET requests, and `HttpTransport`, its reqwest-backed implementation.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use thiserror::Error;

/// Default upstream request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised below the HTTP status level
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or body read failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failure from a non-reqwest transport
    #[error("Transport failure: {0}")]
    Other(String),
}

/// Status and body of an upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests to the upstream catalog
///
/// Implementations must be shareable across tasks. The fetcher holds one
/// behind an `Arc<dyn Transport>`, so tests can substitute a recording fake.
pub trait Transport: Send + Sync {
    /// Sends a GET request to `url` and returns the status and body
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<UpstreamResponse, TransportError>>;
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Returns
    /// * `Ok(HttpTransport)` - Every request is bounded by `timeout`
    /// * `Err(TransportError)` - If the HTTP client cannot be built (e.g. no TLS backend)
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("starship-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str) -> Result<UpstreamResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(UpstreamResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<UpstreamResponse, TransportError>> {
        Box::pin(self.send(url))
    }
}
