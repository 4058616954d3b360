//! Web layer module
//!
//! This module exposes the starship fetcher over HTTP. Handlers are thin:
//! they parse query parameters, call `StarshipFetcher::fetch` and map the
//! outcome to a status code.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::{JwtConfig, ServerConfig};
use crate::fetcher::StarshipFetcher;

pub mod auth;
pub mod handlers;

pub use handlers::{ErrorBody, StarshipParams};

pub use auth::JwtAuth;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub fetcher: StarshipFetcher,
    /// Bearer token validator; `None` disables authentication
    pub auth: Option<Arc<JwtAuth>>,
}

impl AppState {
    /// Builds state; a missing or empty JWT key disables authentication
    pub fn new(fetcher: StarshipFetcher, jwt: Option<&JwtConfig>) -> Self {
        Self {
            fetcher,
            auth: jwt
                .filter(|jwt| !jwt.key.is_empty())
                .map(|jwt| Arc::new(JwtAuth::new(jwt))),
        }
    }
}

/// Builds the application router
///
/// `/api/starships` sits behind the JWT check; `/health` does not.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/api/starships", get(handlers::list_starships))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// CORS restricted to the configured origins, GET only
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(config: &ServerConfig, fetcher: StarshipFetcher) -> Self {
        let state = AppState::new(fetcher, config.jwt.as_ref());
        match config.jwt.as_ref().filter(|_| state.auth.is_some()) {
            Some(jwt) => info!(issuer = %jwt.issuer, audience = %jwt.audience, "JWT authentication enabled"),
            None => warn!("No JWT key configured; /api/starships is unauthenticated"),
        }

        Self {
            app: router(state, &config.cors_origins),
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Binds and serves until Ctrl-C
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        info!(addr = %listener.local_addr()?, "Web server listening");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
