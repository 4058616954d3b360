//! HTTP request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::AppState;
use crate::fetcher::{FetchError, StarshipQuery, DEFAULT_LIMIT};

const UPSTREAM_ERROR_MESSAGE: &str =
    "Error fetching starships from the external API. Please try again later.";
const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Query string of `GET /api/starships`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StarshipParams {
    pub manufacturer: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl StarshipParams {
    /// Applies defaults and rejects zero page or limit
    pub fn into_query(self) -> Result<StarshipQuery, String> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err("page must be at least 1".to_string());
        }
        if limit == 0 {
            return Err("limit must be at least 1".to_string());
        }
        Ok(StarshipQuery::new(self.manufacturer, page, limit))
    }
}

/// `GET /api/starships`
///
/// 200 with a JSON array, 204 when nothing matches, 502 when the upstream
/// catalog fails, 500 for anything else.
pub async fn list_starships(
    State(state): State<AppState>,
    Query(params): Query<StarshipParams>,
) -> Response {
    let query = match params.into_query() {
        Ok(query) => query,
        Err(message) => return (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response(),
    };

    match state.fetcher.fetch(&query).await {
        Ok(starships) if starships.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(starships) => Json(starships).into_response(),
        Err(FetchError::UpstreamUnavailable { status, message }) => {
            warn!(?status, page = query.page, "Responding 502 for upstream failure");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::new(UPSTREAM_ERROR_MESSAGE).with_details(message)),
            )
                .into_response()
        }
        Err(FetchError::UnexpectedFailure(message)) => {
            error!(page = query.page, "Responding 500 for unexpected failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(UNEXPECTED_ERROR_MESSAGE).with_details(message)),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "cached_entries": state.fetcher.cache().len(),
    }))
}
