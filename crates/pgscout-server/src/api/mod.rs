mod export;
mod scrape;
mod synonyms;

use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pgscout_core::Query;
use pgscout_scraper::{BrowsingSurface, Scout, ScraperError, SurfaceLauncher};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    /// Starts one isolated browser per request.
    pub launcher: Arc<dyn SurfaceLauncher>,
    pub scout: Arc<Scout>,
}

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

impl From<ScraperError> for ApiError {
    fn from(error: ScraperError) -> Self {
        Self::internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Decodes a JSON request body; an empty body reads as `{}`.
pub(super) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

pub(super) fn require_query(
    category: Option<&str>,
    city: Option<&str>,
    region: Option<&str>,
) -> Result<Query, ApiError> {
    Query::new(category.unwrap_or_default(), city, region)
        .ok_or_else(|| ApiError::bad_request("category is required"))
}

pub(super) async fn launch_surface(
    state: &AppState,
    request_id: &str,
) -> Result<Box<dyn BrowsingSurface>, ApiError> {
    state.launcher.launch().await.map_err(|e| {
        tracing::error!(request_id, error = %e, "browser launch failed");
        ApiError::internal(e.to_string())
    })
}

/// Closes the surface; a failed close is logged and otherwise ignored.
pub(super) async fn release_surface(mut surface: Box<dyn BrowsingSurface>, request_id: &str) {
    if let Err(e) = surface.close().await {
        tracing::warn!(request_id, error = %e, "browser close failed");
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/synonyms", post(synonyms::synonyms))
        .route("/scrape", post(scrape::scrape))
        .route("/scrape-csv", post(scrape::scrape_csv))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
