use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use pgscout_core::{ListingRecord, Query, ScrapeOptions};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    export::render_csv, launch_surface, parse_body, release_surface, require_query, ApiError,
    AppState,
};

const CSV_FILENAME: &str = "pg-results.csv";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScrapeRequest {
    pub category: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub limit_companies: Option<usize>,
    pub max_pages: Option<usize>,
    pub use_synonyms: Option<bool>,
    pub limit_syn: Option<usize>,
}

impl ScrapeRequest {
    fn options(&self) -> ScrapeOptions {
        let defaults = ScrapeOptions::default();
        ScrapeOptions {
            limit_companies: self.limit_companies.unwrap_or(defaults.limit_companies),
            max_pages: self.max_pages.unwrap_or(defaults.max_pages),
            use_synonyms: self.use_synonyms.unwrap_or(defaults.use_synonyms),
            limit_syn: self.limit_syn.unwrap_or(defaults.limit_syn),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeResponse {
    category: String,
    city: String,
    region: String,
    total: usize,
    items: Vec<ListingRecord>,
}

/// Shared by the JSON and CSV routes: validate, launch, scrape, always close.
async fn run_scrape(
    state: &AppState,
    req_id: &RequestId,
    body: &Bytes,
) -> Result<(Query, Vec<ListingRecord>), ApiError> {
    let request: ScrapeRequest = parse_body(body)?;
    let query = require_query(
        request.category.as_deref(),
        request.city.as_deref(),
        request.region.as_deref(),
    )?;
    let options = request.options();

    let mut surface = launch_surface(state, &req_id.0).await?;
    let result = state.scout.scrape(surface.as_mut(), &query, options).await;
    release_surface(surface, &req_id.0).await;

    match result {
        Ok(items) => {
            tracing::info!(
                request_id = %req_id.0,
                category = %query.category,
                total = items.len(),
                "scrape finished"
            );
            Ok((query, items))
        }
        Err(e) => {
            tracing::error!(request_id = %req_id.0, category = %query.category, error = %e, "scrape failed");
            Err(ApiError::from(e))
        }
    }
}

pub(super) async fn scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let (query, items) = run_scrape(&state, &req_id, &body).await?;

    Ok(Json(ScrapeResponse {
        category: query.category,
        city: query.city,
        region: query.region,
        total: items.len(),
        items,
    }))
}

pub(super) async fn scrape_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (query, items) = run_scrape(&state, &req_id, &body).await?;

    let csv = render_csv(&query.category, &items).map_err(|e| {
        tracing::error!(request_id = %req_id.0, error = %e, "csv rendering failed");
        ApiError::internal(e.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
