use axum::{body::Bytes, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{launch_surface, parse_body, release_surface, require_query, ApiError, AppState};

const DEFAULT_LIMIT: usize = 12;

#[derive(Debug, Default, Deserialize)]
pub(super) struct SynonymsRequest {
    pub category: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct SynonymsResponse {
    category: String,
    city: String,
    region: String,
    count: usize,
    synonyms: Vec<String>,
}

pub(super) async fn synonyms(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<SynonymsResponse>, ApiError> {
    let request: SynonymsRequest = parse_body(&body)?;
    let query = require_query(
        request.category.as_deref(),
        request.city.as_deref(),
        request.region.as_deref(),
    )?;
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);

    let mut surface = launch_surface(&state, &req_id.0).await?;
    let result = state.scout.synonyms(surface.as_mut(), &query, limit).await;
    release_surface(surface, &req_id.0).await;

    let synonyms = result.map_err(|e| {
        tracing::error!(request_id = %req_id.0, category = %query.category, error = %e, "synonyms failed");
        ApiError::from(e)
    })?;

    Ok(Json(SynonymsResponse {
        count: synonyms.len(),
        category: query.category,
        city: query.city,
        region: query.region,
        synonyms,
    }))
}
