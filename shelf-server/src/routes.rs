use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::CACHE_CONTROL, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shelf_core::{config::ServerConfig, Shelf, ShelfPayload};
use tracing::{info, warn};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ShelfQuery {
    shelf: Option<String>,
    limit: Option<String>,
}

/// Absent, empty or non-numeric limits use the default; the rest are
/// clamped to `[1, max_limit]`.
pub fn clamp_limit(raw: Option<&str>, config: &ServerConfig) -> usize {
    let parsed = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite());

    match parsed {
        Some(value) => value.clamp(1.0, config.max_limit.max(1) as f64) as usize,
        None => config.default_limit,
    }
}

pub fn parse_shelf(raw: Option<&str>) -> Result<Shelf, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Shelf::default()),
        Some(slug) => slug.parse::<Shelf>().map_err(ApiError::from),
    }
}

pub async fn goodreads_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShelfQuery>,
) -> Result<Response, ApiError> {
    let shelf = parse_shelf(query.shelf.as_deref())?;
    let limit = clamp_limit(query.limit.as_deref(), &state.config.server);

    let mut books = state
        .feed
        .fetch_shelf(shelf, limit, Some(state.config.server.max_page_size))
        .await
        .map_err(|e| {
            warn!(%shelf, error = %e, "failed to load shelf from Goodreads");
            ApiError::from(e)
        })?;
    books.truncate(limit);
    info!(%shelf, limit, books = books.len(), "serving shelf");

    let payload = ShelfPayload {
        shelf,
        fetched_at: Utc::now().timestamp_millis(),
        books,
    };
    let cache = format!("public, max-age={}", state.config.server.cache_max_age_seconds);

    Ok((StatusCode::OK, [(CACHE_CONTROL, cache)], Json(payload)).into_response())
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
