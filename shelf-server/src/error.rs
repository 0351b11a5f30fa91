use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shelf_core::{ErrorPayload, ShelfError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unknown shelf `{0}`. Use currently-reading, read or to-read.")]
    InvalidShelf(String),

    #[error("Goodreads returned an unexpected response.")]
    Upstream(u16),

    #[error("Goodreads sent a feed we could not read.")]
    Parse(String),

    #[error("Could not reach Goodreads right now. Please try again shortly.")]
    Unreachable(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidShelf(_) => "invalid_shelf",
            ApiError::Upstream(_) => "goodreads_unavailable",
            ApiError::Parse(_) => "goodreads_parse_failed",
            ApiError::Unreachable(_) => "goodreads_fetch_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidShelf(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(404) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Parse(_) | ApiError::Unreachable(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<ShelfError> for ApiError {
    fn from(err: ShelfError) -> Self {
        match err {
            ShelfError::UpstreamStatus(code) => ApiError::Upstream(code),
            ShelfError::MalformedFeed(detail) => ApiError::Parse(detail),
            ShelfError::UnknownShelf(slug) => ApiError::InvalidShelf(slug),
            other => ApiError::Unreachable(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = ErrorPayload {
            error: self.code().to_owned(),
            message: self.to_string(),
        };
        (self.status(), Json(payload)).into_response()
    }
}
