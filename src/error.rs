use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced to API clients. Every variant maps to a status code plus
/// a small JSON body the admin UI shows as a dismissible toast.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cue not found")]
    NotFound,
    #[error("not authenticated")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("live control is unavailable")]
    ControlUnavailable,
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::InvalidCue(e) => ApiError::Validation(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ControlUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
