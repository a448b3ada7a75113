// src/http/error.rs
// Shared error body shape (spec.md SS7): {"error": "<kind>", "detail": "<text>"}.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

pub struct ApiError {
    pub status: StatusCode,
    pub kind: String,
    pub detail: String,
}

impl ApiError {
    pub fn not_found(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: kind.into(),
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal".to_string(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
