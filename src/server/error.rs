//! HTTP error envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// An error returned to HTTP callers as
/// `{"error": true, "status_code", "detail", "timestamp", "path"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    path: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: bool,
    status_code: u16,
    detail: String,
    timestamp: DateTime<Utc>,
    path: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>, uri: &Uri) -> Self {
        Self {
            status,
            detail: detail.into(),
            path: uri.path().to_string(),
        }
    }

    pub fn not_found(uri: &Uri) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", uri)
    }

    /// A request body that failed to parse or validate.
    ///
    /// Well-formed JSON with missing or mistyped fields yields 422.
    pub fn rejected(rejection: JsonRejection, uri: &Uri) -> Self {
        Self::new(rejection.status(), rejection.body_text(), uri)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = self.status.as_u16(), path = %self.path, detail = %self.detail, "request failed");
        let envelope = ErrorEnvelope {
            error: true,
            status_code: self.status.as_u16(),
            detail: self.detail,
            timestamp: Utc::now(),
            path: self.path,
        };
        (self.status, Json(envelope)).into_response()
    }
}
