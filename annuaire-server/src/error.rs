//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// API-level error mapped onto an HTTP status and a JSON body.
///
/// Client errors carry their message verbatim; internal errors expose only a
/// generic message while the underlying cause is logged at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 with `{"error": ...}`.
    BadRequest(String),
    /// 404 with `{"error": ...}`.
    NotFound(String),
    /// 500 with `{"error": ...}` and an optional `"message"` detail.
    Internal {
        error: String,
        message: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Generic 500 body; the real cause must be logged by the caller.
    pub fn internal(error: impl Into<String>) -> Self {
        Self::Internal {
            error: error.into(),
            message: None,
        }
    }

    /// 500 body carrying a public detail message.
    pub fn internal_with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(error) => (StatusCode::BAD_REQUEST, json!({ "error": error })),
            Self::NotFound(error) => (StatusCode::NOT_FOUND, json!({ "error": error })),
            Self::Internal { error, message } => {
                let body = match message {
                    Some(message) => json!({ "error": error, "message": message }),
                    None => json!({ "error": error }),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };
        (status, Json(body)).into_response()
    }
}
