//! Application error type mapping to HTTP status codes.
//!
//! The wire contract is a flat `{"error": "<message>"}` body -- the
//! widget surfaces `error` directly in an inline bubble.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use yasmin_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the chat service and store.
    Chat(ChatError),
    /// Request-shape validation at the handler boundary.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Chat(ChatError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Chat(ChatError::NotFound) => {
                (StatusCode::NOT_FOUND, "المحادثة غير موجودة".to_string())
            }
            AppError::Chat(ChatError::Upstream(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Chat(ChatError::Persistence(e)) => {
                tracing::error!(error = %e, "Persistence failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "خطأ في حفظ البيانات".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
