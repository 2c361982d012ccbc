//! Application error type mapping to HTTP status codes and envelope format.
//!
//! Validation and store errors abort the current request only; they never
//! crash the process or affect other in-flight requests. Retryable store
//! failures are logged with full context before being surfaced as 500s.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ConversationError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Conversation-core errors (validation, not-found, store failures).
    Conversation(ConversationError),
    /// Malformed request input caught at the HTTP boundary.
    Validation(String),
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Conversation(ConversationError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Conversation(ConversationError::NotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Conversation not found".to_string(),
            ),
            AppError::Conversation(ConversationError::StoreUnavailable(msg)) => {
                tracing::error!(error = %msg, "store unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_UNAVAILABLE",
                    "Storage backend unavailable, retry the request".to_string(),
                )
            }
            AppError::Conversation(ConversationError::TransactionAborted(msg)) => {
                tracing::error!(error = %msg, "transaction aborted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TRANSACTION_ABORTED",
                    "Concurrent update conflict, retry the request".to_string(),
                )
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        };

        let body = json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
