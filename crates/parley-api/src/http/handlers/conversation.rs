//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - POST /conversations/create                          - Append a message batch
//! - POST /conversations/{session_id}/{user_id}/message - Append one message
//! - GET  /conversations/{session_id}/{user_id}         - Get a session
//! - GET  /conversations/users/{user_id}                - List a user's sessions

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;

use parley_core::conversation::append::{AppendReceipt, AppendRequest};
use parley_types::conversation::{
    BotResponse, ConversationSession, Message, ResponsePart, SessionSummary,
};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /conversations/create - Append a batch of messages, creating the
/// session on first use.
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(request): Json<AppendRequest>,
) -> Result<ApiResponse<AppendReceipt>, AppError> {
    let receipt = state.append_engine.append_batch(request).await?;
    Ok(ApiResponse::success(receipt))
}

/// Body of the single-message convenience endpoint.
///
/// Accepts either a full `message`, or the `text` / `code` shorthands the
/// client sends for one-off blocks; the shorthand is expanded into a
/// message with a typed response part server-side.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleMessageRequest {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub session_name: Option<String>,
    /// Dedup timestamp for the shorthand forms; defaults to now.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl SingleMessageRequest {
    fn into_message(self) -> Result<Message, AppError> {
        if let Some(message) = self.message {
            return Ok(message);
        }
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        if let Some(code) = self.code {
            let language = self.language.or_else(|| Some("text".to_string()));
            return Ok(Message {
                user_message: code.clone(),
                bot_response: BotResponse::Parts(vec![ResponsePart::code(code, language)]),
                timestamp,
            });
        }
        if let Some(text) = self.text {
            return Ok(Message {
                user_message: text.clone(),
                bot_response: BotResponse::Parts(vec![ResponsePart::text(text)]),
                timestamp,
            });
        }
        Err(AppError::Validation(
            "one of message, text, or code is required".to_string(),
        ))
    }
}

/// POST /conversations/{session_id}/{user_id}/message - Append a single
/// message; a convenience wrapper over the batch engine.
pub async fn append_single_message(
    State(state): State<AppState>,
    Path((session_id, user_id)): Path<(String, String)>,
    Json(body): Json<SingleMessageRequest>,
) -> Result<ApiResponse<AppendReceipt>, AppError> {
    let receiver_id = body.receiver_id.clone();
    let session_name = body.session_name.clone();
    let message = body.into_message()?;

    let receipt = state
        .append_engine
        .append_batch(AppendRequest {
            session_id,
            user_id,
            receiver_id,
            session_name,
            messages: vec![message],
            last_active: None,
        })
        .await?;
    Ok(ApiResponse::success(receipt))
}

/// GET /conversations/{session_id}/{user_id} - Fetch one session.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path((session_id, user_id)): Path<(String, String)>,
) -> Result<ApiResponse<ConversationSession>, AppError> {
    let session = state.query_service.get_session(&session_id, &user_id).await?;
    Ok(ApiResponse::success(session))
}

/// GET /conversations/users/{user_id} - List a user's sessions, most
/// recently active first.
pub async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<SessionSummary>>, AppError> {
    let summaries = state.query_service.list_sessions(&user_id).await?;
    let count = summaries.len();
    Ok(ApiResponse::success(summaries).with_count(count))
}
