//! Query service: the read path over the session store.
//!
//! Responses are shaped before leaving the core: malformed legacy entries
//! (messages with neither user text nor a bot response) are dropped, and
//! absent session names get the placeholder label.

use std::sync::Arc;

use parley_types::conversation::{
    ConversationSession, Message, PREVIEW_MAX_CHARS, SessionSummary,
};
use parley_types::error::ConversationError;

use crate::conversation::store::SessionStore;

/// Read-path operations: fetch one session, list a user's sessions.
pub struct QueryService<S> {
    store: Arc<S>,
}

impl<S: SessionStore> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch a session by its composite key, shaped for API consumers.
    pub async fn get_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<ConversationSession, ConversationError> {
        match self.store.find_by_key(session_id, user_id).await? {
            Some(versioned) => Ok(shape(versioned.session)),
            None => Err(ConversationError::NotFound),
        }
    }

    /// Summaries of all sessions owned by a user, most recently active
    /// first.
    pub async fn list_sessions(
        &self,
        user_id: &str,
    ) -> Result<Vec<SessionSummary>, ConversationError> {
        let sessions = self.store.list_by_user(user_id).await?;
        Ok(sessions.into_iter().map(summarize).collect())
    }
}

/// Defensive cleanup: drop blank legacy messages, apply the name
/// placeholder.
fn shape(mut session: ConversationSession) -> ConversationSession {
    session.messages.retain(|m| !m.is_blank());
    session.session_name = Some(session.display_name());
    session
}

fn summarize(session: ConversationSession) -> SessionSummary {
    let session = shape(session);
    SessionSummary {
        preview: preview(&session.messages),
        session_name: session.display_name(),
        message_count: session.messages.len(),
        session_id: session.session_id,
        receiver_id: session.receiver_id,
        last_active: session.last_active,
    }
}

/// First message's user text truncated to [`PREVIEW_MAX_CHARS`]
/// characters; empty when the session has no messages.
fn preview(messages: &[Message]) -> String {
    messages
        .first()
        .map(|m| m.user_message.chars().take(PREVIEW_MAX_CHARS).collect())
        .unwrap_or_default()
}
