//! Append engine: the single writer path for conversation sessions.
//!
//! Validates an incoming message batch, lazily creates the target session,
//! deduplicates by canonical timestamp string, merges, and persists under
//! optimistic concurrency control. On a committed mutation it notifies the
//! broadcast hub (best-effort -- a push failure never fails the append).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_types::conversation::{ConversationSession, MAX_BATCH_MESSAGES, Message};
use parley_types::error::{ConversationError, StoreError};
use parley_types::event::{PushEvent, ScopeKey, SessionUpdate};

use crate::broadcast::BroadcastHub;
use crate::conversation::store::{SessionStore, VersionedSession};

/// Bounded attempts for the optimistic read-modify-write loop.
///
/// Each attempt re-reads the session, so a lost race is resolved by
/// re-deduplicating against the winner's result.
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// One append call: a batch of messages targeting a composite session key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendRequest {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub session_name: Option<String>,
    pub messages: Vec<Message>,
    /// Epoch-millisecond override for the session's `last_active`;
    /// defaults to now.
    #[serde(default)]
    pub last_active: Option<i64>,
}

/// Result of a successful append.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendReceipt {
    pub session_id: String,
    /// Total messages in the session after the merge.
    pub message_count: usize,
    pub last_active: DateTime<Utc>,
}

struct MergeOutcome {
    receipt: AppendReceipt,
    /// None when the batch was fully deduplicated (idempotent no-op).
    update: Option<SessionUpdate>,
}

/// Validates, deduplicates, and atomically merges message batches.
pub struct AppendEngine<S> {
    store: Arc<S>,
    hub: Arc<BroadcastHub>,
}

impl<S: SessionStore> AppendEngine<S> {
    pub fn new(store: Arc<S>, hub: Arc<BroadcastHub>) -> Self {
        Self { store, hub }
    }

    /// Merge a batch into its session, creating the session on first
    /// append. Idempotent: messages whose timestamp already exists in the
    /// session are silently discarded, and a fully-duplicate batch
    /// succeeds without mutating anything.
    pub async fn append_batch(
        &self,
        request: AppendRequest,
    ) -> Result<AppendReceipt, ConversationError> {
        validate(&request)?;

        let supplied_last_active = request
            .last_active
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        let mut attempt = 0;
        let outcome = loop {
            attempt += 1;
            match self.try_merge(&request, supplied_last_active).await {
                Ok(outcome) => break outcome,
                Err(StoreError::Conflict(reason)) if attempt < MAX_APPEND_ATTEMPTS => {
                    tracing::debug!(
                        session_id = %request.session_id,
                        user_id = %request.user_id,
                        attempt,
                        %reason,
                        "append conflict, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(update) = outcome.update {
            tracing::info!(
                session_id = %update.session_id,
                user_id = %update.user_id,
                message_count = update.message_count,
                "session mutated"
            );
            let scopes = [
                ScopeKey::Session(update.session_id.clone()),
                ScopeKey::User(update.user_id.clone()),
            ];
            self.hub
                .notify_many(&scopes, &PushEvent::SessionUpdated(update));
        }

        Ok(outcome.receipt)
    }

    /// One optimistic attempt: read, merge in memory, write guarded by the
    /// revision (or insert guarded by the unique key). A
    /// [`StoreError::Conflict`] means a concurrent writer won the race and
    /// the whole attempt must be replayed against fresh state.
    async fn try_merge(
        &self,
        request: &AppendRequest,
        supplied_last_active: Option<DateTime<Utc>>,
    ) -> Result<MergeOutcome, StoreError> {
        match self
            .store
            .find_by_key(&request.session_id, &request.user_id)
            .await?
        {
            None => {
                let session = new_session(request, supplied_last_active);
                self.store.insert(&session).await?;
                Ok(MergeOutcome {
                    receipt: receipt_for(&session),
                    update: Some(update_for(&session)),
                })
            }
            Some(VersionedSession {
                mut session,
                revision,
            }) => {
                let mut seen: HashSet<String> =
                    session.messages.iter().map(Message::dedup_key).collect();
                let fresh: Vec<Message> = request
                    .messages
                    .iter()
                    .filter(|m| seen.insert(m.dedup_key()))
                    .cloned()
                    .collect();

                if fresh.is_empty() {
                    // Pure idempotent no-op: nothing committed, nothing
                    // notified.
                    return Ok(MergeOutcome {
                        receipt: receipt_for(&session),
                        update: None,
                    });
                }

                session.messages.extend(fresh);
                session.last_active = supplied_last_active.unwrap_or_else(Utc::now);
                session.updated_at = Utc::now();
                if let Some(name) = non_empty(request.session_name.as_deref()) {
                    session.session_name = Some(name);
                }
                if let Some(receiver) = non_empty(request.receiver_id.as_deref()) {
                    session.receiver_id = receiver;
                }

                self.store.update(&session, revision).await?;
                Ok(MergeOutcome {
                    receipt: receipt_for(&session),
                    update: Some(update_for(&session)),
                })
            }
        }
    }
}

fn validate(request: &AppendRequest) -> Result<(), ConversationError> {
    if request.session_id.trim().is_empty() {
        return Err(ConversationError::Validation(
            "sessionId must not be empty".to_string(),
        ));
    }
    if request.user_id.trim().is_empty() {
        return Err(ConversationError::Validation(
            "userId must not be empty".to_string(),
        ));
    }
    if request.messages.is_empty() {
        return Err(ConversationError::Validation(
            "messages must not be empty".to_string(),
        ));
    }
    if request.messages.len() > MAX_BATCH_MESSAGES {
        return Err(ConversationError::Validation(format!(
            "batch of {} messages exceeds the limit of {MAX_BATCH_MESSAGES}",
            request.messages.len()
        )));
    }
    for (index, message) in request.messages.iter().enumerate() {
        if message.user_message.trim().is_empty() {
            return Err(ConversationError::Validation(format!(
                "message {index}: userMessage must not be empty"
            )));
        }
        if message.bot_response.is_empty() {
            return Err(ConversationError::Validation(format!(
                "message {index}: botResponse must not be empty"
            )));
        }
    }
    Ok(())
}

/// Build the initial session for a first append, deduplicating the batch
/// against itself while preserving order.
fn new_session(
    request: &AppendRequest,
    supplied_last_active: Option<DateTime<Utc>>,
) -> ConversationSession {
    let now = Utc::now();
    let mut seen = HashSet::new();
    let messages: Vec<Message> = request
        .messages
        .iter()
        .filter(|m| seen.insert(m.dedup_key()))
        .cloned()
        .collect();

    ConversationSession {
        id: Uuid::now_v7(),
        session_id: request.session_id.clone(),
        user_id: request.user_id.clone(),
        receiver_id: request.receiver_id.clone().unwrap_or_default(),
        session_name: non_empty(request.session_name.as_deref()),
        messages,
        last_active: supplied_last_active.unwrap_or(now),
        created_at: now,
        updated_at: now,
    }
}

fn receipt_for(session: &ConversationSession) -> AppendReceipt {
    AppendReceipt {
        session_id: session.session_id.clone(),
        message_count: session.messages.len(),
        last_active: session.last_active,
    }
}

fn update_for(session: &ConversationSession) -> SessionUpdate {
    SessionUpdate {
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        message_count: session.messages.len(),
        last_active: session.last_active,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
