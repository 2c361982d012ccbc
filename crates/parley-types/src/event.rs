//! Push-event and subscription-scope types for the broadcast hub.
//!
//! A [`PushEvent`] is what travels over a live push connection. The SSE
//! layer maps each variant to a text-stream frame: `connected` and
//! `update` become named events with a JSON payload, `Heartbeat` becomes a
//! comment frame. All variants are Clone + Send + Sync for use across
//! tokio tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Routing scope of a push subscription or notification.
///
/// `All` subscribers receive every scoped notification; it is the scope of
/// the firehose `/events` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKey {
    /// One conversation thread.
    Session(String),
    /// Everything belonging to one user.
    User(String),
    /// Every notification.
    All,
}

impl ScopeKey {
    /// Whether a subscription with this scope should receive a
    /// notification targeted at `target`.
    pub fn matches(&self, target: &ScopeKey) -> bool {
        matches!(self, ScopeKey::All) || self == target
    }
}

/// Payload of the initial `connected` acknowledgment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub connection_id: Uuid,
}

/// Payload of an `update` event emitted after a session mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub session_id: String,
    pub user_id: String,
    pub message_count: usize,
    pub last_active: DateTime<Utc>,
}

/// An event delivered over a push connection.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Sent synchronously on registration, before any other event.
    Connected(ConnectedPayload),
    /// A session changed; subscribers should re-fetch.
    SessionUpdated(SessionUpdate),
    /// No-op keep-alive frame.
    Heartbeat,
}

impl PushEvent {
    /// SSE event name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::Connected(_) => "connected",
            PushEvent::SessionUpdated(_) => "update",
            PushEvent::Heartbeat => "heartbeat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_matching() {
        let session = ScopeKey::Session("s1".to_string());
        let other = ScopeKey::Session("s2".to_string());
        let user = ScopeKey::User("u1".to_string());

        assert!(session.matches(&session.clone()));
        assert!(!session.matches(&other));
        assert!(!session.matches(&user));
        assert!(ScopeKey::All.matches(&session));
        assert!(ScopeKey::All.matches(&user));
        assert!(!user.matches(&ScopeKey::All));
    }

    #[test]
    fn test_connected_payload_wire_format() {
        let payload = ConnectedPayload {
            connection_id: Uuid::now_v7(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"connectionId\""));
    }

    #[test]
    fn test_session_update_wire_format() {
        let update = SessionUpdate {
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            message_count: 3,
            last_active: Utc::now(),
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"sessionId\":\"s1\""));
        assert!(json.contains("\"messageCount\":3"));
    }

    #[test]
    fn test_event_names() {
        let connected = PushEvent::Connected(ConnectedPayload {
            connection_id: Uuid::now_v7(),
        });
        assert_eq!(connected.name(), "connected");
        assert_eq!(PushEvent::Heartbeat.name(), "heartbeat");
    }
}
