//! Conversation session and message types for Parley.
//!
//! A [`ConversationSession`] is a keyed chat thread between a user and a
//! counterpart identity (e.g. a bot). Messages embed the bot response as
//! either a plain string or a sequence of typed parts, so code and prose
//! blocks render distinctly on the client.
//!
//! Wire field names are camelCase (`sessionId`, `userMessage`, ...) for
//! compatibility with existing API consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Maximum number of messages accepted in a single append batch.
pub const MAX_BATCH_MESSAGES: usize = 50;

/// Maximum number of characters in a session listing preview.
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Label substituted for sessions that were stored without a name.
pub const DEFAULT_SESSION_NAME: &str = "Untitled conversation";

/// Kind of a structured bot-response part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePartKind {
    Text,
    Code,
}

impl fmt::Display for ResponsePartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePartKind::Text => write!(f, "text"),
            ResponsePartKind::Code => write!(f, "code"),
        }
    }
}

impl FromStr for ResponsePartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ResponsePartKind::Text),
            "code" => Ok(ResponsePartKind::Code),
            other => Err(format!("invalid response part kind: '{other}'")),
        }
    }
}

/// One block of a structured bot response.
///
/// `language` is only meaningful for `kind: code` and is omitted from the
/// wire format when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub kind: ResponsePartKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ResponsePart {
    /// A plain prose block.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ResponsePartKind::Text,
            content: content.into(),
            language: None,
        }
    }

    /// A code block with an optional language tag.
    pub fn code(content: impl Into<String>, language: Option<String>) -> Self {
        Self {
            kind: ResponsePartKind::Code,
            content: content.into(),
            language,
        }
    }
}

/// Bot response: either a plain string or a sequence of typed parts.
///
/// Serde-untagged so both historical representations deserialize
/// transparently; whichever representation was submitted is preserved
/// through storage and returned as-is on the read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotResponse {
    Plain(String),
    Parts(Vec<ResponsePart>),
}

impl BotResponse {
    /// Whether the response carries no content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            BotResponse::Plain(s) => s.trim().is_empty(),
            BotResponse::Parts(parts) => parts.is_empty(),
        }
    }
}

/// A single message within a conversation session.
///
/// `timestamp` is an epoch-millisecond logical clock value supplied by the
/// client; it doubles as the deduplication key within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub user_message: String,
    pub bot_response: BotResponse,
    pub timestamp: i64,
}

impl Message {
    /// Canonical deduplication key: the decimal string form of the
    /// timestamp. Dedup compares these strings, not numeric values.
    pub fn dedup_key(&self) -> String {
        self.timestamp.to_string()
    }

    /// Whether both sides of the message are empty.
    ///
    /// Such entries exist in legacy data and are dropped on the read path.
    pub fn is_blank(&self) -> bool {
        self.user_message.trim().is_empty() && self.bot_response.is_empty()
    }
}

/// A conversation thread between a user and a counterpart identity.
///
/// The pair `(session_id, user_id)` uniquely identifies at most one
/// session; all lookups and writes key on the composite, never
/// `session_id` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSession {
    /// Store-assigned row id (UUID v7).
    pub id: Uuid,
    /// Externally supplied thread identifier.
    pub session_id: String,
    /// Session owner.
    pub user_id: String,
    /// Counterpart identity (e.g. the bot).
    pub receiver_id: String,
    /// Human-readable label; defaulted on the read path when absent.
    pub session_name: Option<String>,
    /// Ordered message sequence; insertion order is chronological order.
    pub messages: Vec<Message>,
    /// Timestamp of the most recent mutation.
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// The session name with the placeholder applied.
    pub fn display_name(&self) -> String {
        match self.session_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

/// Compact session view returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub session_name: String,
    pub receiver_id: String,
    pub last_active: DateTime<Utc>,
    pub message_count: usize,
    /// First message's user text, truncated to [`PREVIEW_MAX_CHARS`].
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_message(ts: i64) -> Message {
        Message {
            user_message: "hello".to_string(),
            bot_response: BotResponse::Plain("hi there".to_string()),
            timestamp: ts,
        }
    }

    #[test]
    fn test_bot_response_plain_roundtrip() {
        let resp = BotResponse::Plain("just text".to_string());
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, "\"just text\"");
        let parsed: BotResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn test_bot_response_parts_roundtrip() {
        let resp = BotResponse::Parts(vec![
            ResponsePart::text("here is a snippet"),
            ResponsePart::code("fn main() {}", Some("rust".to_string())),
        ]);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"kind\":\"code\""));
        assert!(json.contains("\"language\":\"rust\""));
        let parsed: BotResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn test_bot_response_untagged_deserialization() {
        let plain: BotResponse = serde_json::from_str("\"ok\"").unwrap();
        assert!(matches!(plain, BotResponse::Plain(_)));

        let parts: BotResponse =
            serde_json::from_str(r#"[{"kind":"text","content":"ok"}]"#).unwrap();
        assert!(matches!(parts, BotResponse::Parts(ref p) if p.len() == 1));
    }

    #[test]
    fn test_bot_response_is_empty() {
        assert!(BotResponse::Plain("   ".to_string()).is_empty());
        assert!(BotResponse::Parts(vec![]).is_empty());
        assert!(!BotResponse::Plain("x".to_string()).is_empty());
        assert!(!BotResponse::Parts(vec![ResponsePart::text("x")]).is_empty());
    }

    #[test]
    fn test_response_part_kind_roundtrip() {
        for kind in [ResponsePartKind::Text, ResponsePartKind::Code] {
            let s = kind.to_string();
            let parsed: ResponsePartKind = s.parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert!("markdown".parse::<ResponsePartKind>().is_err());
    }

    #[test]
    fn test_message_wire_fields_are_camel_case() {
        let json = serde_json::to_string(&plain_message(1_700_000_000_000)).unwrap();
        assert!(json.contains("\"userMessage\""));
        assert!(json.contains("\"botResponse\""));
        assert!(json.contains("\"timestamp\":1700000000000"));
    }

    #[test]
    fn test_message_dedup_key_is_decimal_string() {
        assert_eq!(plain_message(1_700_000_000_000).dedup_key(), "1700000000000");
    }

    #[test]
    fn test_message_is_blank() {
        let blank = Message {
            user_message: " ".to_string(),
            bot_response: BotResponse::Plain(String::new()),
            timestamp: 1,
        };
        assert!(blank.is_blank());
        assert!(!plain_message(1).is_blank());
    }

    #[test]
    fn test_display_name_placeholder() {
        let mut session = ConversationSession {
            id: Uuid::now_v7(),
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            receiver_id: "bot".to_string(),
            session_name: None,
            messages: vec![],
            last_active: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(session.display_name(), DEFAULT_SESSION_NAME);

        session.session_name = Some("  ".to_string());
        assert_eq!(session.display_name(), DEFAULT_SESSION_NAME);

        session.session_name = Some("Project chat".to_string());
        assert_eq!(session.display_name(), "Project chat");
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = ConversationSession {
            id: Uuid::now_v7(),
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            receiver_id: "bot".to_string(),
            session_name: Some("Project chat".to_string()),
            messages: vec![plain_message(42)],
            last_active: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"sessionId\":\"s1\""));
        assert!(json.contains("\"lastActive\""));
        assert!(json.contains("\"receiverId\":\"bot\""));
    }
}
