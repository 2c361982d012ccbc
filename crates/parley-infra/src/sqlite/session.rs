//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `parley-core` using sqlx with split
//! read/write pools. A session is one row; its message sequence is stored
//! as a JSON text column and deserialized on read. The `revision` column
//! backs the optimistic read-modify-write protocol of the append engine:
//! updates are guarded by the revision the caller read, so a racing writer
//! turns into a retryable [`StoreError::Conflict`] instead of a lost
//! update.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use parley_core::conversation::store::{SessionStore, VersionedSession};
use parley_types::conversation::{ConversationSession, Message};
use parley_types::error::StoreError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    session_id: String,
    user_id: String,
    receiver_id: String,
    session_name: Option<String>,
    messages: String,
    last_active: String,
    created_at: String,
    updated_at: String,
    revision: i64,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            receiver_id: row.try_get("receiver_id")?,
            session_name: row.try_get("session_name")?,
            messages: row.try_get("messages")?,
            last_active: row.try_get("last_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            revision: row.try_get("revision")?,
        })
    }

    fn into_session(self) -> Result<ConversationSession, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid session row id: {e}")))?;
        let messages: Vec<Message> = serde_json::from_str(&self.messages)
            .map_err(|e| StoreError::Query(format!("invalid messages JSON: {e}")))?;

        Ok(ConversationSession {
            id,
            session_id: self.session_id,
            user_id: self.user_id,
            receiver_id: self.receiver_id,
            session_name: self.session_name,
            messages,
            last_active: parse_datetime(&self.last_active)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }

    fn into_versioned(self) -> Result<VersionedSession, StoreError> {
        let revision = self.revision;
        Ok(VersionedSession {
            session: self.into_session()?,
            revision,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 (millisecond precision) so the TEXT column's
/// lexicographic order matches chronological order for the listing index.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_messages(messages: &[Message]) -> Result<String, StoreError> {
    serde_json::to_string(messages)
        .map_err(|e| StoreError::Query(format!("failed to serialize messages: {e}")))
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("unique key violation: {db}"))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => StoreError::Query(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn find_by_key(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<VersionedSession>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM conversation_sessions WHERE session_id = ? AND user_id = ?",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row).map_err(map_sqlx_error)?;
                Ok(Some(session_row.into_versioned()?))
            }
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ConversationSession>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM conversation_sessions WHERE user_id = ? ORDER BY last_active DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                SessionRow::from_row(row)
                    .map_err(map_sqlx_error)
                    .and_then(SessionRow::into_session)
            })
            .collect()
    }

    async fn insert(&self, session: &ConversationSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO conversation_sessions
               (id, session_id, user_id, receiver_id, session_name, messages, last_active, created_at, updated_at, revision)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(&session.receiver_id)
        .bind(&session.session_name)
        .bind(serialize_messages(&session.messages)?)
        .bind(format_datetime(&session.last_active))
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(
        &self,
        session: &ConversationSession,
        expected_revision: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE conversation_sessions
               SET receiver_id = ?, session_name = ?, messages = ?, last_active = ?,
                   updated_at = ?, revision = revision + 1
               WHERE session_id = ? AND user_id = ? AND revision = ?"#,
        )
        .bind(&session.receiver_id)
        .bind(&session.session_name)
        .bind(serialize_messages(&session.messages)?)
        .bind(format_datetime(&session.last_active))
        .bind(format_datetime(&session.updated_at))
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(expected_revision)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "revision {expected_revision} is stale for key ({}, {})",
                session.session_id, session.user_id
            )));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
