//! SessionStore trait definition.
//!
//! The single persistence port of the conversation core. Implementations
//! live in parley-infra (e.g. `SqliteSessionStore`). Uses native async fn
//! in traits (RPITIT, Rust 2024 edition).

use parley_types::conversation::ConversationSession;
use parley_types::error::StoreError;

/// A session paired with the store revision it was read at.
///
/// The revision is opaque to callers; it is passed back to
/// [`SessionStore::update`] so the store can reject writes racing a
/// concurrent mutation of the same key.
#[derive(Debug, Clone)]
pub struct VersionedSession {
    pub session: ConversationSession,
    pub revision: i64,
}

/// Store port for conversation session persistence.
///
/// Every read reflects the latest committed state; there is no caching
/// layer. The `insert`/`update` pair gives the append engine an optimistic
/// read-modify-write primitive: `insert` fails with
/// [`StoreError::Conflict`] when the `(session_id, user_id)` key already
/// exists, `update` fails the same way when the revision moved since the
/// read.
pub trait SessionStore: Send + Sync {
    /// Look up a session by its composite `(session_id, user_id)` key.
    fn find_by_key(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<VersionedSession>, StoreError>> + Send;

    /// All sessions owned by a user, ordered by `last_active` descending.
    fn list_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSession>, StoreError>> + Send;

    /// Persist a brand-new session. Conflict when the composite key exists.
    fn insert(
        &self,
        session: &ConversationSession,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Persist a mutated session, guarded by the revision the caller read.
    /// Conflict when the stored revision no longer matches.
    fn update(
        &self,
        session: &ConversationSession,
        expected_revision: i64,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Cheap connectivity probe for the health endpoint.
    fn ping(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`SessionStore`] used by append-engine and query tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemorySessionStore {
        rows: Mutex<HashMap<(String, String), VersionedSession>>,
    }

    impl MemorySessionStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn session_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn message_count(&self, session_id: &str, user_id: &str) -> usize {
            self.rows
                .lock()
                .unwrap()
                .get(&(session_id.to_string(), user_id.to_string()))
                .map(|v| v.session.messages.len())
                .unwrap_or(0)
        }
    }

    impl SessionStore for MemorySessionStore {
        async fn find_by_key(
            &self,
            session_id: &str,
            user_id: &str,
        ) -> Result<Option<VersionedSession>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .get(&(session_id.to_string(), user_id.to_string()))
                .cloned())
        }

        async fn list_by_user(
            &self,
            user_id: &str,
        ) -> Result<Vec<ConversationSession>, StoreError> {
            let rows = self.rows.lock().unwrap();
            let mut sessions: Vec<ConversationSession> = rows
                .values()
                .filter(|v| v.session.user_id == user_id)
                .map(|v| v.session.clone())
                .collect();
            sessions.sort_by(|a, b| b.last_active.cmp(&a.last_active));
            Ok(sessions)
        }

        async fn insert(&self, session: &ConversationSession) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let key = (session.session_id.clone(), session.user_id.clone());
            if rows.contains_key(&key) {
                return Err(StoreError::Conflict(format!(
                    "session already exists for key ({}, {})",
                    key.0, key.1
                )));
            }
            rows.insert(
                key,
                VersionedSession {
                    session: session.clone(),
                    revision: 0,
                },
            );
            Ok(())
        }

        async fn update(
            &self,
            session: &ConversationSession,
            expected_revision: i64,
        ) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let key = (session.session_id.clone(), session.user_id.clone());
            match rows.get_mut(&key) {
                Some(existing) if existing.revision == expected_revision => {
                    existing.session = session.clone();
                    existing.revision += 1;
                    Ok(())
                }
                Some(existing) => Err(StoreError::Conflict(format!(
                    "revision moved: expected {expected_revision}, found {}",
                    existing.revision
                ))),
                None => Err(StoreError::Conflict(format!(
                    "no session for key ({}, {})",
                    key.0, key.1
                ))),
            }
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }
}
