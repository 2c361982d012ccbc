use thiserror::Error;

/// Errors from session-store operations (implemented in parley-infra).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store unreachable; the caller may retry the whole request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Optimistic concurrency conflict: unique key already present or the
    /// revision moved between read and write. Safe to retry.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Query or mapping failure.
    #[error("query error: {0}")]
    Query(String),
}

/// Errors surfaced by the conversation core (append engine and query
/// service). Maps 1:1 onto HTTP status codes at the API boundary.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// Malformed or missing fields, batch-size exceeded. Never retried;
    /// the caller must fix the input.
    #[error("validation error: {0}")]
    Validation(String),

    /// No session for the given (session_id, user_id) key.
    #[error("conversation not found")]
    NotFound,

    /// Backing store unreachable. Retrying the whole request is safe.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The transactional read-modify-write could not be committed after
    /// bounded retries. Retrying the whole call is safe (appends are
    /// idempotent by dedup).
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
}

impl From<StoreError> for ConversationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => ConversationError::StoreUnavailable(msg),
            StoreError::Conflict(msg) => ConversationError::TransactionAborted(msg),
            StoreError::Query(msg) => ConversationError::StoreUnavailable(msg),
        }
    }
}
