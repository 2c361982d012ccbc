//! Broadcast hub: the process-wide registry of live push connections.
//!
//! Connections register with a [`ScopeKey`] and receive [`PushEvent`]s over
//! an unbounded mpsc channel (the transport handle). Delivery is
//! at-most-once and best-effort: a failed send unregisters the dead
//! connection and fan-out continues for the rest. There is no buffering or
//! replay -- events missed while disconnected are simply lost.
//!
//! The registry is created empty at process start and torn down implicitly
//! at process exit; entries are added on transport open and removed on
//! transport close or terminal write failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use parley_types::event::{ConnectedPayload, PushEvent, ScopeKey};

/// Interval between keep-alive frames on idle connections.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// One live push connection.
struct Connection {
    scope: ScopeKey,
    sender: mpsc::UnboundedSender<PushEvent>,
    #[allow(dead_code)]
    connected_at: DateTime<Utc>,
}

/// Registry of live push connections with scope-keyed fan-out.
///
/// Connection identifiers are UUID v7 -- monotonic and collision-safe
/// under high connection rates.
pub struct BroadcastHub {
    connections: DashMap<Uuid, Connection>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection and return its id plus the receiving end
    /// of the transport channel.
    ///
    /// A `connected` acknowledgment carrying the connection id is queued
    /// before the entry becomes visible to any notify, so it is always the
    /// first event delivered on the connection.
    pub fn register(&self, scope: ScopeKey) -> (Uuid, mpsc::UnboundedReceiver<PushEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection_id = Uuid::now_v7();

        // The receiver is alive at this point, so the send cannot fail.
        let _ = sender.send(PushEvent::Connected(ConnectedPayload { connection_id }));

        self.connections.insert(
            connection_id,
            Connection {
                scope,
                sender,
                connected_at: Utc::now(),
            },
        );
        tracing::debug!(
            %connection_id,
            total = self.connections.len(),
            "push connection registered"
        );

        (connection_id, receiver)
    }

    /// Remove a connection. Idempotent: unknown ids are ignored.
    pub fn unregister(&self, connection_id: &Uuid) {
        if self.connections.remove(connection_id).is_some() {
            tracing::debug!(
                %connection_id,
                remaining = self.connections.len(),
                "push connection unregistered"
            );
        }
    }

    /// Deliver an event to every connection subscribed to `scope`
    /// (including `All` subscribers).
    pub fn notify(&self, scope: &ScopeKey, event: &PushEvent) {
        self.notify_many(std::slice::from_ref(scope), event);
    }

    /// Deliver an event once to every connection matching any of `scopes`.
    pub fn notify_many(&self, scopes: &[ScopeKey], event: &PushEvent) {
        self.deliver(
            |conn| scopes.iter().any(|scope| conn.scope.matches(scope)),
            event,
        );
    }

    /// Deliver an event to every connection regardless of scope.
    pub fn notify_all(&self, event: &PushEvent) {
        self.deliver(|_| true, event);
    }

    /// Send a no-op keep-alive frame to every open connection.
    pub fn heartbeat(&self) {
        self.notify_all(&PushEvent::Heartbeat);
    }

    /// Number of currently registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Periodic keep-alive loop; spawn once at startup.
    pub async fn run_heartbeat(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so idle connections
        // get their first keep-alive one full interval after connecting.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.heartbeat();
        }
    }

    fn deliver(&self, matches: impl Fn(&Connection) -> bool, event: &PushEvent) {
        // Collect dead connections during iteration and remove them after;
        // removing a key while iterating the same shard can deadlock.
        let mut dead = Vec::new();
        for entry in self.connections.iter() {
            if !matches(entry.value()) {
                continue;
            }
            if entry.value().sender.send(event.clone()).is_err() {
                dead.push(*entry.key());
            }
        }
        for connection_id in dead {
            self.connections.remove(&connection_id);
            tracing::warn!(
                %connection_id,
                remaining = self.connections.len(),
                "push write failed, connection unregistered"
            );
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("connection_count", &self.connections.len())
            .finish()
    }
}
