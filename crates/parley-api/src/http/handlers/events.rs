//! Server-sent-event subscription handlers.
//!
//! Both endpoints register a connection on the broadcast hub and stream
//! its events as SSE frames until the client disconnects. Registration
//! queues a `connected` acknowledgment before any other event, so it is
//! always the first frame a subscriber sees. Unregistration is tied to
//! stream drop, which covers both clean disconnects and aborted requests.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use tokio_stream::Stream;
use uuid::Uuid;

use parley_core::broadcast::BroadcastHub;
use parley_types::event::{PushEvent, ScopeKey};

use crate::state::AppState;

/// GET /events - Subscribe to every session update (firehose).
pub async fn subscribe_all(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    event_stream(state.hub.clone(), ScopeKey::All)
}

/// GET /sse/connect/{session_id} - Subscribe to one session's updates.
pub async fn subscribe_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    event_stream(state.hub.clone(), ScopeKey::Session(session_id))
}

/// Unregisters the connection when the SSE stream is dropped.
struct ConnectionGuard {
    hub: Arc<BroadcastHub>,
    connection_id: Uuid,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.hub.unregister(&self.connection_id);
    }
}

fn event_stream(
    hub: Arc<BroadcastHub>,
    scope: ScopeKey,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (connection_id, mut receiver) = hub.register(scope);
    let guard = ConnectionGuard { hub, connection_id };

    let stream = async_stream::stream! {
        // Moved into the stream so drop fires when the client goes away.
        let _guard = guard;
        while let Some(event) = receiver.recv().await {
            yield Ok(to_sse_event(&event));
        }
    };

    Sse::new(stream)
}

/// Map a hub event to an SSE frame. Heartbeats are comment frames; the
/// rest are named events with a JSON payload.
fn to_sse_event(event: &PushEvent) -> Event {
    let payload = match event {
        PushEvent::Heartbeat => return Event::default().comment("heartbeat"),
        PushEvent::Connected(payload) => serde_json::to_value(payload),
        PushEvent::SessionUpdated(update) => serde_json::to_value(update),
    };

    match payload {
        Ok(value) => Event::default().event(event.name()).data(value.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, kind = event.name(), "failed to serialize push event");
            Event::default().comment("serialization error")
        }
    }
}
