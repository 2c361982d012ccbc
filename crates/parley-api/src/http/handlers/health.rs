//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use parley_core::conversation::store::SessionStore;

use crate::state::AppState;

/// GET /health - Report process liveness and storage reachability.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store_status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "storeStatus": store_status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
