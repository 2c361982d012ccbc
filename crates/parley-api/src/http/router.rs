//! Axum router configuration with middleware.
//!
//! CORS is wide open (the API and SSE stream are consumed cross-origin);
//! every request is traced via `TraceLayer`.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Conversation write path
        .route(
            "/conversations/create",
            post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations/{session_id}/{user_id}/message",
            post(handlers::conversation::append_single_message),
        )
        // Read path
        .route(
            "/conversations/users/{user_id}",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/{session_id}/{user_id}",
            get(handlers::conversation::get_conversation),
        )
        // Server-push subscriptions
        .route("/events", get(handlers::events::subscribe_all))
        .route(
            "/sse/connect/{session_id}",
            get(handlers::events::subscribe_session),
        )
        .route("/health", get(handlers::health::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
