//! Success envelope for all API responses.
//!
//! Every success response is wrapped in a consistent envelope:
//! ```json
//! { "success": true, "data": { ... } }
//! ```
//! Listing endpoints additionally carry a `count` field. Errors use the
//! envelope built by [`crate::http::error::AppError`].

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope wrapping all successful API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    /// Number of items in `data`; present on listing endpoints only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }

    /// Attach an item count (listing endpoints).
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
