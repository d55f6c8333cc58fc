use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that carry no upstream data.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer check. Answers "ok" without touching the upstream.
        .route("/health", get(|| async { "ok" }))
        // GET /session
        // The identity resolved by the session middleware for this request.
        .route("/session", get(handlers::get_session))
}
