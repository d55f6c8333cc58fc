use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Pages Router Module
///
/// Data pages. Each forwards the visitor's session cookie upstream and lets the upstream
/// decide what the visitor may see.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // GET /model/{id}
        // One model; ActivityPub clients are redirected to the status endpoint.
        .route("/model/{id}", get(handlers::get_model_page))
        // GET /models/own?p=...
        // The visitor's own models, zero-indexed pages.
        .route("/models/own", get(handlers::get_own_models_page))
        // GET /search?q=...&p=...
        .route("/search", get(handlers::get_search_page))
}
