use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Entry Router Module
///
/// Pages a visitor reaches before (or while) signing in. They consult the auth gate to
/// expose or act on the visitor's status; none of them requires a session.
pub fn entry_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/login
        .route("/auth/login", get(handlers::login_page))
        // GET /auth/register
        // Signed-in visitors are redirected (307) to the landing route.
        .route("/auth/register", get(handlers::register_page))
        // GET /auth/link/printables
        .route("/auth/link/printables", get(handlers::link_printables_page))
}
