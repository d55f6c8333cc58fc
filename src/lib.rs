use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod claims;
pub mod config;
pub mod error;
pub mod handlers;
pub mod loaders;
pub mod models;
pub mod session;
pub mod upstream;

pub mod routes;
use routes::{entry, pages, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use session::{Resolvers, SessionContext};
pub use upstream::{HttpUpstream, MockUpstream, UpstreamState};

/// ApiDoc
///
/// OpenAPI document for the page-data routes, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::login_page, handlers::register_page,
        handlers::link_printables_page, handlers::get_model_page,
        handlers::get_own_models_page, handlers::get_search_page
    ),
    components(
        schemas(
            claims::Claims, session::SessionContext, auth::AuthDecision, error::ErrorBody,
            models::Model, models::SearchResult, models::Hit, models::SearchRecord,
            models::ModelPage, models::OwnModelsPage, models::SearchPage,
            models::LinkAccountPage,
        )
    ),
    tags(
        (name = "printshelf-web", description = "Session-aware page data for the printshelf frontend")
    )
)]
struct ApiDoc;

/// AppState
///
/// Immutable services shared by every request: configuration, the session token resolvers
/// and the upstream client. Nothing in here changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub resolvers: Resolvers,
    pub upstream: UpstreamState,
}

impl AppState {
    /// Wires the resolvers from the configuration.
    pub fn new(config: AppConfig, upstream: UpstreamState) -> Self {
        let resolvers = Resolvers::from_config(&config);
        Self {
            config,
            resolvers,
            upstream,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Resolvers {
    fn from_ref(app_state: &AppState) -> Resolvers {
        app_state.resolvers.clone()
    }
}

impl FromRef<AppState> for UpstreamState {
    fn from_ref(app_state: &AppState) -> UpstreamState {
        app_state.upstream.clone()
    }
}

/// create_router
///
/// Assembles all routes behind the session middleware, then the request-id, tracing and
/// CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(entry::entry_routes())
        .merge(pages::page_routes())
        // Session resolution runs before every route and never rejects.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::resolve_session,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with its id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// Span per request, tagged with the `x-request-id` so every log line of one request
/// can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
