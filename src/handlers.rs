use crate::{
    AppState,
    auth::AuthDecision,
    config::AppConfig,
    error::{ErrorBody, LoaderError},
    loaders,
    models::{LinkAccountPage, ModelPage, OwnModelsPage, SearchPage},
    session::{SessionContext, SessionCookie},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

// --- Query Structs ---

/// PageQuery
///
/// Raw page parameter. Kept as a string so the loader, not the extractor, decides what
/// a malformed value means.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Page number; parsed leniently.
    pub p: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search text; fewer than 3 characters returns no results without searching.
    pub q: Option<String>,
    /// Page number; anything unparseable means page 1.
    pub p: Option<String>,
}

/// Accept types that ask for the ActivityPub representation of a model. Only these two
/// redirect: every page here answers JSON, so a plain `application/json` client still
/// gets the page data.
const ACTIVITY_TYPES: [&str; 2] = ["application/activity+json", "application/ld+json"];

// --- Handlers ---

/// get_session
///
/// The identity resolved for this request, or `{"user": null}`.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionContext))
)]
pub async fn get_session(session: SessionContext) -> Json<SessionContext> {
    Json(session)
}

/// login_page
///
/// Exposes the auth status to the login page without enforcing it.
#[utoipa::path(
    get,
    path = "/auth/login",
    responses((status = 200, description = "Auth status", body = AuthDecision))
)]
pub async fn login_page(decision: AuthDecision) -> Json<AuthDecision> {
    Json(decision)
}

/// register_page
///
/// Visitors who already hold a complete session are sent to the landing route.
#[utoipa::path(
    get,
    path = "/auth/register",
    responses(
        (status = 200, description = "Anonymous visitor"),
        (status = 307, description = "Already signed in")
    )
)]
pub async fn register_page(decision: AuthDecision, State(config): State<AppConfig>) -> Response {
    if decision.authorized {
        return Redirect::temporary(&config.landing_route).into_response();
    }
    Json(serde_json::json!({})).into_response()
}

#[utoipa::path(
    get,
    path = "/auth/link/printables",
    responses((status = 200, description = "Auth status", body = LinkAccountPage))
)]
pub async fn link_printables_page(decision: AuthDecision) -> Json<LinkAccountPage> {
    Json(LinkAccountPage { user: decision })
}

/// get_model_page
///
/// Loads a single model. ActivityPub clients are redirected (308) to the status endpoint
/// instead.
#[utoipa::path(
    get,
    path = "/model/{id}",
    params(("id" = String, Path, description = "Model ID")),
    responses(
        (status = 200, description = "Model", body = ModelPage),
        (status = 308, description = "ActivityPub representation"),
        (status = 404, description = "Upstream error, forwarded", body = ErrorBody)
    )
)]
pub async fn get_model_page(
    State(state): State<AppState>,
    SessionCookie(token): SessionCookie,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, LoaderError> {
    let wants_activity = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| ACTIVITY_TYPES.iter().any(|kind| accept.contains(kind)));
    if wants_activity {
        return Ok(Redirect::permanent(&format!("/api/v1/statuses/{id}")).into_response());
    }

    let page = loaders::load_model(state.upstream.as_ref(), &id, token).await?;
    Ok(Json(page).into_response())
}

/// get_own_models_page
///
/// The caller's own models. `p` must be a number when present.
#[utoipa::path(
    get,
    path = "/models/own",
    params(PageQuery),
    responses(
        (status = 200, description = "Own models", body = OwnModelsPage),
        (status = 400, description = "page not a number", body = ErrorBody),
        (status = 500, description = "Upstream failure", body = ErrorBody)
    )
)]
pub async fn get_own_models_page(
    State(state): State<AppState>,
    SessionCookie(token): SessionCookie,
    Query(query): Query<PageQuery>,
) -> Result<Json<OwnModelsPage>, LoaderError> {
    let page = loaders::load_own_models(state.upstream.as_ref(), query.p.as_deref(), token).await?;
    Ok(Json(page))
}

/// get_search_page
#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results, or null for short queries", body = SearchPage),
        (status = 500, description = "Search failed", body = ErrorBody)
    )
)]
pub async fn get_search_page(
    State(state): State<AppState>,
    SessionCookie(token): SessionCookie,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPage>, LoaderError> {
    let page = loaders::search_models(
        state.upstream.as_ref(),
        query.q.as_deref(),
        query.p.as_deref(),
        token,
    )
    .await?;
    Ok(Json(page))
}
