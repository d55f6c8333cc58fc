use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    claims::Claims,
    config::AppConfig,
    session::{ClaimsResolver, Resolvers, session_token},
};

/// AuthDecision
///
/// The answer to "is this request authenticated, and with what claims". A plain value with
/// no side effects; routes use it to branch or redirect, never to reject on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthDecision {
    pub authorized: bool,
    pub claims: Option<Claims>,
}

impl AuthDecision {
    pub fn denied() -> Self {
        Self {
            authorized: false,
            claims: None,
        }
    }

    pub fn granted(claims: Claims) -> Self {
        Self {
            authorized: true,
            claims: Some(claims),
        }
    }
}

/// check_auth
///
/// Looks up the session cookie, decodes it with `resolver` and requires complete claims
/// (`subject`, `username` and `email` all present). Every failure is a denial.
pub fn check_auth(
    headers: &HeaderMap,
    cookie_name: &str,
    resolver: &dyn ClaimsResolver,
) -> AuthDecision {
    let Some(token) = session_token(headers, cookie_name) else {
        return AuthDecision::denied();
    };

    let claims = match resolver.resolve(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "auth gate rejected session token");
            return AuthDecision::denied();
        }
    };

    if claims.is_complete() {
        AuthDecision::granted(claims)
    } else {
        tracing::debug!("auth gate rejected incomplete claims");
        AuthDecision::denied()
    }
}

/// AuthDecision Extractor Implementation
///
/// Lets a handler take `AuthDecision` as an argument. The extractor never rejects: an
/// unauthenticated request simply yields `authorized: false`.
impl<S> FromRequestParts<S> for AuthDecision
where
    S: Send + Sync,
    Resolvers: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resolvers = Resolvers::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(check_auth(
            &parts.headers,
            &config.session_cookie,
            resolvers.gate.as_ref(),
        ))
    }
}
