use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    AppState,
    claims::{self, Claims, DecodeError},
    config::AppConfig,
};

// 1. Resolver Contract
/// ClaimsResolver
///
/// The single capability every session check goes through: turn a raw token into sanitized
/// claims or a decode failure. Implementations differ only in how much of the token they
/// trust; none of them ever returns the `private_key`.
pub trait ClaimsResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Claims, DecodeError>;
}

/// Reads the payload without checking the signature. Suitable only when the cookie issuer
/// and this service share a trust boundary.
#[derive(Clone, Debug, Default)]
pub struct UnverifiedResolver;

impl ClaimsResolver for UnverifiedResolver {
    fn resolve(&self, token: &str) -> Result<Claims, DecodeError> {
        claims::decode_unverified(token).map(claims::TokenPayload::sanitize)
    }
}

/// Strict structural parse, still without a signature check.
#[derive(Clone, Debug, Default)]
pub struct StructuredResolver;

impl ClaimsResolver for StructuredResolver {
    fn resolve(&self, token: &str) -> Result<Claims, DecodeError> {
        claims::decode_structured(token).map(claims::TokenPayload::sanitize)
    }
}

/// HS256 signature and expiry check against the issuer's shared secret.
#[derive(Clone)]
pub struct SignedResolver {
    key: DecodingKey,
}

impl SignedResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl ClaimsResolver for SignedResolver {
    fn resolve(&self, token: &str) -> Result<Claims, DecodeError> {
        claims::decode_verified(token, &self.key).map(claims::TokenPayload::sanitize)
    }
}

/// ResolverState
///
/// The concrete type used to share a resolver across the application state.
pub type ResolverState = Arc<dyn ClaimsResolver>;

/// Resolvers
///
/// The two call sites that read session tokens. Both are chosen here, in one place, from
/// the configuration: with a shared secret both verify signatures; without one the session
/// middleware reads unverified payloads and the gate parses them structurally.
#[derive(Clone)]
pub struct Resolvers {
    pub session: ResolverState,
    pub gate: ResolverState,
}

impl Resolvers {
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.jwt_secret {
            Some(secret) => {
                let signed: ResolverState = Arc::new(SignedResolver::new(secret));
                Self {
                    session: signed.clone(),
                    gate: signed,
                }
            }
            None => Self {
                session: Arc::new(UnverifiedResolver),
                gate: Arc::new(StructuredResolver),
            },
        }
    }
}

// 2. Cookie Extraction
/// session_token
///
/// Finds the session cookie across every `Cookie` header of the request. Surrounding
/// double quotes are stripped and an empty value counts as absent.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .filter(|token| !token.is_empty())
}

// 3. Request-scoped Identity
/// SessionContext
///
/// The identity of the current request: sanitized claims, or `None` for an anonymous
/// visitor. Inserted into the request extensions by [`resolve_session`] and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionContext {
    pub user: Option<Claims>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Resolves the context from raw headers. Decode failures degrade to anonymous.
    pub fn from_headers(
        headers: &HeaderMap,
        cookie_name: &str,
        resolver: &dyn ClaimsResolver,
    ) -> Self {
        let Some(token) = session_token(headers, cookie_name) else {
            return Self::anonymous();
        };

        match resolver.resolve(&token) {
            Ok(claims) => Self { user: Some(claims) },
            Err(e) => {
                tracing::debug!(error = %e, "session cookie could not be decoded, continuing anonymously");
                Self::anonymous()
            }
        }
    }
}

/// resolve_session
///
/// Middleware run before every route. Attaches a [`SessionContext`] to the request and
/// always continues down the pipeline.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = SessionContext::from_headers(
        request.headers(),
        &state.config.session_cookie,
        state.resolvers.session.as_ref(),
    );
    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Handlers receive the context resolved by the middleware. Routes mounted without the
/// middleware see an anonymous visitor.
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// SessionCookie
///
/// The raw session token, forwarded to the upstream API so it can authorize the caller's
/// own resources.
#[derive(Debug, Clone, Default)]
pub struct SessionCookie(pub Option<String>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(SessionCookie(
            session_token(&parts.headers, &config.session_cookie),
        ))
    }
}
