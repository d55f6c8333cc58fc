use async_trait::async_trait;
use axum::http::{Method, StatusCode, header};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use thiserror::Error;

use crate::{config::AppConfig, error::LoaderError};

/// UpstreamRequest
///
/// A fully formed call against the upstream API: method, path, query parameters and the
/// caller's session token, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub session_token: Option<String>,
}

impl UpstreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            session_token: None,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn session(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// UpstreamResponse
///
/// Status and raw body text. Bodies of failed responses are plain human-readable text.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

/// FetchError
///
/// Why an upstream load failed, before a page loader decides how to report it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream answered outside the 2xx range.
    #[error("upstream responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// No response arrived.
    #[error("upstream unreachable: {0}")]
    Transport(String),
    /// A 2xx body did not match the expected shape.
    #[error("upstream body did not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<FetchError> for LoaderError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { status, body } => LoaderError::new(status, body),
            FetchError::Transport(_) => {
                LoaderError::new(StatusCode::BAD_GATEWAY, "upstream unavailable")
            }
            FetchError::Decode(e) => {
                LoaderError::internal(format!("invalid upstream response: {e}"))
            }
        }
    }
}

// 1. Upstream Contract
/// Upstream
///
/// Issues exactly one HTTP request per call. No retries, no caching.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, FetchError>;
}

/// UpstreamState
///
/// The concrete type used to share the upstream client across the application state.
pub type UpstreamState = Arc<dyn Upstream>;

// 2. The Real Implementation (reqwest)
/// HttpUpstream
///
/// Talks to the upstream API over HTTP. The session token is forwarded as the same cookie
/// the browser sent, so the upstream applies its own authorization.
#[derive(Clone, Debug)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
    cookie_name: String,
}

impl HttpUpstream {
    pub fn new(config: &AppConfig) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.upstream_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.upstream_url.trim_end_matches('/').to_string(),
            cookie_name: config.session_cookie.clone(),
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .query(&request.query);
        if let Some(token) = &request.session_token {
            builder = builder.header(header::COOKIE, format!("{}={}", self.cookie_name, token));
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "upstream request failed");
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "upstream returned an error status");
        }

        Ok(UpstreamResponse { status, body })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockUpstream
///
/// Serves canned responses by path and records every request it receives, so tests can
/// assert on what was (or was not) sent upstream. Unknown paths answer 404.
#[derive(Default)]
pub struct MockUpstream {
    responses: HashMap<String, (StatusCode, String)>,
    unreachable: bool,
    calls: Mutex<Vec<UpstreamRequest>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request fails as if the network were down.
    pub fn new_unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_response(
        mut self,
        path: impl Into<String>,
        status: StatusCode,
        body: impl Into<String>,
    ) -> Self {
        self.responses.insert(path.into(), (status, body.into()));
        self
    }

    pub fn with_json(self, path: impl Into<String>, body: &serde_json::Value) -> Self {
        self.with_response(path, StatusCode::OK, body.to_string())
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        let path = request.path.clone();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        if self.unreachable {
            return Err(FetchError::Transport("mock upstream unreachable".to_string()));
        }

        let (status, body) = self
            .responses
            .get(&path)
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, "not found".to_string()));
        Ok(UpstreamResponse { status, body })
    }
}
