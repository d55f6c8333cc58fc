use axum::http::StatusCode;
use serde::de::DeserializeOwned;

use crate::{
    error::LoaderError,
    models::{Model, ModelPage, OwnModelsPage, PageResult, SearchPage, SearchResult},
    upstream::{FetchError, Upstream, UpstreamRequest},
};

/// Shortest query worth sending to the search index.
pub const MIN_QUERY_CHARS: usize = 3;

pub const PAGE_NOT_A_NUMBER: &str = "page not a number";
pub const SEARCH_FAILED: &str = "Search failed";

// --- ResourceLoader ---

/// ResourceLoader
///
/// Fetch, check status, decode. One upstream call per `load`, no retry and no cache.
pub struct ResourceLoader<'a> {
    upstream: &'a dyn Upstream,
}

impl<'a> ResourceLoader<'a> {
    pub fn new(upstream: &'a dyn Upstream) -> Self {
        Self { upstream }
    }

    /// Non-2xx responses fail with the status and the body text verbatim. A 2xx body that
    /// does not decode into `T` fails with [`FetchError::Decode`].
    pub async fn load<T: DeserializeOwned>(&self, request: UpstreamRequest) -> Result<T, FetchError> {
        let path = request.path.clone();
        let response = self.upstream.send(request).await?;

        if !response.status.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            tracing::error!(path = %path, error = %e, "upstream body did not match the expected shape");
            FetchError::Decode(e)
        })
    }
}

// --- PaginationGate ---

/// What to do with a page parameter that is present but not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPage {
    /// Fail with 400 before anything is sent upstream.
    Reject,
    /// Fall back to the first page.
    Default,
}

/// PagePolicy
///
/// Page-number handling for one upstream endpoint. `first_page` follows that endpoint's
/// own indexing and is used when the parameter is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePolicy {
    pub first_page: i64,
    pub on_invalid: InvalidPage,
}

impl PagePolicy {
    /// The model list is zero-indexed and rejects garbage.
    pub const MODEL_LIST: Self = Self {
        first_page: 0,
        on_invalid: InvalidPage::Reject,
    };

    /// Search is one-indexed and forgives garbage.
    pub const SEARCH: Self = Self {
        first_page: 1,
        on_invalid: InvalidPage::Default,
    };

    pub fn resolve(&self, raw: Option<&str>) -> Result<i64, LoaderError> {
        let Some(raw) = raw else {
            return Ok(self.first_page);
        };

        match (parse_int_prefix(raw), self.on_invalid) {
            (Some(page), _) => Ok(page),
            (None, InvalidPage::Default) => Ok(self.first_page),
            (None, InvalidPage::Reject) => Err(LoaderError::bad_request(PAGE_NOT_A_NUMBER)),
        }
    }
}

/// Lenient integer parse: leading whitespace, an optional sign, then as many decimal
/// digits as there are. `"12abc"` is 12; `""`, `"abc"` and out-of-range values are not
/// numbers.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    format!("{sign}{}", &rest[..digits_len]).parse().ok()
}

// --- Page Loaders ---

/// load_model
///
/// Single model by id. Upstream failures are forwarded with their own status and body.
pub async fn load_model(
    upstream: &dyn Upstream,
    id: &str,
    session_token: Option<String>,
) -> Result<ModelPage, LoaderError> {
    let request = UpstreamRequest::get("/api/v1/model")
        .query("id", id)
        .session(session_token);

    let model: Model = ResourceLoader::new(upstream).load(request).await?;
    Ok(ModelPage { model })
}

/// load_own_models
///
/// The caller's own models, one page at a time. The page is validated before any
/// upstream call; an upstream failure is reported as 500 naming the upstream status.
pub async fn load_own_models(
    upstream: &dyn Upstream,
    raw_page: Option<&str>,
    session_token: Option<String>,
) -> Result<OwnModelsPage, LoaderError> {
    let page = PagePolicy::MODEL_LIST.resolve(raw_page)?;

    let request = UpstreamRequest::get("/api/v1/model/list")
        .query("page", page)
        .session(session_token);

    match ResourceLoader::new(upstream)
        .load::<PageResult<Model>>(request)
        .await
    {
        Ok(models) => Ok(OwnModelsPage {
            models: models.items,
            page,
        }),
        Err(FetchError::Status { status, .. }) => Err(LoaderError::internal(format!(
            "request failed with {}",
            status.as_u16()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// SearchGate
///
/// `Idle -> ShortCircuit | Dispatch -> Success | Failure`. Queries shorter than
/// [`MIN_QUERY_CHARS`] never reach the index. Every failure, including a body the index
/// sent in an unexpected shape, is reported as [`SEARCH_FAILED`].
pub async fn search_models(
    upstream: &dyn Upstream,
    raw_query: Option<&str>,
    raw_page: Option<&str>,
    session_token: Option<String>,
) -> Result<SearchPage, LoaderError> {
    let query = raw_query.unwrap_or_default().to_string();
    let page = PagePolicy::SEARCH.resolve(raw_page)?;

    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(SearchPage {
            results: None,
            query,
            page,
        });
    }

    let request = UpstreamRequest::get("/api/v1/search/model")
        .query("q", &query)
        .query("page", page)
        .session(session_token);

    match ResourceLoader::new(upstream)
        .load::<SearchResult>(request)
        .await
    {
        Ok(results) => Ok(SearchPage {
            results: Some(results),
            query,
            page,
        }),
        // The decode failure is already logged by the loader.
        Err(_) => Err(LoaderError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            SEARCH_FAILED,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_prefix_follows_lenient_rules() {
        assert_eq!(parse_int_prefix("3"), Some(3));
        assert_eq!(parse_int_prefix("  42"), Some(42));
        assert_eq!(parse_int_prefix("12abc"), Some(12));
        assert_eq!(parse_int_prefix("-2"), Some(-2));
        assert_eq!(parse_int_prefix("+7"), Some(7));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999999"), None);
    }

    #[test]
    fn model_list_policy_rejects_garbage() {
        assert_eq!(PagePolicy::MODEL_LIST.resolve(None), Ok(0));
        assert_eq!(PagePolicy::MODEL_LIST.resolve(Some("4")), Ok(4));
        let err = PagePolicy::MODEL_LIST.resolve(Some("abc")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, PAGE_NOT_A_NUMBER);
    }

    #[test]
    fn search_policy_defaults_garbage() {
        assert_eq!(PagePolicy::SEARCH.resolve(None), Ok(1));
        assert_eq!(PagePolicy::SEARCH.resolve(Some("abc")), Ok(1));
        assert_eq!(PagePolicy::SEARCH.resolve(Some("5")), Ok(5));
    }
}
