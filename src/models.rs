use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthDecision;

// --- Upstream Resource Schemas ---

/// Model
///
/// A printable model as the upstream API returns it, with the ids of its related
/// files and images. Local models have no `server_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct Model {
    pub id: String,
    pub server: String,
    #[serde(default)]
    pub server_id: Option<String>,
    pub profile_id: String,
    pub published: bool,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub license: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, deserialize_with = "related_ids")]
    pub files: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "related_ids",
        skip_serializing_if = "Option::is_none"
    )]
    pub images: Option<Vec<String>>,
}

/// Id lists come from an aggregate over an outer join, so a model without relations
/// arrives as `null` or `[null]`. Null entries are dropped and an empty list is `None`.
fn related_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ids: Option<Vec<Option<String>>> = Deserialize::deserialize(deserializer)?;
    let ids: Vec<String> = ids.into_iter().flatten().flatten().collect();
    Ok((!ids.is_empty()).then_some(ids))
}

/// PageResult
///
/// One page of a list endpoint. The upstream sends a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageResult<T> {
    pub items: Vec<T>,
}

/// SearchResult
///
/// One page of search hits plus the index's paging counters. The index fills either the
/// offset/limit counters or the page counters depending on how it was queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub hits: Vec<Hit>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub estimated_total_hits: Option<i64>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub hits_per_page: Option<i64>,
    #[serde(default)]
    pub total_hits: Option<i64>,
    #[serde(default)]
    pub total_pages: Option<i64>,
    pub processing_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Hit {
    pub result: SearchRecord,
    // Highlighted copy of `result`; its shape is up to the search index.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub formatted_result: Option<serde_json::Value>,
    #[serde(default)]
    pub ranking_score: Option<f64>,
}

/// SearchRecord
///
/// The indexed document behind a hit. Notes are indexed too and carry no title or
/// summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<String>,
    pub profile_id: String,
    pub record_type: String,
    #[serde(default)]
    pub image_ids: Vec<String>,
}

// --- Page Data (Loader Output) ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelPage {
    pub model: Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnModelsPage {
    pub models: Vec<Model>,
    pub page: i64,
}

/// SearchPage
///
/// `results` is `None` when the query was too short to be sent upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchPage {
    pub results: Option<SearchResult>,
    pub query: String,
    pub page: i64,
}

/// LinkAccountPage
///
/// Data for the account-linking entry page: the auth status, exposed but not enforced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkAccountPage {
    pub user: AuthDecision,
}
