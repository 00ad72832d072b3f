//! Handler for `GET /tags`.
//!
//! Tags have no storage of their own; the index is derived from every work
//! on each request.

use archive_core::{browse::TagIndex, store::ArchiveStore, work::TagCategory};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct TagParams {
  /// One of `fandoms`, `relationships`, `characters`, `freeforms`. Any other
  /// value is treated as absent.
  #[serde(rename = "type")]
  pub category: Option<String>,
  /// Case-insensitive substring filter.
  pub q:        Option<String>,
}

/// `GET /tags[?type=<category>][&q=<text>]`
///
/// With a recognised `type` the response is `{"tags": [...]}`; otherwise
/// it is the whole index keyed by category.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<TagParams>,
) -> Result<Json<Value>, ApiError>
where
  S: ArchiveStore,
{
  let works = state.store.list_works().await.map_err(ApiError::store)?;
  let mut index = TagIndex::from_works(&works);
  if let Some(q) = params.q.as_deref().filter(|q| !q.is_empty()) {
    index = index.filtered(q);
  }

  let category = params
    .category
    .as_deref()
    .and_then(|c| c.parse::<TagCategory>().ok());

  Ok(Json(match category {
    Some(category) => json!({ "tags": index.get(category) }),
    None => json!(index),
  }))
}
