//! Handlers for the unauthenticated counters.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/works/:id/kudos` | Returns `{"kudos_count": n}` |
//! | `POST` | `/works/:id/hits`  | Returns `{"hit_count": n}` |

use archive_core::store::ArchiveStore;
use axum::{
  Json,
  extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, works::parse_id};

/// `POST /works/:id/kudos`
pub async fn kudos<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: ArchiveStore,
{
  let id = parse_id(&id)?;
  let count = state
    .store
    .increment_kudos(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;
  Ok(Json(json!({ "kudos_count": count })))
}

/// `POST /works/:id/hits`
pub async fn hits<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: ArchiveStore,
{
  let id = parse_id(&id)?;
  let count = state
    .store
    .increment_hits(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;
  Ok(Json(json!({ "hit_count": count })))
}
