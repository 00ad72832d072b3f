//! Handlers for `/works/:id/chapters` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/works/:id/chapters` | Body: [`CreateBody`]; owner only; 201 + chapter |
//! | `GET`  | `/works/:id/chapters/:chapter_id` | Chapter with its neighbours |

use archive_core::{chapter::NewChapter, store::ArchiveStore, work::Work};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  view::ChapterView,
  works::{parse_format, parse_id, require_owner, required},
};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub edit_token: Option<String>,
  pub title:      Option<String>,
  pub body:       Option<String>,
  pub format:     Option<String>,
}

/// `POST /works/:id/chapters`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ArchiveStore,
{
  let Json(body) = body?;
  required(body.body.as_deref(), "chapter content is required")?;
  let format = parse_format(body.format.as_deref())?;

  let id = require_owner(state.store.as_ref(), &id, body.edit_token.as_deref()).await?;

  let new_chapter = NewChapter::new(body.title.as_deref(), body.body.unwrap_or_default(), format);
  let chapter = state
    .store
    .add_chapter(id, new_chapter)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;

  tracing::info!(work_id = %id, position = chapter.position, "chapter added");
  Ok((StatusCode::CREATED, Json(json!({ "chapter": ChapterView::from(chapter) }))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChapterPage {
  pub work:                Work,
  pub chapter:             ChapterView,
  pub previous_chapter_id: Option<Uuid>,
  pub next_chapter_id:     Option<Uuid>,
}

/// `GET /works/:id/chapters/:chapter_id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path((id, chapter_id)): Path<(String, String)>,
) -> Result<Json<ChapterPage>, ApiError>
where
  S: ArchiveStore,
{
  let id = parse_id(&id)?;
  let work = state
    .store
    .get_work(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;

  let chapter_not_found = || ApiError::NotFound("chapter not found".into());
  let chapter_id = Uuid::parse_str(&chapter_id).map_err(|_| chapter_not_found())?;

  let mut chapters = state.store.list_chapters(id).await.map_err(ApiError::store)?;
  let index = chapters
    .iter()
    .position(|c| c.chapter_id == chapter_id)
    .ok_or_else(chapter_not_found)?;

  let previous_chapter_id = index.checked_sub(1).map(|i| chapters[i].chapter_id);
  let next_chapter_id = chapters.get(index + 1).map(|c| c.chapter_id);
  let chapter = chapters.swap_remove(index);

  Ok(Json(ChapterPage {
    work,
    chapter: chapter.into(),
    previous_chapter_id,
    next_chapter_id,
  }))
}
