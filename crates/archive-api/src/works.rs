//! Handlers for `/works` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/works` | Optional `?tag`, `?q`, `?page` |
//! | `POST`   | `/works` | Body: [`CreateBody`]; 201 + work, first chapter, edit token |
//! | `GET`    | `/works/:id` | Work with rendered chapters |
//! | `PUT`    | `/works/:id` | Body: [`UpdateBody`]; owner only |
//! | `DELETE` | `/works/:id` | Body: `{"edit_token":"..."}`; owner only |

use archive_core::{
  browse::{self, Page, WorkQuery},
  chapter::{ChapterFormat, NewChapter},
  store::ArchiveStore,
  token::{OwnershipToken, authorize},
  work::{NewWork, Rating, TagCategory, Tags, Work, WorkPatch, display_name_or_anonymous},
};
use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, view::ChapterView};

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Path ids that are not UUIDs cannot name a stored work.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::work_not_found())
}

/// A trimmed, non-blank required text field.
pub(crate) fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .ok_or_else(|| ApiError::BadRequest(message.to_owned()))
}

/// An optional format discriminator; blank means the default.
pub(crate) fn parse_format(value: Option<&str>) -> Result<ChapterFormat, ApiError> {
  match value.map(str::trim).filter(|v| !v.is_empty()) {
    None => Ok(ChapterFormat::default()),
    Some(v) => ChapterFormat::parse(v)
      .map_err(|_| ApiError::BadRequest("invalid chapter format".into())),
  }
}

fn parse_rating(value: &str) -> Result<Rating, ApiError> {
  Rating::parse(value).map_err(|_| ApiError::BadRequest("invalid rating".into()))
}

/// Check `supplied` against the stored digest of the work named by `raw_id`
/// and return its id.
///
/// A missing token is refused before the id is looked at, so a malformed id
/// answers like any other unknown work: 401 without a token, 404 with one.
pub(crate) async fn require_owner<S>(
  store: &S,
  raw_id: &str,
  supplied: Option<&str>,
) -> Result<Uuid, ApiError>
where
  S: ArchiveStore,
{
  let id = Uuid::parse_str(raw_id).ok();
  let stored = match id {
    Some(id) => store.token_hash(id).await.map_err(ApiError::store)?,
    None => None,
  };
  authorize(stored.as_ref(), supplied).map_err(|denied| {
    tracing::warn!(work_id = raw_id, reason = %denied, "ownership check refused");
    ApiError::from(denied)
  })?;
  // Authorized implies a digest was found under a parsed id.
  id.ok_or_else(ApiError::work_not_found)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub tag:  Option<String>,
  pub q:    Option<String>,
  /// Unparseable values fall back to the first page.
  pub page: Option<String>,
}

/// `GET /works[?tag=<tag>][&q=<text>][&page=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Work>>, ApiError>
where
  S: ArchiveStore,
{
  let works = state.store.list_works().await.map_err(ApiError::store)?;
  let query = WorkQuery {
    tag:  params.tag,
    q:    params.q,
    page: params.page.as_deref().and_then(|p| p.trim().parse().ok()),
  };
  Ok(Json(browse::browse(works, &query)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:          Option<String>,
  pub author:         Option<String>,
  pub summary:        Option<String>,
  pub rating:         Option<String>,
  #[serde(default)]
  pub fandoms:        Vec<String>,
  #[serde(default)]
  pub relationships:  Vec<String>,
  #[serde(default)]
  pub characters:     Vec<String>,
  #[serde(default)]
  pub freeforms:      Vec<String>,
  pub chapter_title:  Option<String>,
  pub chapter_body:   Option<String>,
  pub chapter_format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
  pub work:       Work,
  pub chapter:    ChapterView,
  /// Shown exactly once; only its digest is kept.
  pub edit_token: String,
}

/// `POST /works`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ArchiveStore,
{
  let Json(body) = body?;

  let title = required(body.title.as_deref(), "title is required")?;
  required(body.chapter_body.as_deref(), "chapter content is required")?;
  let rating = match body.rating.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
    None => Rating::default(),
    Some(r) => parse_rating(r)?,
  };
  let format = parse_format(body.chapter_format.as_deref())?;

  let new_work = NewWork::new(
    title,
    body.author.as_deref(),
    body.summary.as_deref(),
    rating,
    Tags {
      fandoms:       body.fandoms,
      relationships: body.relationships,
      characters:    body.characters,
      freeforms:     body.freeforms,
    },
  );
  // The raw body is stored; only the emptiness check trims it.
  let chapter = NewChapter::new(
    body.chapter_title.as_deref(),
    body.chapter_body.unwrap_or_default(),
    format,
  );

  let token = OwnershipToken::generate();
  let (work, chapter) = state
    .store
    .create_work(new_work, chapter, token.hash())
    .await
    .map_err(ApiError::store)?;

  tracing::info!(work_id = %work.work_id, "work created");
  Ok((
    StatusCode::CREATED,
    Json(CreateResponse { work, chapter: chapter.into(), edit_token: token.into_string() }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct WorkDetail {
  pub work:     Work,
  pub chapters: Vec<ChapterView>,
}

/// `GET /works/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<WorkDetail>, ApiError>
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
  let chapters = state.store.list_chapters(id).await.map_err(ApiError::store)?;

  Ok(Json(WorkDetail {
    work,
    chapters: chapters.into_iter().map(ChapterView::from).collect(),
  }))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// Only these fields are patchable; anything else in the body is ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub edit_token:    Option<String>,
  pub title:         Option<String>,
  pub author:        Option<String>,
  pub summary:       Option<String>,
  pub rating:        Option<String>,
  pub fandoms:       Option<Vec<String>>,
  pub relationships: Option<Vec<String>>,
  pub characters:    Option<Vec<String>>,
  pub freeforms:     Option<Vec<String>>,
}

impl UpdateBody {
  fn into_patch(self) -> Result<(Option<String>, WorkPatch), ApiError> {
    let title = match self.title.as_deref() {
      Some(t) => Some(required(Some(t), "title cannot be blank")?.to_owned()),
      None => None,
    };
    let rating = self.rating.as_deref().map(parse_rating).transpose()?;

    let tags = [
      (TagCategory::Fandoms, self.fandoms),
      (TagCategory::Relationships, self.relationships),
      (TagCategory::Characters, self.characters),
      (TagCategory::Freeforms, self.freeforms),
    ]
    .into_iter()
    .filter_map(|(category, tags)| tags.map(|t| (category, t)))
    .collect();

    let patch = WorkPatch {
      title,
      author: self.author.as_deref().map(|a| display_name_or_anonymous(Some(a))),
      summary: self.summary.map(|s| s.trim().to_owned()),
      rating,
      tags,
    };
    Ok((self.edit_token, patch))
  }
}

/// `PUT /works/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ArchiveStore,
{
  let Json(body) = body?;
  let (edit_token, patch) = body.into_patch()?;

  let id = require_owner(state.store.as_ref(), &id, edit_token.as_deref()).await?;

  let work = state
    .store
    .update_work(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;

  tracing::info!(work_id = %id, "work updated");
  Ok(Json(json!({ "work": work })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
  pub edit_token: Option<String>,
}

/// `DELETE /works/:id`, body: `{"edit_token":"..."}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  body: Result<Json<DeleteBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ArchiveStore,
{
  // A request with no JSON body simply carries no token.
  let edit_token = match body {
    Ok(Json(body)) => body.edit_token,
    Err(JsonRejection::MissingJsonContentType(_)) => None,
    Err(rejection) => return Err(rejection.into()),
  };

  let id = require_owner(state.store.as_ref(), &id, edit_token.as_deref()).await?;

  if !state.store.delete_work(id).await.map_err(ApiError::store)? {
    return Err(ApiError::work_not_found());
  }

  tracing::info!(work_id = %id, "work deleted");
  Ok(Json(json!({ "success": true })))
}
