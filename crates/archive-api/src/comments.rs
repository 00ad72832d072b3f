//! Handlers for `/works/:id/comments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/works/:id/comments` | Oldest first |
//! | `POST` | `/works/:id/comments` | Body: [`CreateBody`]; anonymous callers need a captcha token |

use archive_core::{comment::NewComment, store::ArchiveStore};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  error::ApiError,
  identity::Identity,
  works::{parse_id, required},
};

/// `GET /works/:id/comments`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: ArchiveStore,
{
  let id = parse_id(&id)?;
  state
    .store
    .get_work(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;
  let comments = state.store.list_comments(id).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "comments": comments })))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Ignored for signed-in callers, who post under their verified name.
  pub name:          Option<String>,
  pub body:          Option<String>,
  pub captcha_token: Option<String>,
}

/// `POST /works/:id/comments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Identity(signed_in): Identity,
  Path(id): Path<String>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ArchiveStore,
{
  let id = parse_id(&id)?;
  let Json(body) = body?;
  let text = required(body.body.as_deref(), "comment body is required")?;

  let captcha_token = match (&signed_in, state.captcha.is_enabled()) {
    (None, true) => Some(
      body
        .captcha_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("captcha token is required".into()))?,
    ),
    _ => None,
  };

  state
    .store
    .get_work(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;

  if let Some(token) = captcha_token
    && !state.captcha.verify(token).await?
  {
    tracing::warn!(work_id = %id, "captcha rejected");
    return Err(ApiError::Forbidden("captcha verification failed".into()));
  }

  let new_comment = match &signed_in {
    Some(display_name) => NewComment::signed_in(id, display_name, text),
    None => NewComment::anonymous(id, body.name.as_deref(), text),
  };
  let comment = state
    .store
    .add_comment(new_comment)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(ApiError::work_not_found)?;

  tracing::info!(work_id = %id, authenticated = comment.authenticated, "comment posted");
  Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}
