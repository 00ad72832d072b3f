//! API error type and [`axum::response::IntoResponse`] implementation.

use archive_core::token::Denied;
use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::captcha::CaptchaError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// An outbound dependency (the captcha verifier) failed.
  #[error("upstream error: {0}")]
  Upstream(#[from] CaptchaError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }

  pub(crate) fn work_not_found() -> Self { ApiError::NotFound("work not found".into()) }
}

impl From<Denied> for ApiError {
  fn from(denied: Denied) -> Self {
    let message = denied.to_string();
    match denied {
      Denied::MissingToken => ApiError::Unauthorized(message),
      Denied::NotFound => ApiError::NotFound(message),
      Denied::Forbidden => ApiError::Forbidden(message),
    }
  }
}

/// Malformed or mistyped request bodies are client-input errors.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Upstream(e) => {
        tracing::error!(error = %e, "captcha verifier failed");
        (StatusCode::BAD_GATEWAY, "captcha verification unavailable".to_owned())
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
