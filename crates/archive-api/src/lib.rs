//! JSON API for the story archive.
//!
//! Exposes an axum [`Router`] backed by any [`ArchiveStore`]. TLS, sign-in
//! and transport concerns are the caller's responsibility; a signed-in
//! display name arrives through a trusted header (see [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", archive_api::api_router(state))
//! ```

pub mod captcha;
pub mod chapters;
pub mod comments;
pub mod counters;
pub mod error;
pub mod identity;
pub mod tags;
pub mod works;

mod view;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use archive_core::store::ArchiveStore;
use axum::{
  Router,
  http::HeaderName,
  routing::{get, post},
};

pub use captcha::Captcha;
pub use error::ApiError;

/// Shared handler state.
pub struct AppState<S> {
  pub store:           Arc<S>,
  pub captcha:         Arc<Captcha>,
  /// Header carrying the signed-in display name; `None` disables sign-in.
  pub identity_header: Option<HeaderName>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, captcha: Arc::new(Captcha::Disabled), identity_header: None }
  }

  pub fn with_captcha(mut self, captcha: Captcha) -> Self {
    self.captcha = Arc::new(captcha);
    self
  }

  pub fn with_identity_header(mut self, header: HeaderName) -> Self {
    self.identity_header = Some(header);
    self
  }
}

// Derived `Clone` would demand `S: Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      captcha:         Arc::clone(&self.captcha),
      identity_header: self.identity_header.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ArchiveStore + 'static,
{
  Router::new()
    // Works
    .route("/works", get(works::list::<S>).post(works::create::<S>))
    .route(
      "/works/{id}",
      get(works::get_one::<S>)
        .put(works::update::<S>)
        .delete(works::delete::<S>),
    )
    // Chapters
    .route("/works/{id}/chapters", post(chapters::create::<S>))
    .route("/works/{id}/chapters/{chapter_id}", get(chapters::get_one::<S>))
    // Comments
    .route(
      "/works/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    // Counters
    .route("/works/{id}/kudos", post(counters::kudos::<S>))
    .route("/works/{id}/hits", post(counters::hits::<S>))
    // Tags
    .route("/tags", get(tags::handler::<S>))
    .with_state(state)
}
