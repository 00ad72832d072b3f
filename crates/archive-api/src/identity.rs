//! Signed-in identity, asserted by an authenticating reverse proxy.
//!
//! The API never authenticates anyone itself. When a trusted header name is
//! configured, a non-blank value of that header is taken as the caller's
//! display name. Identity only changes how comments are attributed; it
//! grants nothing on works.

use std::convert::Infallible;

use archive_core::store::ArchiveStore;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppState;

/// The signed-in display name, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub Option<String>);

impl<S> FromRequestParts<AppState<S>> for Identity
where
  S: ArchiveStore + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let name = state
      .identity_header
      .as_ref()
      .and_then(|header| parts.headers.get(header))
      // Proxies may forward UTF-8 names; `to_str` would reject them.
      .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
      .map(str::trim)
      .filter(|name| !name.is_empty())
      .map(str::to_owned);
    Ok(Identity(name))
  }
}
