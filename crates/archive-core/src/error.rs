//! Error types for `archive-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown rating: {0:?}")]
  UnknownRating(String),

  #[error("unknown chapter format: {0:?}")]
  UnknownFormat(String),

  #[error("malformed token hash: {0}")]
  MalformedTokenHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
