//! Error type for `archive-store-json`.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed collection {path}: {source}")]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("work {work_id} cannot hold another chapter")]
  ChapterLimit { work_id: Uuid },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
