//! Whole-collection reads and atomic replacement writes.

use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

pub const WORKS: &str = "works.json";
pub const CHAPTERS: &str = "chapters.json";
pub const COMMENTS: &str = "comments.json";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::Io { path: path.to_owned(), source }
}

/// Read every record of a collection. A missing file is an empty
/// collection; anything else that goes wrong is an error.
pub async fn read_collection<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
  let path = dir.join(file);
  let bytes = match tokio::fs::read(&path).await {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(io_error(&path)(e)),
  };
  serde_json::from_slice(&bytes).map_err(|source| Error::Json { path, source })
}

/// Replace a collection: write a uniquely named temporary sibling, then
/// rename it over the target.
pub async fn write_collection<T: Serialize>(dir: &Path, file: &str, records: &[T]) -> Result<()> {
  let path = dir.join(file);
  let tmp: PathBuf = dir.join(format!("{file}.tmp.{}", Uuid::new_v4()));

  let mut bytes = serde_json::to_vec_pretty(records).map_err(|source| Error::Json {
    path: path.clone(),
    source,
  })?;
  bytes.push(b'\n');

  tokio::fs::write(&tmp, &bytes).await.map_err(io_error(&tmp))?;
  if let Err(e) = tokio::fs::rename(&tmp, &path).await {
    let _ = tokio::fs::remove_file(&tmp).await;
    return Err(io_error(&path)(e));
  }
  Ok(())
}

pub async fn ensure_dir(dir: &Path) -> Result<()> {
  tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))
}
