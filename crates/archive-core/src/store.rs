//! The `ArchiveStore` trait.
//!
//! The trait is implemented by storage backends (`archive-store-sqlite`,
//! `archive-store-json`). The HTTP layer depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  chapter::{Chapter, NewChapter},
  comment::{Comment, NewComment},
  token::TokenHash,
  work::{NewWork, Work, WorkPatch},
};

/// Abstraction over an archive storage backend.
///
/// Every mutation is atomic with respect to readers. Deleting a work removes
/// its chapters and comments with it; no orphans may remain.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ArchiveStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Works ─────────────────────────────────────────────────────────────

  /// Persist a new work together with its first chapter (position 1).
  /// Either both are stored or neither is.
  fn create_work(
    &self,
    work: NewWork,
    first_chapter: NewChapter,
    token_hash: TokenHash,
  ) -> impl Future<Output = Result<(Work, Chapter), Self::Error>> + Send + '_;

  /// Retrieve a work by UUID. Returns `None` if not found.
  fn get_work(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Work>, Self::Error>> + Send + '_;

  /// Every stored work, in no particular order.
  fn list_works(&self) -> impl Future<Output = Result<Vec<Work>, Self::Error>> + Send + '_;

  /// Apply `patch` and bump `updated_at`. Returns `None` if not found.
  fn update_work(
    &self,
    id: Uuid,
    patch: WorkPatch,
  ) -> impl Future<Output = Result<Option<Work>, Self::Error>> + Send + '_;

  /// Delete a work and everything it owns. Returns `false` if not found.
  fn delete_work(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The stored ownership digest for a work, `None` if the work does not exist.
  fn token_hash(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TokenHash>, Self::Error>> + Send + '_;

  // ── Chapters ──────────────────────────────────────────────────────────

  /// Append a chapter at position `count + 1`, then recompute the work's
  /// word and chapter counts from all of its chapters. Returns `None` if the
  /// work does not exist.
  fn add_chapter(
    &self,
    work_id: Uuid,
    chapter: NewChapter,
  ) -> impl Future<Output = Result<Option<Chapter>, Self::Error>> + Send + '_;

  /// A work's chapters ordered by position.
  fn list_chapters(
    &self,
    work_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Chapter>, Self::Error>> + Send + '_;

  fn get_chapter(
    &self,
    work_id: Uuid,
    chapter_id: Uuid,
  ) -> impl Future<Output = Result<Option<Chapter>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Returns `None` if the work does not exist.
  fn add_comment(
    &self,
    comment: NewComment,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// A work's comments, oldest first.
  fn list_comments(
    &self,
    work_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Counters ──────────────────────────────────────────────────────────

  /// Returns the new kudos count, or `None` if the work does not exist.
  fn increment_kudos(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send + '_;

  /// Returns the new hit count, or `None` if the work does not exist.
  fn increment_hits(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send + '_;
}
