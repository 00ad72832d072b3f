//! [`JsonStore`], the flat-file implementation of [`ArchiveStore`].

use std::{path::PathBuf, sync::Arc};

use archive_core::{
  chapter::{Chapter, ChapterStats, NewChapter},
  comment::{Comment, NewComment},
  store::ArchiveStore,
  token::TokenHash,
  work::{NewWork, Work, WorkPatch},
};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
  Error, Result,
  files::{CHAPTERS, COMMENTS, WORKS, ensure_dir, read_collection, write_collection},
  record::WorkRecord,
};

/// An archive store kept as JSON files in one directory.
///
/// Cloning is cheap; clones share the write lock.
#[derive(Clone)]
pub struct JsonStore {
  dir:        Arc<PathBuf>,
  write_lock: Arc<Mutex<()>>,
}

impl JsonStore {
  /// Use `dir` as the data directory, creating it if needed.
  pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    ensure_dir(&dir).await?;
    tracing::debug!(dir = %dir.display(), "json store ready");
    Ok(Self { dir: Arc::new(dir), write_lock: Arc::new(Mutex::new(())) })
  }

  async fn works(&self) -> Result<Vec<WorkRecord>> { read_collection(&self.dir, WORKS).await }

  async fn chapters(&self) -> Result<Vec<Chapter>> { read_collection(&self.dir, CHAPTERS).await }

  async fn comments(&self) -> Result<Vec<Comment>> { read_collection(&self.dir, COMMENTS).await }

  /// Bump one counter on a work and return its new value.
  async fn increment(&self, id: Uuid, counter: fn(&mut Work) -> &mut u64) -> Result<Option<u64>> {
    let _guard = self.write_lock.lock().await;
    let mut works = self.works().await?;
    let Some(record) = works.iter_mut().find(|r| r.work.work_id == id) else {
      return Ok(None);
    };
    let slot = counter(&mut record.work);
    *slot += 1;
    let value = *slot;
    write_collection(&self.dir, WORKS, &works).await?;
    Ok(Some(value))
  }

  /// Replace chapters, then works. If the works write fails, the previous
  /// chapters are written back so no chapter outlives a failed work update.
  async fn write_chapters_then_works(
    &self,
    previous: &[Chapter],
    chapters: &[Chapter],
    works: &[WorkRecord],
  ) -> Result<()> {
    write_collection(&self.dir, CHAPTERS, chapters).await?;
    if let Err(e) = write_collection(&self.dir, WORKS, works).await {
      if let Err(restore) = write_collection(&self.dir, CHAPTERS, previous).await {
        tracing::error!(error = %restore, "failed to restore chapters after a failed write");
      }
      return Err(e);
    }
    Ok(())
  }
}

/// The position of a chapter appended after `existing` ones.
pub(crate) fn next_position(work_id: Uuid, existing: usize) -> Result<u32> {
  u32::try_from(existing)
    .ok()
    .and_then(|n| n.checked_add(1))
    .ok_or(Error::ChapterLimit { work_id })
}

impl ArchiveStore for JsonStore {
  type Error = Error;

  // ── Works ─────────────────────────────────────────────────────────────────

  async fn create_work(
    &self,
    new_work: NewWork,
    first_chapter: NewChapter,
    token_hash: TokenHash,
  ) -> Result<(Work, Chapter)> {
    let now = Utc::now();
    let work = Work::from_new(new_work, first_chapter.word_count(), now);
    let chapter = Chapter::from_new(first_chapter, work.work_id, 1, now);

    let _guard = self.write_lock.lock().await;

    // Both collections are read before either is written. The chapter lands
    // first, so a visible work always has its first chapter.
    let previous = self.chapters().await?;
    let mut works = self.works().await?;
    let mut chapters = previous.clone();
    chapters.push(chapter.clone());
    works.push(WorkRecord { work: work.clone(), token_hash });
    self.write_chapters_then_works(&previous, &chapters, &works).await?;

    Ok((work, chapter))
  }

  async fn get_work(&self, id: Uuid) -> Result<Option<Work>> {
    Ok(
      self
        .works()
        .await?
        .into_iter()
        .find(|r| r.work.work_id == id)
        .map(|r| r.work),
    )
  }

  async fn list_works(&self) -> Result<Vec<Work>> {
    Ok(self.works().await?.into_iter().map(|r| r.work).collect())
  }

  async fn update_work(&self, id: Uuid, patch: WorkPatch) -> Result<Option<Work>> {
    let _guard = self.write_lock.lock().await;
    let mut works = self.works().await?;
    let Some(record) = works.iter_mut().find(|r| r.work.work_id == id) else {
      return Ok(None);
    };
    record.work.apply(patch, Utc::now());
    let updated = record.work.clone();
    write_collection(&self.dir, WORKS, &works).await?;
    Ok(Some(updated))
  }

  async fn delete_work(&self, id: Uuid) -> Result<bool> {
    let _guard = self.write_lock.lock().await;
    let mut works = self.works().await?;
    if !works.iter().any(|r| r.work.work_id == id) {
      return Ok(false);
    }

    // Children first: an interrupted delete leaves a work missing some
    // children, never children without a work.
    let mut comments = self.comments().await?;
    comments.retain(|c| c.work_id != id);
    write_collection(&self.dir, COMMENTS, &comments).await?;

    let mut chapters = self.chapters().await?;
    chapters.retain(|c| c.work_id != id);
    write_collection(&self.dir, CHAPTERS, &chapters).await?;

    works.retain(|r| r.work.work_id != id);
    write_collection(&self.dir, WORKS, &works).await?;
    Ok(true)
  }

  async fn token_hash(&self, id: Uuid) -> Result<Option<TokenHash>> {
    Ok(
      self
        .works()
        .await?
        .into_iter()
        .find(|r| r.work.work_id == id)
        .map(|r| r.token_hash),
    )
  }

  // ── Chapters ──────────────────────────────────────────────────────────────

  async fn add_chapter(&self, work_id: Uuid, new_chapter: NewChapter) -> Result<Option<Chapter>> {
    let _guard = self.write_lock.lock().await;
    let mut works = self.works().await?;
    let Some(record) = works.iter_mut().find(|r| r.work.work_id == work_id) else {
      return Ok(None);
    };

    let now = Utc::now();
    let previous = self.chapters().await?;
    let existing = previous.iter().filter(|c| c.work_id == work_id).count();
    let chapter = Chapter::from_new(new_chapter, work_id, next_position(work_id, existing)?, now);
    let mut chapters = previous.clone();
    chapters.push(chapter.clone());

    let stats = ChapterStats::of(chapters.iter().filter(|c| c.work_id == work_id));
    record.work.word_count = stats.word_count;
    record.work.chapter_count = stats.chapter_count;
    record.work.updated_at = now;
    self.write_chapters_then_works(&previous, &chapters, &works).await?;

    Ok(Some(chapter))
  }

  async fn list_chapters(&self, work_id: Uuid) -> Result<Vec<Chapter>> {
    let mut chapters: Vec<Chapter> = self
      .chapters()
      .await?
      .into_iter()
      .filter(|c| c.work_id == work_id)
      .collect();
    chapters.sort_by_key(|c| c.position);
    Ok(chapters)
  }

  async fn get_chapter(&self, work_id: Uuid, chapter_id: Uuid) -> Result<Option<Chapter>> {
    Ok(
      self
        .chapters()
        .await?
        .into_iter()
        .find(|c| c.work_id == work_id && c.chapter_id == chapter_id),
    )
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, new_comment: NewComment) -> Result<Option<Comment>> {
    let _guard = self.write_lock.lock().await;
    let works = self.works().await?;
    if !works.iter().any(|r| r.work.work_id == new_comment.work_id) {
      return Ok(None);
    }

    let comment = Comment::from_new(new_comment, Utc::now());
    let mut comments = self.comments().await?;
    comments.push(comment.clone());
    write_collection(&self.dir, COMMENTS, &comments).await?;
    Ok(Some(comment))
  }

  async fn list_comments(&self, work_id: Uuid) -> Result<Vec<Comment>> {
    let mut comments: Vec<Comment> = self
      .comments()
      .await?
      .into_iter()
      .filter(|c| c.work_id == work_id)
      .collect();
    // Stable: equal timestamps keep insertion order.
    comments.sort_by_key(|c| c.created_at);
    Ok(comments)
  }

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn increment_kudos(&self, id: Uuid) -> Result<Option<u64>> {
    self.increment(id, |w| &mut w.kudos_count).await
  }

  async fn increment_hits(&self, id: Uuid) -> Result<Option<u64>> {
    self.increment(id, |w| &mut w.hit_count).await
  }
}
