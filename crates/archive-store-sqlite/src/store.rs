//! [`SqliteStore`], the SQLite implementation of [`ArchiveStore`].

use std::path::Path;

use archive_core::{
  chapter::{Chapter, NewChapter},
  comment::{Comment, NewComment},
  store::ArchiveStore,
  token::TokenHash,
  work::{NewWork, Work, WorkPatch},
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    CHAPTER_COLUMNS, COMMENT_COLUMNS, RawChapter, RawComment, RawWork, WORK_COLUMNS, WorkRow,
    encode_dt, encode_uuid, next_position,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An archive store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "sqlite store ready");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Bump one counter column and return its new value.
  async fn increment(&self, id: Uuid, column: &'static str) -> Result<Option<u64>> {
    let id_str = encode_uuid(id);
    let value: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE works SET {column} = {column} + 1 WHERE work_id = ?1 RETURNING {column}"
              ),
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    value
      .map(|v| u64::try_from(v).map_err(|_| Error::Corrupt { column, value: v }))
      .transpose()
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn insert_work(conn: &Connection, row: &WorkRow, token_hash: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO works (
       work_id, title, author, summary, rating,
       fandoms, relationships, characters, freeforms, token_hash,
       word_count, chapter_count, kudos_count, hit_count, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    rusqlite::params![
      row.work_id,
      row.title,
      row.author,
      row.summary,
      row.rating,
      row.fandoms,
      row.relationships,
      row.characters,
      row.freeforms,
      token_hash,
      row.word_count,
      row.chapter_count,
      row.kudos_count,
      row.hit_count,
      row.created_at,
      row.updated_at,
    ],
  )?;
  Ok(())
}

fn insert_chapter(conn: &Connection, row: &RawChapter) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO chapters (
       chapter_id, work_id, title, body, format, position, word_count, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      row.chapter_id,
      row.work_id,
      row.title,
      row.body,
      row.format,
      row.position,
      row.word_count,
      row.created_at,
    ],
  )?;
  Ok(())
}

fn work_exists(conn: &Connection, id_str: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM works WHERE work_id = ?1",
        rusqlite::params![id_str],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Carry a store-level error out of a `tokio_rusqlite` closure.
fn other(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

// ─── ArchiveStore impl ───────────────────────────────────────────────────────

impl ArchiveStore for SqliteStore {
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

    let work_row = WorkRow::encode(&work)?;
    let chapter_row = RawChapter::encode(&chapter);
    let hash_str = token_hash.to_hex();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_work(&tx, &work_row, &hash_str)?;
        insert_chapter(&tx, &chapter_row)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok((work, chapter))
  }

  async fn get_work(&self, id: Uuid) -> Result<Option<Work>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawWork> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {WORK_COLUMNS} FROM works WHERE work_id = ?1"),
              rusqlite::params![id_str],
              RawWork::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawWork::into_work).transpose()
  }

  async fn list_works(&self) -> Result<Vec<Work>> {
    let raws: Vec<RawWork> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {WORK_COLUMNS} FROM works"))?;
        let rows = stmt
          .query_map([], RawWork::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWork::into_work).collect()
  }

  async fn update_work(&self, id: Uuid, patch: WorkPatch) -> Result<Option<Work>> {
    let id_str = encode_uuid(id);
    let now = Utc::now();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!("SELECT {WORK_COLUMNS} FROM works WHERE work_id = ?1"),
            rusqlite::params![id_str],
            RawWork::from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(None);
        };

        let mut work = raw.into_work().map_err(other)?;
        work.apply(patch, now);
        let row = WorkRow::encode(&work).map_err(other)?;

        tx.execute(
          "UPDATE works SET
             title = ?2, author = ?3, summary = ?4, rating = ?5,
             fandoms = ?6, relationships = ?7, characters = ?8, freeforms = ?9,
             updated_at = ?10
           WHERE work_id = ?1",
          rusqlite::params![
            row.work_id,
            row.title,
            row.author,
            row.summary,
            row.rating,
            row.fandoms,
            row.relationships,
            row.characters,
            row.freeforms,
            row.updated_at,
          ],
        )?;
        tx.commit()?;
        Ok(Some(work))
      })
      .await?;

    Ok(updated)
  }

  async fn delete_work(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM comments WHERE work_id = ?1", rusqlite::params![id_str])?;
        tx.execute("DELETE FROM chapters WHERE work_id = ?1", rusqlite::params![id_str])?;
        let n = tx.execute("DELETE FROM works WHERE work_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn token_hash(&self, id: Uuid) -> Result<Option<TokenHash>> {
    let id_str = encode_uuid(id);

    let hex: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT token_hash FROM works WHERE work_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(hex.map(|h| TokenHash::from_hex(&h)).transpose()?)
  }

  // ── Chapters ──────────────────────────────────────────────────────────────

  async fn add_chapter(&self, work_id: Uuid, new_chapter: NewChapter) -> Result<Option<Chapter>> {
    let id_str = encode_uuid(work_id);
    let now = Utc::now();
    let now_str = encode_dt(now);

    let chapter = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !work_exists(&tx, &id_str)? {
          return Ok(None);
        }

        let existing: i64 = tx.query_row(
          "SELECT COUNT(*) FROM chapters WHERE work_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        let position = next_position(existing).map_err(other)?;
        let chapter = Chapter::from_new(new_chapter, work_id, position, now);
        insert_chapter(&tx, &RawChapter::encode(&chapter))?;

        tx.execute(
          "UPDATE works SET
             word_count    = (SELECT COALESCE(SUM(word_count), 0) FROM chapters WHERE work_id = ?1),
             chapter_count = (SELECT COUNT(*) FROM chapters WHERE work_id = ?1),
             updated_at    = ?2
           WHERE work_id = ?1",
          rusqlite::params![id_str, now_str],
        )?;
        tx.commit()?;
        Ok(Some(chapter))
      })
      .await?;

    Ok(chapter)
  }

  async fn list_chapters(&self, work_id: Uuid) -> Result<Vec<Chapter>> {
    let id_str = encode_uuid(work_id);

    let raws: Vec<RawChapter> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE work_id = ?1 ORDER BY position"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawChapter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChapter::into_chapter).collect()
  }

  async fn get_chapter(&self, work_id: Uuid, chapter_id: Uuid) -> Result<Option<Chapter>> {
    let work_str = encode_uuid(work_id);
    let chapter_str = encode_uuid(chapter_id);

    let raw: Option<RawChapter> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE work_id = ?1 AND chapter_id = ?2"
              ),
              rusqlite::params![work_str, chapter_str],
              RawChapter::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawChapter::into_chapter).transpose()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, new_comment: NewComment) -> Result<Option<Comment>> {
    let comment = Comment::from_new(new_comment, Utc::now());
    let row = RawComment::encode(&comment);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !work_exists(&tx, &row.work_id)? {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO comments (comment_id, work_id, name, authenticated, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            row.comment_id,
            row.work_id,
            row.name,
            row.authenticated,
            row.body,
            row.created_at,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(inserted.then_some(comment))
  }

  async fn list_comments(&self, work_id: Uuid) -> Result<Vec<Comment>> {
    let id_str = encode_uuid(work_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments WHERE work_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn increment_kudos(&self, id: Uuid) -> Result<Option<u64>> {
    self.increment(id, "kudos_count").await
  }

  async fn increment_hits(&self, id: Uuid) -> Result<Option<u64>> {
    self.increment(id, "hit_count").await
  }
}
