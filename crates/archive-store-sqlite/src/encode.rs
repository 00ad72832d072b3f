//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that text order is
//! time order. Tag collections are compact JSON arrays. UUIDs are hyphenated
//! lowercase strings.

use archive_core::{
  chapter::{Chapter, ChapterFormat},
  comment::Comment,
  work::{Rating, Tags, Work},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_tags(tags: &[String]) -> Result<String> { Ok(serde_json::to_string(tags)?) }

pub fn decode_tags(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

fn decode_count(column: &'static str, value: i64) -> Result<u64> {
  u64::try_from(value).map_err(|_| Error::Corrupt { column, value })
}

fn decode_small(column: &'static str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::Corrupt { column, value })
}

/// The position of a chapter appended after `existing` ones.
pub fn next_position(existing: i64) -> Result<u32> {
  decode_small("position", existing.saturating_add(1))
}

// ─── Works ────────────────────────────────────────────────────────────────────

/// Column list matching [`RawWork::from_row`].
pub const WORK_COLUMNS: &str = "work_id, title, author, summary, rating, fandoms, relationships, \
   characters, freeforms, word_count, chapter_count, kudos_count, hit_count, created_at, updated_at";

/// A work encoded into owned column values, ready to move into a
/// `tokio_rusqlite` closure.
pub struct WorkRow {
  pub work_id:       String,
  pub title:         String,
  pub author:        String,
  pub summary:       String,
  pub rating:        String,
  pub fandoms:       String,
  pub relationships: String,
  pub characters:    String,
  pub freeforms:     String,
  pub word_count:    i64,
  pub chapter_count: i64,
  pub kudos_count:   i64,
  pub hit_count:     i64,
  pub created_at:    String,
  pub updated_at:    String,
}

impl WorkRow {
  pub fn encode(work: &Work) -> Result<Self> {
    Ok(WorkRow {
      work_id:       encode_uuid(work.work_id),
      title:         work.title.clone(),
      author:        work.author.clone(),
      summary:       work.summary.clone(),
      rating:        work.rating.as_ref().to_owned(),
      fandoms:       encode_tags(&work.tags.fandoms)?,
      relationships: encode_tags(&work.tags.relationships)?,
      characters:    encode_tags(&work.tags.characters)?,
      freeforms:     encode_tags(&work.tags.freeforms)?,
      word_count:    work.word_count as i64,
      chapter_count: i64::from(work.chapter_count),
      kudos_count:   work.kudos_count as i64,
      hit_count:     work.hit_count as i64,
      created_at:    encode_dt(work.created_at),
      updated_at:    encode_dt(work.updated_at),
    })
  }
}

/// Raw column values as read back from `works`.
pub struct RawWork {
  pub work_id:       String,
  pub title:         String,
  pub author:        String,
  pub summary:       String,
  pub rating:        String,
  pub fandoms:       String,
  pub relationships: String,
  pub characters:    String,
  pub freeforms:     String,
  pub word_count:    i64,
  pub chapter_count: i64,
  pub kudos_count:   i64,
  pub hit_count:     i64,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawWork {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawWork {
      work_id:       row.get(0)?,
      title:         row.get(1)?,
      author:        row.get(2)?,
      summary:       row.get(3)?,
      rating:        row.get(4)?,
      fandoms:       row.get(5)?,
      relationships: row.get(6)?,
      characters:    row.get(7)?,
      freeforms:     row.get(8)?,
      word_count:    row.get(9)?,
      chapter_count: row.get(10)?,
      kudos_count:   row.get(11)?,
      hit_count:     row.get(12)?,
      created_at:    row.get(13)?,
      updated_at:    row.get(14)?,
    })
  }

  pub fn into_work(self) -> Result<Work> {
    Ok(Work {
      work_id:       decode_uuid(&self.work_id)?,
      title:         self.title,
      author:        self.author,
      summary:       self.summary,
      rating:        Rating::parse(&self.rating)?,
      tags:          Tags {
        fandoms:       decode_tags(&self.fandoms)?,
        relationships: decode_tags(&self.relationships)?,
        characters:    decode_tags(&self.characters)?,
        freeforms:     decode_tags(&self.freeforms)?,
      },
      word_count:    decode_count("word_count", self.word_count)?,
      chapter_count: decode_small("chapter_count", self.chapter_count)?,
      kudos_count:   decode_count("kudos_count", self.kudos_count)?,
      hit_count:     decode_count("hit_count", self.hit_count)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Chapters ─────────────────────────────────────────────────────────────────

/// Column list matching [`RawChapter::from_row`].
pub const CHAPTER_COLUMNS: &str =
  "chapter_id, work_id, title, body, format, position, word_count, created_at";

pub struct RawChapter {
  pub chapter_id: String,
  pub work_id:    String,
  pub title:      Option<String>,
  pub body:       String,
  pub format:     String,
  pub position:   i64,
  pub word_count: i64,
  pub created_at: String,
}

impl RawChapter {
  pub fn encode(chapter: &Chapter) -> Self {
    RawChapter {
      chapter_id: encode_uuid(chapter.chapter_id),
      work_id:    encode_uuid(chapter.work_id),
      title:      chapter.title.clone(),
      body:       chapter.body.clone(),
      format:     chapter.format.as_ref().to_owned(),
      position:   i64::from(chapter.position),
      word_count: chapter.word_count as i64,
      created_at: encode_dt(chapter.created_at),
    }
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawChapter {
      chapter_id: row.get(0)?,
      work_id:    row.get(1)?,
      title:      row.get(2)?,
      body:       row.get(3)?,
      format:     row.get(4)?,
      position:   row.get(5)?,
      word_count: row.get(6)?,
      created_at: row.get(7)?,
    })
  }

  pub fn into_chapter(self) -> Result<Chapter> {
    Ok(Chapter {
      chapter_id: decode_uuid(&self.chapter_id)?,
      work_id:    decode_uuid(&self.work_id)?,
      title:      self.title,
      body:       self.body,
      format:     ChapterFormat::parse(&self.format)?,
      position:   decode_small("position", self.position)?,
      word_count: decode_count("word_count", self.word_count)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Comments ─────────────────────────────────────────────────────────────────

/// Column list matching [`RawComment::from_row`].
pub const COMMENT_COLUMNS: &str = "comment_id, work_id, name, authenticated, body, created_at";

pub struct RawComment {
  pub comment_id:    String,
  pub work_id:       String,
  pub name:          String,
  pub authenticated: bool,
  pub body:          String,
  pub created_at:    String,
}

impl RawComment {
  pub fn encode(comment: &Comment) -> Self {
    RawComment {
      comment_id:    encode_uuid(comment.comment_id),
      work_id:       encode_uuid(comment.work_id),
      name:          comment.name.clone(),
      authenticated: comment.authenticated,
      body:          comment.body.clone(),
      created_at:    encode_dt(comment.created_at),
    }
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawComment {
      comment_id:    row.get(0)?,
      work_id:       row.get(1)?,
      name:          row.get(2)?,
      authenticated: row.get(3)?,
      body:          row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:    decode_uuid(&self.comment_id)?,
      work_id:       decode_uuid(&self.work_id)?,
      name:          self.name,
      authenticated: self.authenticated,
      body:          self.body,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn next_position_rejects_overflow() {
    assert_eq!(next_position(0).unwrap(), 1);
    assert_eq!(next_position(2).unwrap(), 3);
    assert!(matches!(
      next_position(i64::from(u32::MAX)),
      Err(Error::Corrupt { column: "position", .. })
    ));
  }

  #[test]
  fn timestamps_sort_as_text() {
    let a = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    let c = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec, "{ea} {eb} {ec}");
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn negative_counter_is_corrupt() {
    assert!(matches!(
      decode_count("hit_count", -1),
      Err(Error::Corrupt { column: "hit_count", value: -1 })
    ));
  }
}
