//! Chapters: the ordered units of a work's content.
//!
//! Positions are 1-based and dense within a work. A position is assigned once,
//! at creation, as the count of existing chapters plus one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// How a chapter body is interpreted when rendered.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChapterFormat {
  /// Plain text with `*emphasis*`; everything else is escaped.
  #[default]
  RichText,
  /// Restricted HTML, passed through the allowlist sanitizer on every read.
  Html,
}

impl ChapterFormat {
  /// Parse the wire discriminator. Only `rich_text` and `html` are accepted.
  pub fn parse(discriminator: &str) -> Result<Self> {
    discriminator
      .parse()
      .map_err(|_| Error::UnknownFormat(discriminator.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
  pub chapter_id: Uuid,
  pub work_id:    Uuid,
  pub title:      Option<String>,
  /// The body exactly as submitted. Never sanitized at rest.
  pub body:       String,
  pub format:     ChapterFormat,
  pub position:   u32,
  pub word_count: u64,
  pub created_at: DateTime<Utc>,
}

impl Chapter {
  pub fn from_new(
    new: NewChapter,
    work_id: Uuid,
    position: u32,
    at: DateTime<Utc>,
  ) -> Self {
    let word_count = count_words(&new.body);
    Chapter {
      chapter_id: Uuid::new_v4(),
      work_id,
      title: new.title,
      body: new.body,
      format: new.format,
      position,
      word_count,
      created_at: at,
    }
  }
}

/// Input for a chapter append.
#[derive(Debug, Clone)]
pub struct NewChapter {
  pub title:  Option<String>,
  pub body:   String,
  pub format: ChapterFormat,
}

impl NewChapter {
  /// A blank title is treated as absent. The body is kept verbatim.
  pub fn new(title: Option<&str>, body: impl Into<String>, format: ChapterFormat) -> Self {
    let title = title
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_owned);
    NewChapter { title, body: body.into(), format }
  }

  pub fn word_count(&self) -> u64 { count_words(&self.body) }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Aggregates recomputed over all of a work's chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChapterStats {
  pub word_count:    u64,
  pub chapter_count: u32,
}

impl ChapterStats {
  pub fn of<'a>(chapters: impl IntoIterator<Item = &'a Chapter>) -> Self {
    chapters
      .into_iter()
      .fold(ChapterStats::default(), |acc, ch| ChapterStats {
        word_count:    acc.word_count + ch.word_count,
        chapter_count: acc.chapter_count + 1,
      })
  }
}

/// Count whitespace-separated words after replacing every `<…>` tag with a
/// space, so markup never contributes words and never glues two words.
pub fn count_words(text: &str) -> u64 {
  // A `<` only opens a tag when some `>` follows it.
  let last_close = text.rfind('>');
  let mut words = 0;
  let mut in_word = false;
  let mut skip_to = 0;
  for (i, c) in text.char_indices() {
    if i < skip_to {
      continue;
    }
    if c == '<'
      && last_close.is_some_and(|j| j > i)
      && let Some(offset) = text[i..].find('>')
    {
      skip_to = i + offset + 1;
      in_word = false;
      continue;
    }
    if c.is_whitespace() {
      in_word = false;
    } else if !in_word {
      in_word = true;
      words += 1;
    }
  }
  words
}
