//! Works: a titled creative submission made of one or more chapters.
//!
//! The public [`Work`] record never carries the ownership credential. Storage
//! backends keep the [`TokenHash`](crate::token::TokenHash) beside the record
//! and only hand it out through
//! [`ArchiveStore::token_hash`](crate::store::ArchiveStore::token_hash).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Display name used when a work or comment is submitted without one.
pub const ANONYMOUS: &str = "Anonymous";

// ─── Rating ──────────────────────────────────────────────────────────────────

/// Content rating. The wire form is the human-readable label.
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
pub enum Rating {
  #[default]
  #[serde(rename = "Not Rated")]
  #[strum(serialize = "Not Rated")]
  NotRated,
  General,
  Teen,
  Mature,
  Explicit,
}

impl Rating {
  /// Parse the wire label (`"Not Rated"`, `"General"`, …).
  pub fn parse(label: &str) -> Result<Self> {
    label
      .parse()
      .map_err(|_| Error::UnknownRating(label.to_owned()))
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// The four independent tag collections a work carries.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TagCategory {
  Fandoms,
  Relationships,
  Characters,
  Freeforms,
}

/// Denormalised tag strings, insertion order preserved for display.
///
/// Storage is case-sensitive and case-preserving; [`Tags::matches`] compares
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tags {
  pub fandoms:       Vec<String>,
  pub relationships: Vec<String>,
  pub characters:    Vec<String>,
  pub freeforms:     Vec<String>,
}

impl Tags {
  /// Replace one collection, normalising the new entries.
  pub fn set(&mut self, category: TagCategory, tags: Vec<String>) {
    let slot = match category {
      TagCategory::Fandoms => &mut self.fandoms,
      TagCategory::Relationships => &mut self.relationships,
      TagCategory::Characters => &mut self.characters,
      TagCategory::Freeforms => &mut self.freeforms,
    };
    *slot = normalize_tags(tags);
  }

  /// Normalise every collection in place.
  pub fn normalized(mut self) -> Self {
    self.fandoms = normalize_tags(self.fandoms);
    self.relationships = normalize_tags(self.relationships);
    self.characters = normalize_tags(self.characters);
    self.freeforms = normalize_tags(self.freeforms);
    self
  }

  /// Every tag across all categories.
  pub fn iter(&self) -> impl Iterator<Item = (TagCategory, &str)> {
    self
      .fandoms
      .iter()
      .map(|t| (TagCategory::Fandoms, t.as_str()))
      .chain(self.relationships.iter().map(|t| (TagCategory::Relationships, t.as_str())))
      .chain(self.characters.iter().map(|t| (TagCategory::Characters, t.as_str())))
      .chain(self.freeforms.iter().map(|t| (TagCategory::Freeforms, t.as_str())))
  }

  /// Case-insensitive equality against any tag in any category.
  pub fn matches(&self, tag: &str) -> bool {
    let needle = tag.to_lowercase();
    self.iter().any(|(_, t)| t.to_lowercase() == needle)
  }
}

/// Trim entries, drop blanks and exact duplicates; keep first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(tags.len());
  for raw in tags {
    let tag = raw.trim();
    if tag.is_empty() || out.iter().any(|seen| seen == tag) {
      continue;
    }
    out.push(tag.to_owned());
  }
  out
}

// ─── Work ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
  pub work_id:       Uuid,
  pub title:         String,
  pub author:        String,
  pub summary:       String,
  pub rating:        Rating,
  #[serde(flatten)]
  pub tags:          Tags,
  pub word_count:    u64,
  pub chapter_count: u32,
  pub kudos_count:   u64,
  pub hit_count:     u64,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Work {
  /// Build the stored record for a freshly created work whose first chapter
  /// has `first_chapter_words` words.
  pub fn from_new(new: NewWork, first_chapter_words: u64, at: DateTime<Utc>) -> Self {
    Work {
      work_id:       Uuid::new_v4(),
      title:         new.title,
      author:        new.author,
      summary:       new.summary,
      rating:        new.rating,
      tags:          new.tags,
      word_count:    first_chapter_words,
      chapter_count: 1,
      kudos_count:   0,
      hit_count:     0,
      created_at:    at,
      updated_at:    at,
    }
  }

  /// Apply the fields present in `patch` and bump `updated_at`.
  pub fn apply(&mut self, patch: WorkPatch, at: DateTime<Utc>) {
    if let Some(title) = patch.title {
      self.title = title;
    }
    if let Some(author) = patch.author {
      self.author = author;
    }
    if let Some(summary) = patch.summary {
      self.summary = summary;
    }
    if let Some(rating) = patch.rating {
      self.rating = rating;
    }
    for (category, tags) in patch.tags {
      self.tags.set(category, tags);
    }
    self.updated_at = at;
  }
}

/// Input for [`ArchiveStore::create_work`](crate::store::ArchiveStore::create_work).
#[derive(Debug, Clone)]
pub struct NewWork {
  pub title:   String,
  pub author:  String,
  pub summary: String,
  pub rating:  Rating,
  pub tags:    Tags,
}

impl NewWork {
  /// Trims every text field, substitutes [`ANONYMOUS`] for a blank author and
  /// normalises the tag collections.
  pub fn new(
    title: &str,
    author: Option<&str>,
    summary: Option<&str>,
    rating: Rating,
    tags: Tags,
  ) -> Self {
    NewWork {
      title: title.trim().to_owned(),
      author: display_name_or_anonymous(author),
      summary: summary.map(str::trim).unwrap_or_default().to_owned(),
      rating,
      tags: tags.normalized(),
    }
  }
}

/// Partial update of a work's descriptive fields. Counters, timestamps and
/// the ownership hash are never patchable.
#[derive(Debug, Clone, Default)]
pub struct WorkPatch {
  pub title:   Option<String>,
  pub author:  Option<String>,
  pub summary: Option<String>,
  pub rating:  Option<Rating>,
  pub tags:    Vec<(TagCategory, Vec<String>)>,
}

/// A trimmed, non-blank `name`, or [`ANONYMOUS`].
pub fn display_name_or_anonymous(name: Option<&str>) -> String {
  match name.map(str::trim) {
    Some(n) if !n.is_empty() => n.to_owned(),
    _ => ANONYMOUS.to_owned(),
  }
}
