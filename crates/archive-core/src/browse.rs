//! Browsing, search and tag aggregation over the full set of works.
//!
//! Nothing here touches storage: callers hand in the works returned by
//! [`ArchiveStore::list_works`](crate::store::ArchiveStore::list_works).
//! Tags have no table of their own; the index is derived on demand.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::work::{TagCategory, Work};

/// Works per page.
pub const PAGE_SIZE: usize = 20;

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct WorkQuery {
  /// Case-insensitive exact match against any tag in any category.
  pub tag:  Option<String>,
  /// Case-insensitive substring of title, summary or author.
  pub q:    Option<String>,
  /// 1-based; `None` and `0` both mean the first page.
  pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub works:       Vec<T>,
  pub page:        usize,
  pub total_pages: usize,
  pub total:       usize,
}

/// Sort newest first, filter, then cut out the requested page.
pub fn browse(mut works: Vec<Work>, query: &WorkQuery) -> Page<Work> {
  works.sort_by(|a, b| b.created_at.cmp(&a.created_at));

  if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
    works.retain(|w| w.tags.matches(tag));
  }

  if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
    let needle = q.to_lowercase();
    works.retain(|w| {
      w.title.to_lowercase().contains(&needle)
        || w.summary.to_lowercase().contains(&needle)
        || w.author.to_lowercase().contains(&needle)
    });
  }

  let page = query.page.unwrap_or(1).max(1);
  let total = works.len();
  let total_pages = total.div_ceil(PAGE_SIZE);
  let works = works
    .into_iter()
    .skip((page - 1).saturating_mul(PAGE_SIZE))
    .take(PAGE_SIZE)
    .collect();

  Page { works, page, total_pages, total }
}

// ─── Tag index ───────────────────────────────────────────────────────────────

/// Every known tag per category, sorted and de-duplicated (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndex {
  pub fandoms:       Vec<String>,
  pub relationships: Vec<String>,
  pub characters:    Vec<String>,
  pub freeforms:     Vec<String>,
}

impl TagIndex {
  pub fn from_works(works: &[Work]) -> Self {
    let mut fandoms = BTreeSet::new();
    let mut relationships = BTreeSet::new();
    let mut characters = BTreeSet::new();
    let mut freeforms = BTreeSet::new();

    for (category, tag) in works.iter().flat_map(|w| w.tags.iter()) {
      let set = match category {
        TagCategory::Fandoms => &mut fandoms,
        TagCategory::Relationships => &mut relationships,
        TagCategory::Characters => &mut characters,
        TagCategory::Freeforms => &mut freeforms,
      };
      set.insert(tag.to_owned());
    }

    TagIndex {
      fandoms:       fandoms.into_iter().collect(),
      relationships: relationships.into_iter().collect(),
      characters:    characters.into_iter().collect(),
      freeforms:     freeforms.into_iter().collect(),
    }
  }

  pub fn get(&self, category: TagCategory) -> &[String] {
    match category {
      TagCategory::Fandoms => &self.fandoms,
      TagCategory::Relationships => &self.relationships,
      TagCategory::Characters => &self.characters,
      TagCategory::Freeforms => &self.freeforms,
    }
  }

  /// Keep only tags containing `q`, case-insensitively.
  pub fn filtered(self, q: &str) -> Self {
    let needle = q.to_lowercase();
    let keep = |tags: Vec<String>| -> Vec<String> {
      tags
        .into_iter()
        .filter(|t| t.to_lowercase().contains(&needle))
        .collect()
    };
    TagIndex {
      fandoms:       keep(self.fandoms),
      relationships: keep(self.relationships),
      characters:    keep(self.characters),
      freeforms:     keep(self.freeforms),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};

  use super::*;
  use crate::work::{NewWork, Rating, Tags};

  fn work(title: &str, author: &str, secs: i64, tags: Tags) -> Work {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs);
    Work::from_new(
      NewWork::new(title, Some(author), Some("a summary"), Rating::General, tags),
      100,
      at,
    )
  }

  #[test]
  fn newest_first() {
    let works = vec![
      work("old", "a", 0, Tags::default()),
      work("new", "a", 10, Tags::default()),
    ];
    let page = browse(works, &WorkQuery::default());
    assert_eq!(page.works[0].title, "new");
    assert_eq!(page.total, 2);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, 1);
  }

  #[test]
  fn tag_filter_is_case_insensitive_across_categories() {
    let works = vec![
      work("one", "a", 0, Tags { fandoms: vec!["Star Trek".into()], ..Tags::default() }),
      work("two", "a", 1, Tags { freeforms: vec!["star trek".into()], ..Tags::default() }),
      work("three", "a", 2, Tags::default()),
    ];
    let page = browse(
      works,
      &WorkQuery { tag: Some("STAR TREK".into()), ..WorkQuery::default() },
    );
    assert_eq!(page.total, 2);
  }

  #[test]
  fn text_search_covers_title_summary_author() {
    let works = vec![
      work("Moonrise", "a", 0, Tags::default()),
      work("x", "Moonwalker", 1, Tags::default()),
      work("y", "b", 2, Tags::default()),
    ];
    let page = browse(works, &WorkQuery { q: Some("moon".into()), ..WorkQuery::default() });
    assert_eq!(page.total, 2);

    let works = vec![work("y", "b", 2, Tags::default())];
    let page = browse(works, &WorkQuery { q: Some("SUMMARY".into()), ..WorkQuery::default() });
    assert_eq!(page.total, 1);
  }

  #[test]
  fn pagination() {
    let works: Vec<Work> = (0..45)
      .map(|i| work(&format!("w{i}"), "a", i, Tags::default()))
      .collect();

    let page = browse(works.clone(), &WorkQuery { page: Some(3), ..WorkQuery::default() });
    assert_eq!(page.total, 45);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.works.len(), 5);
    assert_eq!(page.works[0].title, "w4");

    let page = browse(works.clone(), &WorkQuery { page: Some(0), ..WorkQuery::default() });
    assert_eq!(page.page, 1);
    assert_eq!(page.works.len(), PAGE_SIZE);

    let page = browse(works, &WorkQuery { page: Some(9), ..WorkQuery::default() });
    assert!(page.works.is_empty());
  }

  #[test]
  fn tag_index_sorts_and_keeps_case_variants() {
    let works = vec![
      work("one", "a", 0, Tags { freeforms: vec!["Fluff".into(), "Angst".into()], ..Tags::default() }),
      work("two", "a", 1, Tags { freeforms: vec!["fluff".into(), "Fluff".into()], ..Tags::default() }),
    ];
    let index = TagIndex::from_works(&works);
    assert_eq!(index.freeforms, vec!["Angst", "Fluff", "fluff"]);
    assert!(index.fandoms.is_empty());

    let filtered = index.filtered("FLU");
    assert_eq!(filtered.get(TagCategory::Freeforms), ["Fluff", "fluff"]);
  }
}
