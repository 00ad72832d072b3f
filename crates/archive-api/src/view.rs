//! Response shapes shared by several handlers.

use archive_core::chapter::Chapter;
use serde::Serialize;

/// A chapter together with its body rendered for display.
///
/// Rendering happens on every read; the stored body is never rewritten.
#[derive(Debug, Serialize)]
pub struct ChapterView {
  #[serde(flatten)]
  pub chapter:       Chapter,
  pub rendered_html: String,
}

impl From<Chapter> for ChapterView {
  fn from(chapter: Chapter) -> Self {
    let rendered_html = archive_markup::render(&chapter.body, chapter.format);
    ChapterView { chapter, rendered_html }
  }
}
