//! Chapter body rendering for the story archive.
//!
//! Bodies are stored exactly as submitted and rendered on every read, so the
//! sanitizer allowlist can change without migrating stored chapters. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```
//! use archive_core::chapter::ChapterFormat;
//!
//! let html = archive_markup::render("a<script>alert(1)</script>b", ChapterFormat::Html);
//! assert_eq!(html, "ab");
//!
//! let html = archive_markup::render("so *very* <tired>", ChapterFormat::RichText);
//! assert_eq!(html, "so <em>very</em> &lt;tired&gt;");
//! ```

mod rich_text;
mod sanitize;

use archive_core::chapter::ChapterFormat;

pub use rich_text::render_rich_text;
pub use sanitize::{ALLOWED_TAGS, HIGH_RISK_TAGS, sanitize_html};

/// Render a stored chapter body to display-safe HTML.
pub fn render(body: &str, format: ChapterFormat) -> String {
  match format {
    ChapterFormat::RichText => render_rich_text(body),
    ChapterFormat::Html => sanitize_html(body),
  }
}
