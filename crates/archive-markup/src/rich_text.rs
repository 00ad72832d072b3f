//! The default, emphasis-only text format.

use std::sync::LazyLock;

use regex::Regex;

static EMPHASIS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("static regex"));

/// Escape `text` for HTML, then turn `*x*` into `<em>x</em>`.
///
/// Whitespace and newlines are left alone; presentation is the client's job.
pub fn render_rich_text(text: &str) -> String {
  let escaped = html_escape::encode_text(text);
  EMPHASIS.replace_all(&escaped, "<em>$1</em>").into_owned()
}
