//! Allowlist HTML sanitizer for chapters submitted in the `html` format.
//!
//! A shallow, regex-driven filter rather than a parser. Stages run in a fixed
//! order, because the high-risk stages can leave tag-like text behind that the
//! allowlist stage must still see:
//!
//! 1. markup comments are deleted;
//! 2. paired high-risk elements are deleted together with their content;
//! 3. any remaining high-risk tag is deleted on its own;
//! 4. every other tag is either re-emitted in canonical form (allowlisted) or
//!    dropped, keeping its inner text. A `<` that does not open a surviving
//!    tag is escaped, so removals cannot splice a new tag together.
//!
//! The output of stage 4 contains no `<` outside canonical allowlisted tags,
//! which makes the whole transform idempotent.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Elements that survive, re-emitted lower-case and without attributes
/// (except a validated `href` on `a`).
pub const ALLOWED_TAGS: &[&str] = &[
  "a",
  "b",
  "blockquote",
  "br",
  "code",
  "del",
  "em",
  "h1",
  "h2",
  "h3",
  "h4",
  "h5",
  "h6",
  "hr",
  "i",
  "li",
  "ol",
  "p",
  "pre",
  "strong",
  "u",
  "ul",
];

/// Containers whose content is itself treated as hostile and removed along
/// with the tags.
pub const HIGH_RISK_TAGS: &[&str] = &[
  "script",
  "style",
  "iframe",
  "object",
  "embed",
  "svg",
  "math",
  "form",
  "input",
  "button",
  "textarea",
  "select",
  "meta",
  "link",
  "base",
];

/// `href` values must start with one of these.
const SAFE_HREF_PREFIXES: &[&str] = &["/", "#", "http://", "https://", "mailto:"];

static COMMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));

// The regex crate has no backreferences, so each paired element gets its own
// pattern and a `<script>` can only be closed by `</script>`.
static HIGH_RISK_PAIRED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  HIGH_RISK_TAGS
    .iter()
    .map(|name| {
      Regex::new(&format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>")).expect("static regex")
    })
    .collect()
});

static HIGH_RISK_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!(r"(?i)<({})\b[^>]*>", HIGH_RISK_TAGS.join("|"))).expect("static regex")
});

static TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z0-9]+)([^>]*)>").expect("static regex"));

static HREF: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("static regex")
});

/// Strip `input` down to the allowlisted subset of HTML.
///
/// Total over its input: malformed markup degrades to stripped text, never to
/// an error.
pub fn sanitize_html(input: &str) -> String {
  let mut output = COMMENT.replace_all(input, "").into_owned();

  for paired in HIGH_RISK_PAIRED.iter() {
    output = paired.replace_all(&output, "").into_owned();
  }
  output = HIGH_RISK_SINGLE.replace_all(&output, "").into_owned();

  rewrite_tags(&output)
}

/// Stage 4: canonicalise allowlisted tags, drop the rest, escape stray `<`.
fn rewrite_tags(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut last = 0;

  for caps in TAG.captures_iter(input) {
    let Some(full) = caps.get(0) else { continue };
    push_text(&mut out, &input[last..full.start()]);
    if let Some(tag) = rewrite_tag(&caps) {
      out.push_str(&tag);
    }
    last = full.end();
  }
  push_text(&mut out, &input[last..]);

  out
}

fn rewrite_tag(caps: &Captures<'_>) -> Option<String> {
  let closing = !caps[1].is_empty();
  let name = caps[2].to_ascii_lowercase();

  if !ALLOWED_TAGS.contains(&name.as_str()) {
    return None;
  }
  if closing {
    return Some(format!("</{name}>"));
  }
  if name != "a" {
    return Some(format!("<{name}>"));
  }

  let href = HREF.captures(&caps[3]).and_then(|h| {
    h.get(1)
      .or_else(|| h.get(2))
      .or_else(|| h.get(3))
      .map(|m| m.as_str())
  });

  match href.and_then(safe_href) {
    Some(href) => Some(format!("<a href=\"{}\">", href.replace('"', "&quot;"))),
    None => Some("<a>".to_owned()),
  }
}

/// Accept an `href` only with a safe scheme or a local path/fragment.
fn safe_href(raw: &str) -> Option<&str> {
  let href = raw.trim();
  if href.contains('<') {
    return None;
  }
  SAFE_HREF_PREFIXES
    .iter()
    .any(|prefix| href.starts_with(prefix))
    .then_some(href)
}

fn push_text(out: &mut String, text: &str) { out.push_str(&text.replace('<', "&lt;")); }
