//! Comments: immutable reader responses attached to a work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::work::display_name_or_anonymous;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:    Uuid,
  pub work_id:       Uuid,
  pub name:          String,
  /// `true` when `name` came from a verified sign-in rather than free text.
  pub authenticated: bool,
  pub body:          String,
  pub created_at:    DateTime<Utc>,
}

impl Comment {
  pub fn from_new(new: NewComment, at: DateTime<Utc>) -> Self {
    Comment {
      comment_id:    Uuid::new_v4(),
      work_id:       new.work_id,
      name:          new.name,
      authenticated: new.authenticated,
      body:          new.body,
      created_at:    at,
    }
  }
}

/// Input for [`ArchiveStore::add_comment`](crate::store::ArchiveStore::add_comment).
#[derive(Debug, Clone)]
pub struct NewComment {
  pub work_id:       Uuid,
  pub name:          String,
  pub authenticated: bool,
  pub body:          String,
}

impl NewComment {
  /// A comment under a free-text name; blank names become `Anonymous`.
  pub fn anonymous(work_id: Uuid, name: Option<&str>, body: &str) -> Self {
    NewComment {
      work_id,
      name: display_name_or_anonymous(name),
      authenticated: false,
      body: body.trim().to_owned(),
    }
  }

  /// A comment under the display name of a signed-in identity.
  pub fn signed_in(work_id: Uuid, display_name: &str, body: &str) -> Self {
    NewComment {
      work_id,
      name: display_name.trim().to_owned(),
      authenticated: true,
      body: body.trim().to_owned(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anonymous_comment_defaults_name() {
    let c = NewComment::anonymous(Uuid::nil(), None, "  nice  ");
    assert_eq!(c.name, "Anonymous");
    assert_eq!(c.body, "nice");
    assert!(!c.authenticated);
  }

  #[test]
  fn signed_in_comment_is_flagged() {
    let c = NewComment::signed_in(Uuid::nil(), "robin", "hi");
    assert_eq!(c.name, "robin");
    assert!(c.authenticated);
  }
}
