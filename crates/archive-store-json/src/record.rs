//! On-disk record shapes.

use archive_core::{token::TokenHash, work::Work};
use serde::{Deserialize, Serialize};

/// A work as persisted: the public record plus the ownership digest, which
/// never leaves this crate except through `ArchiveStore::token_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRecord {
  #[serde(flatten)]
  pub work:       Work,
  pub token_hash: TokenHash,
}
