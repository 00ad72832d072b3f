//! Ownership tokens: account-free proof that a caller created a work.
//!
//! A random token is issued once, in the creation response. Only its SHA-256
//! digest is persisted. Every mutating request re-hashes the supplied
//! plaintext and compares digests.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::Error;

// ─── Plaintext ───────────────────────────────────────────────────────────────

/// The plaintext ownership token. `Debug` is redacted so the value cannot
/// leak through logging.
#[derive(Clone, PartialEq, Eq)]
pub struct OwnershipToken(String);

impl OwnershipToken {
  /// A fresh random (UUID v4) token.
  pub fn generate() -> Self { OwnershipToken(Uuid::new_v4().to_string()) }

  pub fn hash(&self) -> TokenHash { TokenHash::of(&self.0) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_string(self) -> String { self.0 }
}

impl fmt::Debug for OwnershipToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("OwnershipToken(<redacted>)")
  }
}

// ─── Digest ──────────────────────────────────────────────────────────────────

/// SHA-256 digest of an ownership token; stored as 64 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenHash([u8; 32]);

impl TokenHash {
  /// Hash a caller-supplied plaintext.
  pub fn of(plaintext: &str) -> Self {
    let digest = Sha256::digest(plaintext.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    TokenHash(bytes)
  }

  pub fn from_hex(s: &str) -> Result<Self, Error> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(s, &mut bytes)
      .map_err(|e| Error::MalformedTokenHash(e.to_string()))?;
    Ok(TokenHash(bytes))
  }

  pub fn to_hex(&self) -> String { hex::encode(self.0) }

  /// Full-width comparison that does not short-circuit on the first
  /// differing byte.
  pub fn verify(&self, plaintext: &str) -> bool {
    let candidate = TokenHash::of(plaintext);
    self
      .0
      .iter()
      .zip(candidate.0.iter())
      .fold(0u8, |acc, (a, b)| acc | (a ^ b))
      == 0
  }
}

impl fmt::Debug for TokenHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TokenHash({})", self.to_hex())
  }
}

impl TryFrom<String> for TokenHash {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { TokenHash::from_hex(&s) }
}

impl From<TokenHash> for String {
  fn from(h: TokenHash) -> Self { h.to_hex() }
}

// ─── Authorization ───────────────────────────────────────────────────────────

/// Why a mutation against a work was refused. The three kinds stay distinct
/// all the way to the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denied {
  #[error("edit token required")]
  MissingToken,
  #[error("work not found")]
  NotFound,
  #[error("invalid edit token")]
  Forbidden,
}

/// Decide whether `supplied` proves ownership of a work whose stored digest
/// is `stored` (`None` when the work does not exist).
///
/// The missing-token check runs first, so a token-less request never reveals
/// whether the work exists.
pub fn authorize(stored: Option<&TokenHash>, supplied: Option<&str>) -> Result<(), Denied> {
  let supplied = match supplied {
    Some(t) if !t.is_empty() => t,
    _ => return Err(Denied::MissingToken),
  };
  let stored = stored.ok_or(Denied::NotFound)?;
  if stored.verify(supplied) {
    Ok(())
  } else {
    Err(Denied::Forbidden)
  }
}
