//! Server-side captcha verification for anonymous comments.
//!
//! The verifier speaks the common siteverify protocol: a form POST carrying
//! `secret` and `response`, answered with `{"success": bool, ...}`.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptchaError {
  #[error("captcha verifier request failed: {0}")]
  Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
  success: bool,
}

/// How anonymous comments are checked.
#[derive(Debug, Clone)]
pub enum Captcha {
  /// No verifier configured: every anonymous comment is accepted.
  Disabled,
  Remote(RemoteVerifier),
}

impl Captcha {
  pub fn is_enabled(&self) -> bool { matches!(self, Captcha::Remote(_)) }

  /// `Ok(false)` means the verifier rejected the token.
  pub async fn verify(&self, token: &str) -> Result<bool, CaptchaError> {
    match self {
      Captcha::Disabled => Ok(true),
      Captcha::Remote(remote) => remote.verify(token).await,
    }
  }
}

/// Client for a remote siteverify endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
  client:     Client,
  verify_url: String,
  secret:     String,
}

impl RemoteVerifier {
  pub fn new(
    verify_url: impl Into<String>,
    secret: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, CaptchaError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, verify_url: verify_url.into(), secret: secret.into() })
  }

  pub async fn verify(&self, token: &str) -> Result<bool, CaptchaError> {
    let resp = self
      .client
      .post(&self.verify_url)
      .form(&[("secret", self.secret.as_str()), ("response", token)])
      .send()
      .await?
      .error_for_status()?;
    let body: VerifyResponse = resp.json().await?;
    Ok(body.success)
  }
}
