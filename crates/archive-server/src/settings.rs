//! Runtime configuration, layered from an optional TOML file and `ARCHIVE_*`
//! environment variables.

use std::path::PathBuf;

use serde::Deserialize;

/// Which [`ArchiveStore`](archive_core::store::ArchiveStore) backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  /// A single SQLite file at `store_path`.
  #[default]
  Sqlite,
  /// A directory of JSON collections at `store_path`.
  Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_backend:        StoreBackend,
  pub store_path:           PathBuf,
  /// Request header carrying a signed-in display name, set by an
  /// authenticating proxy. Unset disables sign-in.
  pub identity_header:      Option<String>,
  pub captcha_verify_url:   Option<String>,
  pub captcha_secret:       Option<String>,
  pub captcha_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_owned(),
      port:                 3000,
      store_backend:        StoreBackend::default(),
      store_path:           PathBuf::from("data/archive.db"),
      identity_header:      None,
      captcha_verify_url:   None,
      captcha_secret:       None,
      captcha_timeout_secs: 10,
    }
  }
}

impl ServerConfig {
  /// Build from `file` (optional on disk) overlaid with the environment.
  pub fn load(file: PathBuf) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("ARCHIVE"))
      .build()?
      .try_deserialize()
  }
}
