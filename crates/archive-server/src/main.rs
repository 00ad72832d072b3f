//! archive-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `ARCHIVE_*`
//! environment variables, opens the configured store and serves the JSON API
//! under `/api`.
//!
//! # Repairing ownership by hand
//!
//! To compute the digest stored for an edit token:
//!
//! ```sh
//! echo -n "$TOKEN" | cargo run -p archive-server -- --hash-token
//! ```

mod settings;

use std::{
  io::BufRead as _,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, bail};
use archive_api::{
  AppState, api_router,
  captcha::{Captcha, RemoteVerifier},
};
use archive_core::{store::ArchiveStore, token::TokenHash};
use archive_store_json::JsonStore;
use archive_store_sqlite::SqliteStore;
use axum::{Router, http::HeaderName};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, StoreBackend};

#[derive(Parser)]
#[command(author, version, about = "Story archive server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the stored digest of an edit token read from stdin and exit.
  #[arg(long)]
  hash_token: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_token {
    let mut line = String::new();
    std::io::stdin()
      .lock()
      .read_line(&mut line)
      .context("failed to read token from stdin")?;
    println!("{}", TokenHash::of(line.trim()).to_hex());
    return Ok(());
  }

  let cfg = ServerConfig::load(cli.config).context("failed to load configuration")?;
  let store_path = expand_tilde(&cfg.store_path);

  match cfg.store_backend {
    StoreBackend::Sqlite => {
      if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
          .await
          .with_context(|| format!("failed to create {parent:?}"))?;
      }
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open sqlite store at {store_path:?}"))?;
      serve(store, &cfg).await
    }
    StoreBackend::Json => {
      let store = JsonStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open json store at {store_path:?}"))?;
      serve(store, &cfg).await
    }
  }
}

async fn serve<S>(store: S, cfg: &ServerConfig) -> anyhow::Result<()>
where
  S: ArchiveStore + 'static,
{
  let mut state = AppState::new(Arc::new(store)).with_captcha(captcha(cfg)?);
  if let Some(header) = &cfg.identity_header {
    let header = HeaderName::try_from(header.as_str())
      .with_context(|| format!("invalid identity_header {header:?}"))?;
    tracing::info!(%header, "accepting signed-in identity from proxy header");
    state = state.with_identity_header(header);
  }

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!(backend = ?cfg.store_backend, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

fn captcha(cfg: &ServerConfig) -> anyhow::Result<Captcha> {
  match (&cfg.captcha_verify_url, &cfg.captcha_secret) {
    (Some(url), Some(secret)) => {
      let timeout = Duration::from_secs(cfg.captcha_timeout_secs);
      let verifier = RemoteVerifier::new(url.as_str(), secret.as_str(), timeout)
        .context("failed to build captcha client")?;
      Ok(Captcha::Remote(verifier))
    }
    (None, None) => {
      tracing::warn!("no captcha verifier configured; anonymous comments are not checked");
      Ok(Captcha::Disabled)
    }
    _ => bail!("captcha_verify_url and captcha_secret must be set together"),
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown signal received");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
