//! woundbox-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the annotation API over HTTP.
//!
//! # Bootstrapping the first admin
//!
//! Accounts are normally provisioned through the API by an admin. To create
//! the initial admin account (password read from stdin):
//!
//! ```
//! cargo run -p woundbox-api --bin server -- --create-admin ada
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use woundbox_api::{AppState, ServerConfig, auth};
use woundbox_core::{
  store::WoundStore as _,
  user::{NewUser, Role},
};
use woundbox_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Woundbox annotation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an admin account with this username and exit. The password is
  /// read from stdin.
  #[arg(long, value_name = "USERNAME")]
  create_admin: Option<String>,

  /// Full name for `--create-admin`; defaults to the username.
  #[arg(long)]
  full_name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WOUNDBOX"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: bootstrap an admin account and exit.
  if let Some(username) = cli.create_admin {
    let password = read_password_from_stdin()?;
    let user = store
      .create_user(NewUser {
        full_name: cli.full_name.unwrap_or_else(|| username.clone()),
        username,
        password_hash: auth::hash_password(&password)
          .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?,
        email: None,
        role: Role::Admin,
      })
      .await
      .context("failed to create admin account")?;
    println!("created admin {} ({})", user.username, user.user_id);
    return Ok(());
  }

  // Build application state.
  let tokens = server_cfg.token_config();
  let state = AppState {
    store:  Arc::new(store),
    tokens: Arc::new(tokens),
    config: Arc::new(server_cfg.clone()),
  };

  let app = woundbox_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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
