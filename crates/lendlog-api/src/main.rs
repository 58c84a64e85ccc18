//! lendlog-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API over HTTP.
//!
//! # Bootstrapping the first user
//!
//! Every route except sign-in needs a token, so the first account is created
//! from the command line:
//!
//! ```
//! cargo run -p lendlog-api --bin lendlog-server -- \
//!   --add-user ops@example.com --first-name Ops --last-name Admin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use lendlog_api::{AppState, ServerConfig};
use lendlog_core::{accounts::Accounts, user::NewUser};
use lendlog_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "lendlog API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an account and profile for EMAIL (password read from stdin), then
  /// exit.
  #[arg(long, value_name = "EMAIL", requires_all = ["first_name", "last_name"])]
  add_user: Option<String>,

  #[arg(long)]
  first_name: Option<String>,

  #[arg(long)]
  last_name: Option<String>,
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

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "lendlog.db")?
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("LENDLOG"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  // Helper mode: add a user and exit.
  if let Some(email) = cli.add_user {
    let user = NewUser {
      email,
      password: read_password()?,
      first_name: cli.first_name.unwrap_or_default(),
      last_name: cli.last_name.unwrap_or_default(),
    };
    let profile = Accounts::new(Arc::clone(&store), Arc::clone(&store))
      .add(user)
      .await
      .context("failed to add user")?;
    println!("{}", profile.uid);
    return Ok(());
  }

  let app = lendlog_api::router(AppState::new(store));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from one line of stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
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
