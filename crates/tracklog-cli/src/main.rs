//! `tracklog` — land Spotify listening history in a bronze table.
//!
//! # Usage
//!
//! ```
//! tracklog ingest              # append the latest 50 plays
//! tracklog recent -n 5         # connectivity check, prints only
//! tracklog stored -n 20        # newest landed rows
//! tracklog auth-url            # where to grant access
//! ```
//!
//! Settings come from `.env`, the environment and an optional
//! `tracklog.toml`; see [`settings::Settings`]. `DATABASE_URL` must name a
//! SQLite database; `postgres://` URLs are rejected at startup.

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracklog_core::{
  ingest::{IngestOutcome, Ingestor},
  source::{DIAGNOSTIC_LIMIT, INGEST_PAGE_LIMIT},
  store::RawTrackStore,
  summary::recent_summaries,
};
use tracklog_spotify::{OAuthConfig, SpotifyClient, TokenCache};
use tracklog_store_sqlite::SqliteStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

const DATABASE_URL_HELP: &str = "DATABASE_URL must name a SQLite database: sqlite://<path>, \
sqlite:<path>, file:<path>, a bare path or sqlite::memory:. Server URLs such as postgres:// \
are rejected.";

#[derive(Parser)]
#[command(
  name = "tracklog",
  version,
  about = "Land Spotify listening history in a bronze table",
  after_help = DATABASE_URL_HELP
)]
struct Cli {
  /// Path to an optional TOML settings file.
  #[arg(short, long, global = true, default_value = "tracklog.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch recently played tracks and append them to `bronze_raw_tracks`.
  Ingest {
    #[arg(long, default_value_t = INGEST_PAGE_LIMIT)]
    limit: u32,
  },
  /// Print the last few plays to verify the connection. Stores nothing.
  Recent {
    #[arg(short = 'n', long, default_value_t = DIAGNOSTIC_LIMIT)]
    limit: u32,
  },
  /// Print the newest rows in the landing table.
  Stored {
    #[arg(short = 'n', long, default_value_t = 10)]
    limit: usize,
  },
  /// Print the URL a user visits to authorize this application.
  AuthUrl {
    #[arg(long)]
    state: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config).context("failed to load settings")?;
  tracing::debug!(?settings, "settings loaded");

  match cli.command {
    Command::Ingest { limit } => ingest(&settings, limit).await,
    Command::Recent { limit } => {
      recent(&settings, limit).await;
      Ok(())
    }
    Command::Stored { limit } => stored(&settings, limit).await,
    Command::AuthUrl { state } => {
      let url = spotify_client(&settings)?.authorize_url(state.as_deref())?;
      println!("{url}");
      Ok(())
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn spotify_client(settings: &Settings) -> Result<SpotifyClient> {
  let oauth = OAuthConfig::new(
    &settings.spotify_client_id,
    &settings.spotify_client_secret,
    &settings.spotify_redirect_url,
  );
  SpotifyClient::new(
    oauth,
    &settings.spotify_refresh_token,
    TokenCache::new(&settings.spotify_token_cache),
  )
  .context("failed to build spotify client")
}

async fn open_store(settings: &Settings) -> Result<SqliteStore> {
  SqliteStore::connect(&settings.database_url)
    .await
    .context("failed to open landing store")
}

async fn ingest(settings: &Settings, limit: u32) -> Result<()> {
  let client = spotify_client(settings)?;
  let store = open_store(settings).await?;
  let ingestor = Ingestor::new(client, store).with_limit(limit);

  match ingestor.ingest_recently_played().await? {
    IngestOutcome::NothingNew => {}
    IngestOutcome::Ingested { count } => {
      let total = ingestor.store().count().await?;
      tracing::info!(count, total, "landing table updated");
    }
  }
  Ok(())
}

/// Connectivity check. Failures are printed, never returned.
async fn recent(settings: &Settings, limit: u32) {
  let summaries = match spotify_client(settings) {
    Ok(client) => recent_summaries(&client, limit).await.map_err(anyhow::Error::from),
    Err(e) => Err(e),
  };

  match summaries {
    Ok(summaries) => {
      println!("--- Success! Connection Established ---");
      for (idx, summary) in summaries.iter().enumerate() {
        println!("{}: {summary}", idx + 1);
      }
    }
    Err(e) => println!("--- Connection Failed --- \n{e:#}"),
  }
}

async fn stored(settings: &Settings, limit: usize) -> Result<()> {
  let store = open_store(settings).await?;
  let total = store.count().await?;
  let rows = store.recent(limit).await?;

  println!("{total} rows in bronze_raw_tracks");
  for row in rows {
    println!(
      "{:>6}  {}  {}  {}",
      row.id,
      row.inserted_at.to_rfc3339(),
      row.played_at,
      row.track_id.as_deref().unwrap_or("-"),
    );
  }
  Ok(())
}
