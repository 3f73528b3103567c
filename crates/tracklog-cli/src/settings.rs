//! Process settings, read once at startup.
//!
//! Sources, lowest precedence first: an optional TOML file, then the process
//! environment. A `.env` file in the working directory is loaded into the
//! environment beforehand without overriding variables that are already set.

use std::{
  fmt,
  path::{Path, PathBuf},
};

use reqwest::Url;
use serde::Deserialize;
use tracklog_core::{Error, Result};

/// Typed view of every `SPOTIFY_*`, `DATABASE_URL` and `DBT_*` setting.
#[derive(Deserialize, Clone)]
pub struct Settings {
  pub spotify_client_id:     String,
  pub spotify_client_secret: String,
  pub spotify_redirect_url:  String,
  pub spotify_refresh_token: String,
  pub database_url:          String,
  #[serde(default = "default_token_cache")]
  pub spotify_token_cache:   PathBuf,

  // Consumed by the downstream transformation stage, not by ingestion.
  #[serde(default)]
  pub dbt_host:     Option<String>,
  #[serde(default)]
  pub dbt_user:     Option<String>,
  #[serde(default)]
  pub dbt_password: Option<String>,
}

fn default_token_cache() -> PathBuf { PathBuf::from(".spotify_cache") }

impl Settings {
  /// Load `.env`, then build settings from `config_file` and the environment.
  pub fn load(config_file: &Path) -> Result<Self> {
    match dotenvy::dotenv() {
      Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
      Err(e) if e.not_found() => {}
      Err(e) => return Err(Error::Configuration(format!(".env: {e}"))),
    }
    Self::from_sources(config_file, None)
  }

  /// `env` replaces the process environment when given.
  fn from_sources(
    config_file: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(config_file).required(false))
      .add_source(config::Environment::default().source(env))
      .build()
      .map_err(|e| Error::Configuration(e.to_string()))?;

    let settings: Settings = raw
      .try_deserialize()
      .map_err(|e| Error::Configuration(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
  }

  fn validate(&self) -> Result<()> {
    let required = [
      ("SPOTIFY_CLIENT_ID", &self.spotify_client_id),
      ("SPOTIFY_CLIENT_SECRET", &self.spotify_client_secret),
      ("SPOTIFY_REDIRECT_URL", &self.spotify_redirect_url),
      ("SPOTIFY_REFRESH_TOKEN", &self.spotify_refresh_token),
      ("DATABASE_URL", &self.database_url),
    ];
    if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
      return Err(Error::Configuration(format!("{name} is blank")));
    }

    Url::parse(&self.spotify_redirect_url).map_err(|e| {
      Error::Configuration(format!(
        "SPOTIFY_REDIRECT_URL {:?} is not a valid url: {e}",
        self.spotify_redirect_url
      ))
    })?;
    Ok(())
  }
}

impl fmt::Debug for Settings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Settings")
      .field("spotify_client_id", &self.spotify_client_id)
      .field("spotify_redirect_url", &self.spotify_redirect_url)
      .field("spotify_token_cache", &self.spotify_token_cache)
      .field("dbt_host", &self.dbt_host)
      .field("dbt_user", &self.dbt_user)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
    Some(
      pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect(),
    )
  }

  fn complete() -> Vec<(&'static str, &'static str)> {
    vec![
      ("SPOTIFY_CLIENT_ID", "client-id"),
      ("SPOTIFY_CLIENT_SECRET", "client-secret"),
      ("SPOTIFY_REDIRECT_URL", "http://127.0.0.1:8888/callback"),
      ("SPOTIFY_REFRESH_TOKEN", "refresh"),
      ("DATABASE_URL", "sqlite://tracks.db"),
    ]
  }

  fn no_file() -> &'static Path { Path::new("tracklog-settings-test-missing.toml") }

  #[test]
  fn loads_required_values_from_environment() {
    let s = Settings::from_sources(no_file(), env(&complete())).unwrap();

    assert_eq!(s.spotify_client_id, "client-id");
    assert_eq!(s.database_url, "sqlite://tracks.db");
    assert_eq!(s.spotify_token_cache, PathBuf::from(".spotify_cache"));
    assert_eq!(s.dbt_host, None);
  }

  #[test]
  fn reads_optional_dbt_values() {
    let mut pairs = complete();
    pairs.push(("DBT_HOST", "warehouse.internal"));
    pairs.push(("DBT_USER", "dbt"));

    let s = Settings::from_sources(no_file(), env(&pairs)).unwrap();
    assert_eq!(s.dbt_host.as_deref(), Some("warehouse.internal"));
    assert_eq!(s.dbt_user.as_deref(), Some("dbt"));
    assert_eq!(s.dbt_password, None);
  }

  #[test]
  fn missing_value_is_a_configuration_error() {
    for skip in 0..complete().len() {
      let pairs: Vec<_> = complete()
        .into_iter()
        .enumerate()
        .filter_map(|(i, kv)| (i != skip).then_some(kv))
        .collect();

      let err = Settings::from_sources(no_file(), env(&pairs)).unwrap_err();
      assert!(matches!(err, Error::Configuration(_)), "dropping index {skip}");
    }
  }

  #[test]
  fn blank_value_is_rejected() {
    let mut pairs = complete();
    pairs[3] = ("SPOTIFY_REFRESH_TOKEN", "   ");

    let err = Settings::from_sources(no_file(), env(&pairs)).unwrap_err();
    assert!(err.to_string().contains("SPOTIFY_REFRESH_TOKEN"));
  }

  #[test]
  fn redirect_url_must_parse() {
    let mut pairs = complete();
    pairs[2] = ("SPOTIFY_REDIRECT_URL", "localhost callback");

    let err = Settings::from_sources(no_file(), env(&pairs)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
  }

  #[test]
  fn debug_output_hides_secrets() {
    let s = Settings::from_sources(no_file(), env(&complete())).unwrap();
    let rendered = format!("{s:?}");
    assert!(!rendered.contains("client-secret"));
    assert!(!rendered.contains("refresh"));
  }
}
