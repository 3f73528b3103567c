//! Access tokens and the on-disk token cache.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Refresh this long before the reported expiry.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// A bearer token issued by the accounts service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
  pub access_token:  String,
  #[serde(default = "default_token_type")]
  pub token_type:    String,
  #[serde(default)]
  pub scope:         String,
  pub expires_at:    DateTime<Utc>,
  #[serde(default)]
  pub refresh_token: Option<String>,
}

fn default_token_type() -> String { "Bearer".to_owned() }

impl Token {
  /// True once `now` is within the leeway window of `expires_at`.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= self.expires_at
  }

  pub fn is_expired(&self) -> bool { self.is_expired_at(Utc::now()) }
}

impl std::fmt::Debug for Token {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Token")
      .field("token_type", &self.token_type)
      .field("scope", &self.scope)
      .field("expires_at", &self.expires_at)
      .finish_non_exhaustive()
  }
}

/// Body of a successful `POST /api/token`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
  pub access_token:  String,
  #[serde(default = "default_token_type")]
  pub token_type:    String,
  #[serde(default)]
  pub scope:         String,
  pub expires_in:    i64,
  #[serde(default)]
  pub refresh_token: Option<String>,
}

impl TokenResponse {
  /// The accounts service may omit `refresh_token`, in which case the one
  /// used for this refresh stays valid.
  pub fn into_token(self, issued_at: DateTime<Utc>, previous_refresh: &str) -> Token {
    Token {
      access_token:  self.access_token,
      token_type:    self.token_type,
      scope:         self.scope,
      expires_at:    issued_at + Duration::seconds(self.expires_in),
      refresh_token: self
        .refresh_token
        .or_else(|| Some(previous_refresh.to_owned())),
    }
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// JSON file holding the most recently issued [`Token`].
#[derive(Debug, Clone)]
pub struct TokenCache {
  path: PathBuf,
}

impl TokenCache {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  /// Read the cached token. A missing or unparsable file reads as empty.
  pub async fn load(&self) -> Option<Token> {
    let raw = match tokio::fs::read(&self.path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return None,
      Err(e) => {
        tracing::warn!(path = %self.path.display(), error = %e, "token cache unreadable");
        return None;
      }
    };

    match serde_json::from_slice(&raw) {
      Ok(token) => Some(token),
      Err(e) => {
        tracing::warn!(path = %self.path.display(), error = %e, "token cache is corrupt; ignoring");
        None
      }
    }
  }

  pub async fn store(&self, token: &Token) -> Result<()> {
    let raw = serde_json::to_vec_pretty(token)?;
    tokio::fs::write(&self.path, raw)
      .await
      .map_err(|e| crate::Error::CacheIo { path: self.path.clone(), source: e })?;
    Ok(())
  }
}
