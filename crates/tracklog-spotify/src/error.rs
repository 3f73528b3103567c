//! Error type for `tracklog-spotify`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid url {url:?}: {reason}")]
  Url { url: String, reason: String },

  /// The accounts service refused to issue an access token.
  #[error("token refresh rejected ({status}): {body}")]
  TokenRefresh { status: u16, body: String },

  /// The Web API rejected the access token or its scopes.
  #[error("unauthorized ({status}): {body}")]
  Unauthorized { status: u16, body: String },

  #[error("request failed ({status}): {body}")]
  Status { status: u16, body: String },

  #[error("limit must be between 1 and 50, got {0}")]
  InvalidLimit(u32),

  #[error("token cache {path:?}: {source}")]
  CacheIo {
    path:   std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl From<Error> for tracklog_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::TokenRefresh { .. } | Error::Unauthorized { .. } => {
        Self::UpstreamAuth(Box::new(err))
      }
      _ => Self::UpstreamRequest(Box::new(err)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
