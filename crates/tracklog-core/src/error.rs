//! Error taxonomy shared by every tracklog crate.

use thiserror::Error;

/// A type-erased error from a collaborator (HTTP client, store driver).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// A required setting is missing, blank, or could not be coerced.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Token refresh failed, or the upstream rejected our credentials.
  #[error("upstream auth error: {0}")]
  UpstreamAuth(#[source] BoxError),

  /// Transport failure or non-success response from the upstream API.
  #[error("upstream request error: {0}")]
  UpstreamRequest(#[source] BoxError),

  /// An item in the fetched page lacks a field we extract.
  #[error("malformed item at index {index}: {reason}")]
  MalformedItem { index: usize, reason: &'static str },

  /// Batch insert or commit failed; nothing from the batch was persisted.
  #[error("store write error: {0}")]
  StoreWrite(#[source] BoxError),
}

impl Error {
  pub fn store_write(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::StoreWrite(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
