//! Parsing of `DATABASE_URL` into something SQLite can open.
//!
//! Only SQLite databases are supported. Server URLs such as `postgres://` or
//! `postgresql://` are rejected with [`Error::UnsupportedUrl`] when the store
//! is opened.

use std::path::PathBuf;

use crate::{Error, Result};

/// Where the landing database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
  Memory,
  Path(PathBuf),
}

impl Location {
  /// Accepts `sqlite::memory:`, `:memory:`, `sqlite://<path>`,
  /// `sqlite:<path>`, `file:<path>` and bare paths. Query strings such as
  /// `?mode=rwc` are ignored. Any other scheme is rejected.
  pub fn parse(url: &str) -> Result<Self> {
    let url = url.trim();
    let unsupported = || Error::UnsupportedUrl(url.to_owned());

    let rest = ["sqlite://", "sqlite:", "file:"]
      .iter()
      .find_map(|prefix| url.strip_prefix(prefix))
      .unwrap_or(url);
    let rest = rest.split('?').next().unwrap_or_default();

    if rest.is_empty() || (rest == url && url.contains("://")) {
      return Err(unsupported());
    }

    match rest {
      ":memory:" => Ok(Self::Memory),
      path => Ok(Self::Path(PathBuf::from(path))),
    }
  }
}
