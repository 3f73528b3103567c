//! The [`PlayHistorySource`] trait: where play events come from.

use std::future::Future;

use crate::record::RecentlyPlayedPage;

/// Page size used by a scheduled ingestion run.
pub const INGEST_PAGE_LIMIT: u32 = 50;

/// Page size used by the connectivity check.
pub const DIAGNOSTIC_LIMIT: u32 = 5;

/// Abstraction over an authenticated upstream that reports recently played
/// tracks.
///
/// Implementations own their credentials and token handling. Errors convert
/// into [`crate::Error`] so callers can tell auth failures apart from
/// transport failures.
pub trait PlayHistorySource: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Fetch the `limit` most recent play events, newest first.
  fn recently_played(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<RecentlyPlayedPage, Self::Error>> + Send + '_;
}
