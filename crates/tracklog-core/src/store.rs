//! The [`RawTrackStore`] trait.
//!
//! Implemented by storage backends (e.g. `tracklog-store-sqlite`). The
//! ingestion service depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  record::{NewRawRecord, RawRecord},
  session::Session,
};

/// Append-only landing store for raw play events.
///
/// Rows are never updated or deleted through this trait. All methods return
/// `Send` futures so the trait can be used from a multi-threaded runtime.
pub trait RawTrackStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert every record in one transaction and return the persisted rows in
  /// insertion order.
  ///
  /// Either all records are written or none are. An empty batch returns
  /// immediately without touching the database.
  fn insert_batch(
    &self,
    records: Vec<NewRawRecord>,
  ) -> impl Future<Output = Result<Vec<RawRecord>, Self::Error>> + Send + '_;

  /// Total number of stored rows.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The `limit` most recently inserted rows, newest first.
  fn recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RawRecord>, Self::Error>> + Send + '_;

  /// Open a new scoped unit of work against this store.
  fn session(&self) -> Session<'_, Self>
  where
    Self: Sized,
  {
    Session::new(self)
  }
}
