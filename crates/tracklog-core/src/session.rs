//! Scoped units of work over a [`RawTrackStore`].
//!
//! A [`Session`] stages records in memory and hands them to the store as one
//! batch on [`Session::commit`]. Nothing reaches the database before that
//! call, so rolling back before commit is just discarding the staged rows,
//! and a failed commit leaves nothing behind because the store writes the
//! batch in a single transaction.
//!
//! Dropping a session closes it. Any records still staged at that point are
//! discarded.

use crate::{
  record::{NewRawRecord, RawRecord},
  store::RawTrackStore,
};

pub struct Session<'s, S: RawTrackStore> {
  store:  &'s S,
  staged: Vec<NewRawRecord>,
}

impl<'s, S: RawTrackStore> Session<'s, S> {
  pub fn new(store: &'s S) -> Self { Self { store, staged: Vec::new() } }

  /// Stage records for the next commit.
  pub fn add_all(&mut self, records: impl IntoIterator<Item = NewRawRecord>) {
    self.staged.extend(records);
  }

  pub fn staged(&self) -> &[NewRawRecord] { &self.staged }

  /// Write every staged record in one batch.
  ///
  /// The staged list is drained whether or not the write succeeds. With
  /// nothing staged, the store is not called.
  pub async fn commit(&mut self) -> Result<Vec<RawRecord>, S::Error> {
    if self.staged.is_empty() {
      return Ok(Vec::new());
    }
    let batch = std::mem::take(&mut self.staged);
    self.store.insert_batch(batch).await
  }

  /// Discard staged records. Returns how many were dropped.
  pub fn rollback(&mut self) -> usize {
    let dropped = self.staged.len();
    self.staged.clear();
    dropped
  }
}

impl<S: RawTrackStore> Drop for Session<'_, S> {
  fn drop(&mut self) {
    if !self.staged.is_empty() {
      tracing::debug!(
        discarded = self.staged.len(),
        "session closed with uncommitted records"
      );
    }
  }
}
