//! The extraction service: fetch one page of play events and land it.

use tracing::{debug, error, info};

use crate::{
  Error, Result,
  record::NewRawRecord,
  session::Session,
  source::{INGEST_PAGE_LIMIT, PlayHistorySource},
  store::RawTrackStore,
};

/// What a successful ingestion run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
  /// The upstream returned an empty page; no transaction was opened.
  NothingNew,
  /// `count` rows were appended in one transaction.
  Ingested { count: usize },
}

/// Pulls recently played tracks from `P` and appends them to `S`.
///
/// Each call is independent. There is no dedup key, so running twice over
/// overlapping upstream pages stores the overlap twice.
pub struct Ingestor<P, S> {
  source: P,
  store:  S,
  limit:  u32,
}

impl<P, S> Ingestor<P, S>
where
  P: PlayHistorySource,
  S: RawTrackStore,
{
  pub fn new(source: P, store: S) -> Self {
    Self { source, store, limit: INGEST_PAGE_LIMIT }
  }

  /// Override the page size requested from the upstream.
  pub fn with_limit(mut self, limit: u32) -> Self {
    self.limit = limit;
    self
  }

  pub fn source(&self) -> &P { &self.source }

  pub fn store(&self) -> &S { &self.store }

  /// Fetch one page and append every item to the landing table.
  ///
  /// Any failure is logged and the session rolled back before the error is
  /// returned. Nothing is retried.
  pub async fn ingest_recently_played(&self) -> Result<IngestOutcome> {
    let mut session = self.store.session();
    info!(limit = self.limit, "fetching recently played tracks");

    match self.fetch_and_commit(&mut session).await {
      Ok(outcome) => Ok(outcome),
      Err(err) => {
        error!(error = %err, "ingestion failed");
        let discarded = session.rollback();
        debug!(discarded, "rolled back ingestion session");
        Err(err)
      }
    }
  }

  async fn fetch_and_commit(&self, session: &mut Session<'_, S>) -> Result<IngestOutcome> {
    let page = self
      .source
      .recently_played(self.limit)
      .await
      .map_err(Into::<Error>::into)?;

    if page.is_empty() {
      info!("no new tracks found");
      return Ok(IngestOutcome::NothingNew);
    }

    let records = page
      .items
      .iter()
      .enumerate()
      .map(|(index, item)| NewRawRecord::from_item(index, item))
      .collect::<Result<Vec<_>>>()?;

    session.add_all(records);
    let written = session.commit().await.map_err(Error::store_write)?;

    info!(count = written.len(), "ingested recently played tracks");
    Ok(IngestOutcome::Ingested { count: written.len() })
  }
}
