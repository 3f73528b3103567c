//! [`SqliteStore`] — the SQLite implementation of [`RawTrackStore`].

use std::path::Path;

use tracklog_core::{
  record::{NewRawRecord, RawRecord},
  store::RawTrackStore,
};

use crate::{
  Location, Result,
  encode::{RawRow, encode_json},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A landing store backed by a single SQLite database.
///
/// Cloning is cheap — the inner connection is reference-counted, so one
/// store can be shared for the life of the process.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the database named by a connection string such as
  /// `sqlite://tracks.db` (see [`Location::parse`]).
  pub async fn connect(database_url: &str) -> Result<Self> {
    match Location::parse(database_url)? {
      Location::Memory => Self::open_in_memory().await,
      Location::Path(path) => Self::open(path).await,
    }
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RawTrackStore impl ──────────────────────────────────────────────────────

impl RawTrackStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_batch(&self, records: Vec<NewRawRecord>) -> Result<Vec<RawRecord>> {
    if records.is_empty() {
      return Ok(Vec::new());
    }

    let encoded = records
      .into_iter()
      .map(|r| Ok((r.track_id, r.played_at, encode_json(&r.raw_json)?)))
      .collect::<Result<Vec<_>>>()?;

    let written = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without commit rolls the whole batch back.
        let tx = conn.transaction()?;
        let mut rows = Vec::with_capacity(encoded.len());
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO bronze_raw_tracks (track_id, played_at, raw_json)
             VALUES (?1, ?2, ?3)
             RETURNING {}",
            RawRow::COLUMNS
          ))?;
          for (track_id, played_at, raw_json) in &encoded {
            rows.push(stmt.query_row(
              rusqlite::params![track_id, played_at, raw_json],
              RawRow::from_row,
            )?);
          }
        }
        // Rows that can't be read back are not committed.
        let decoded = rows
          .into_iter()
          .map(RawRow::into_record)
          .collect::<Result<Vec<_>>>();
        if decoded.is_ok() {
          tx.commit()?;
        }
        Ok(decoded)
      })
      .await??;

    tracing::debug!(rows = written.len(), "committed landing batch");
    Ok(written)
  }

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM bronze_raw_tracks", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn recent(&self, limit: usize) -> Result<Vec<RawRecord>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM bronze_raw_tracks ORDER BY id DESC LIMIT ?1",
          RawRow::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRow::into_record).collect()
  }
}
