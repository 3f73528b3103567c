//! Conversions between landing-table columns and domain types.
//!
//! Timestamps are RFC 3339 strings. `raw_json` is compact JSON text.

use chrono::{DateTime, Utc};
use tracklog_core::record::RawRecord;

use crate::{Error, Result};

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_json(value: &serde_json::Value) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

/// Row as read straight from SQLite, before decoding.
pub struct RawRow {
  pub id:          i64,
  pub inserted_at: String,
  pub track_id:    Option<String>,
  pub played_at:   String,
  pub raw_json:    String,
}

impl RawRow {
  pub const COLUMNS: &'static str = "id, inserted_at, track_id, played_at, raw_json";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      inserted_at: row.get(1)?,
      track_id:    row.get(2)?,
      played_at:   row.get(3)?,
      raw_json:    row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<RawRecord> {
    Ok(RawRecord {
      id:          self.id,
      inserted_at: decode_dt(&self.inserted_at)?,
      track_id:    self.track_id,
      played_at:   self.played_at,
      raw_json:    serde_json::from_str(&self.raw_json)?,
    })
  }
}
