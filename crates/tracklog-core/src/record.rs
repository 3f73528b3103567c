//! Raw landing-table records and the upstream page they are built from.
//!
//! Nothing here interprets the payload beyond the two fields the landing
//! table indexes on (`track_id` and `played_at`). The full item is carried
//! through untouched as `raw_json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

// ─── Upstream page ───────────────────────────────────────────────────────────

/// Cursor pair returned alongside a recently-played page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursors {
  pub after:  Option<String>,
  pub before: Option<String>,
}

/// One page of the "recently played" endpoint.
///
/// Items stay as raw JSON so they can be stored verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentlyPlayedPage {
  #[serde(default)]
  pub items:   Vec<Value>,
  #[serde(default)]
  pub next:    Option<String>,
  #[serde(default)]
  pub cursors: Option<Cursors>,
  #[serde(default)]
  pub limit:   Option<u32>,
}

impl RecentlyPlayedPage {
  pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A landing-table row that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRawRecord {
  pub track_id:  Option<String>,
  pub played_at: String,
  pub raw_json:  Value,
}

impl NewRawRecord {
  /// Build a record from the `index`-th item of a recently-played page.
  ///
  /// The item must carry a `track` object and a string `played_at`. A null
  /// `track.id` is allowed (local files have none).
  pub fn from_item(index: usize, item: &Value) -> Result<Self> {
    let track = item
      .get("track")
      .filter(|t| t.is_object())
      .ok_or(Error::MalformedItem { index, reason: "missing track object" })?;

    let played_at = item
      .get("played_at")
      .and_then(Value::as_str)
      .ok_or(Error::MalformedItem { index, reason: "missing played_at" })?;

    Ok(Self {
      track_id:  track.get("id").and_then(Value::as_str).map(str::to_owned),
      played_at: played_at.to_owned(),
      raw_json:  item.clone(),
    })
  }
}

/// A persisted landing-table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
  /// Store-assigned surrogate key; increases monotonically, never reused.
  pub id:          i64,
  /// Store-assigned write time.
  pub inserted_at: DateTime<Utc>,
  pub track_id:    Option<String>,
  /// Event time exactly as the upstream reported it.
  pub played_at:   String,
  pub raw_json:    Value,
}

impl RawRecord {
  /// Parse `played_at` as an RFC 3339 timestamp, if it is one.
  pub fn played_at_utc(&self) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&self.played_at)
      .ok()
      .map(|dt| dt.with_timezone(&Utc))
  }
}
