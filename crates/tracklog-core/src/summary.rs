//! Human-readable summaries for the connectivity check.

use std::fmt;

use serde_json::Value;

use crate::{Error, Result, source::PlayHistorySource};

/// `"<track name> - <first artist>"` for one play event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
  pub name:   String,
  pub artist: String,
}

impl TrackSummary {
  /// Returns `None` when the item has no track name or no named artist.
  pub fn from_item(item: &Value) -> Option<Self> {
    let track = item.get("track")?;
    let name = track.get("name")?.as_str()?;
    let artist = track
      .get("artists")?
      .as_array()?
      .first()?
      .get("name")?
      .as_str()?;

    Some(Self { name: name.to_owned(), artist: artist.to_owned() })
  }
}

impl fmt::Display for TrackSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} - {}", self.name, self.artist)
  }
}

/// Fetch a small page from `source` and summarise each item.
///
/// Items that can't be summarised are skipped. Nothing is persisted.
pub async fn recent_summaries<P: PlayHistorySource>(
  source: &P,
  limit: u32,
) -> Result<Vec<TrackSummary>> {
  let page = source.recently_played(limit).await.map_err(Into::<Error>::into)?;
  Ok(page.items.iter().filter_map(TrackSummary::from_item).collect())
}
