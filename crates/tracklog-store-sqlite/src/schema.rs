//! SQL schema for the landing table.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Raw play events, one row per upstream item.
-- Append-only: no UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS bronze_raw_tracks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    track_id    TEXT,            -- NULL for tracks without an upstream id
    played_at   TEXT NOT NULL,   -- as reported upstream, not reformatted
    raw_json    TEXT NOT NULL CHECK (json_valid(raw_json))
);

CREATE INDEX IF NOT EXISTS bronze_raw_tracks_played_idx ON bronze_raw_tracks(played_at);
CREATE INDEX IF NOT EXISTS bronze_raw_tracks_track_idx  ON bronze_raw_tracks(track_id);

PRAGMA user_version = 1;
";
