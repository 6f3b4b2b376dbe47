//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Ranks are stored as integers.

use chrono::{DateTime, SecondsFormat, Utc};
use serpwatch_core::{
  history::{CompetitorSnapshot, RankRecord},
  keyword::Keyword,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rank ────────────────────────────────────────────────────────────────────

pub fn encode_rank(rank: u32) -> i64 { i64::from(rank) }

pub fn decode_rank(raw: i64) -> Result<u32> { u32::try_from(raw).map_err(|_| Error::InvalidRank(raw)) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `keywords` row as read from SQLite, before decoding.
pub struct RawKeyword {
  pub keyword:    String,
  pub genre:      Option<String>,
  pub url:        Option<String>,
  pub priority:   Option<String>,
  pub notes:      Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawKeyword {
  /// Column order: keyword, genre, url, priority, notes, created_at, updated_at.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      keyword:    row.get(offset)?,
      genre:      row.get(offset + 1)?,
      url:        row.get(offset + 2)?,
      priority:   row.get(offset + 3)?,
      notes:      row.get(offset + 4)?,
      created_at: row.get(offset + 5)?,
      updated_at: row.get(offset + 6)?,
    })
  }

  pub fn into_keyword(self) -> Result<Keyword> {
    Ok(Keyword {
      phrase:     self.keyword,
      genre:      self.genre,
      url:        self.url,
      priority:   self.priority,
      note:       self.notes,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A `rankings` row as read from SQLite, before decoding.
pub struct RawRecord {
  pub keyword:         String,
  pub last_rank:       Option<i64>,
  pub last_url:        Option<String>,
  pub last_checked_at: String,
}

impl RawRecord {
  /// Column order: keyword, last_rank, last_url, last_checked_at.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      keyword:         row.get(offset)?,
      last_rank:       row.get(offset + 1)?,
      last_url:        row.get(offset + 2)?,
      last_checked_at: row.get(offset + 3)?,
    })
  }

  pub fn into_record(self) -> Result<RankRecord> {
    Ok(RankRecord {
      keyword:    self.keyword,
      rank:       self.last_rank.map(decode_rank).transpose()?,
      url:        self.last_url,
      checked_at: decode_dt(&self.last_checked_at)?,
    })
  }
}

/// A `competitors` row as read from SQLite, before decoding.
pub struct RawCompetitor {
  pub keyword:    String,
  pub url:        String,
  pub rank:       i64,
  pub checked_at: String,
}

impl RawCompetitor {
  pub fn into_snapshot(self) -> Result<CompetitorSnapshot> {
    Ok(CompetitorSnapshot {
      keyword:    self.keyword,
      url:        self.url,
      rank:       decode_rank(self.rank)?,
      checked_at: decode_dt(&self.checked_at)?,
    })
  }
}
