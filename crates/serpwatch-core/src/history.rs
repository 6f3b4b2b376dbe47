//! Persisted ranking state.
//!
//! Two independent records are written from every committed observation:
//! a single-slot [`RankRecord`] per keyword, overwritten in place, and
//! append-only [`CompetitorSnapshot`] rows. Classification only ever needs
//! the immediately preceding record, so the current state never grows with
//! the number of runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keyword::Keyword;

/// The last known ranking of a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
  pub keyword:    String,
  /// `None` when the domain was outside the observed depth.
  pub rank:       Option<u32>,
  /// Set exactly when `rank` is set.
  pub url:        Option<String>,
  pub checked_at: DateTime<Utc>,
}

/// One competitor row of a historical snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
  pub keyword:    String,
  pub url:        String,
  pub rank:       u32,
  pub checked_at: DateTime<Utc>,
}

/// A catalogued keyword joined with its last known ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordStatus {
  pub keyword: Keyword,
  pub record:  Option<RankRecord>,
}
