//! Classifying a new observation against the previous record.
//!
//! Only movement inside, or out of, the page-one window counts as a
//! regression. A keyword whose previous rank was outside the window (or
//! absent) is never evaluated for a drop, and a keyword seen for the first
//! time is recorded without being surfaced.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{
  history::RankRecord,
  observation::{RankObservation, RankedUrl},
};

/// The observed window in which drops are significant.
pub const PAGE_ONE: RangeInclusive<u32> = 1..=10;

fn in_window(rank: Option<u32>) -> Option<u32> { rank.filter(|r| PAGE_ONE.contains(r)) }

// ─── Surfaced outcomes ───────────────────────────────────────────────────────

/// A keyword whose rank worsened within the page-one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedKeyword {
  pub keyword:           String,
  pub previous_rank:     u32,
  pub current_rank:      u32,
  pub url:               String,
  pub competitors_above: Vec<RankedUrl>,
}

impl DroppedKeyword {
  /// Number of positions lost. Always positive.
  pub fn magnitude(&self) -> u32 { self.current_rank - self.previous_rank }
}

/// A keyword that was on page one and is no longer within the observed depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VanishedKeyword {
  pub keyword:       String,
  pub previous_rank: u32,
  pub last_url:      Option<String>,
}

// ─── RankDelta ───────────────────────────────────────────────────────────────

/// The transition from the previous record to the current observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RankDelta {
  /// No previous record exists. Recorded, never surfaced.
  FirstObservation {
    keyword: String,
    current: Option<RankedUrl>,
  },
  Improved {
    keyword:       String,
    previous_rank: u32,
    current_rank:  u32,
  },
  /// Unchanged, or not eligible for evaluation (previous rank outside the
  /// window, or current rank past the window but still within depth).
  Stable {
    keyword:       String,
    previous_rank: Option<u32>,
    current_rank:  Option<u32>,
  },
  Dropped(DroppedKeyword),
  OutOfWindow(VanishedKeyword),
}

impl RankDelta {
  pub fn keyword(&self) -> &str {
    match self {
      Self::FirstObservation { keyword, .. }
      | Self::Improved { keyword, .. }
      | Self::Stable { keyword, .. } => keyword,
      Self::Dropped(d) => &d.keyword,
      Self::OutOfWindow(v) => &v.keyword,
    }
  }

  /// Whether this outcome is handed to downstream notification.
  pub fn is_regression(&self) -> bool {
    matches!(self, Self::Dropped(_) | Self::OutOfWindow(_))
  }
}

/// Classify `current` against `previous`.
pub fn classify(previous: Option<&RankRecord>, current: &RankObservation) -> RankDelta {
  let keyword = current.keyword.clone();

  let Some(previous) = previous else {
    return RankDelta::FirstObservation { keyword, current: current.own.clone() };
  };

  let current_rank = current.rank();
  let Some(previous_rank) = in_window(previous.rank) else {
    return RankDelta::Stable { keyword, previous_rank: previous.rank, current_rank };
  };

  match (&current.own, in_window(current_rank)) {
    (None, _) => RankDelta::OutOfWindow(VanishedKeyword {
      keyword,
      previous_rank,
      last_url: previous.url.clone(),
    }),
    (Some(own), Some(rank)) if rank > previous_rank => RankDelta::Dropped(DroppedKeyword {
      keyword,
      previous_rank,
      current_rank: rank,
      url: own.url.clone(),
      competitors_above: current.competitors_above.clone(),
    }),
    (Some(_), Some(rank)) if rank < previous_rank => RankDelta::Improved {
      keyword,
      previous_rank,
      current_rank: rank,
    },
    (Some(_), _) => RankDelta::Stable {
      keyword,
      previous_rank: Some(previous_rank),
      current_rank,
    },
  }
}
