//! The outcome of one check run, as handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serpwatch_core::delta::{DroppedKeyword, VanishedKeyword};
use uuid::Uuid;

/// A keyword the provider refused at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedKeyword {
  pub keyword: String,
  pub reason:  String,
}

/// Summary of a check run.
///
/// Only regressions are carried in full. Keywords that produced no
/// measurement (`rejected`, `failed`, `abandoned`) are listed so callers can
/// tell that their history was left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
  pub run_id:        Uuid,
  pub target_domain: String,
  pub started_at:    DateTime<Utc>,
  pub finished_at:   DateTime<Utc>,
  /// Timestamp written with every commit of this run.
  pub checked_at:    DateTime<Utc>,
  /// Jobs accepted by the provider.
  pub submitted:     usize,
  /// Keywords whose observation was classified.
  pub completed:     usize,
  /// Largest drop first.
  pub dropped:       Vec<DroppedKeyword>,
  pub out_of_window: Vec<VanishedKeyword>,
  pub rejected:      Vec<RejectedKeyword>,
  pub failed:        Vec<String>,
  /// Still pending when the poll timeout elapsed.
  pub abandoned:     Vec<String>,
}

impl CheckReport {
  pub fn has_regressions(&self) -> bool { !self.dropped.is_empty() || !self.out_of_window.is_empty() }

  /// The biggest drops that have something to compare against: an own URL
  /// and at least one competitor ranked above it.
  pub fn analysis_candidates(&self, max: usize) -> Vec<&DroppedKeyword> {
    self
      .dropped
      .iter()
      .filter(|d| !d.url.is_empty() && !d.competitors_above.is_empty())
      .take(max)
      .collect()
  }
}
