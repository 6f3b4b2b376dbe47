//! Per-check parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serpwatch_core::serp::{Device, JobSpec};

/// Search and pacing parameters of a check, deserialised from the `[check]`
/// config section. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckParams {
  pub language_code:         String,
  pub location_code:         u32,
  pub device:                Device,
  /// Ranked positions requested per job.
  pub depth:                 u32,
  /// Jobs sent per submission call.
  pub batch_size:            usize,
  pub poll_interval_secs:    u64,
  pub poll_timeout_secs:     u64,
  /// Display cap on competitors ranked above the tracked domain.
  pub max_competitors_above: usize,
  /// How many dropped keywords are handed on for competitor analysis.
  pub max_analysis_keywords: usize,
}

impl Default for CheckParams {
  fn default() -> Self {
    Self {
      language_code:         "ja".to_string(),
      location_code:         2392,
      device:                Device::Desktop,
      depth:                 10,
      batch_size:            100,
      poll_interval_secs:    20,
      poll_timeout_secs:     900,
      max_competitors_above: 3,
      max_analysis_keywords: 5,
    }
  }
}

impl CheckParams {
  pub fn poll_interval(&self) -> Duration { Duration::from_secs(self.poll_interval_secs) }

  pub fn poll_timeout(&self) -> Duration { Duration::from_secs(self.poll_timeout_secs) }

  /// Batch size, never below one.
  pub fn batch_size(&self) -> usize { self.batch_size.max(1) }

  pub fn job_spec(&self, keyword: impl Into<String>) -> JobSpec {
    JobSpec {
      keyword:       keyword.into(),
      language_code: self.language_code.clone(),
      location_code: self.location_code,
      device:        self.device,
      depth:         self.depth,
    }
  }
}
