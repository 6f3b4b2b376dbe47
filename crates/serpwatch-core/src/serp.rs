//! Job and result types exchanged with the external ranking provider.
//!
//! The provider runs each keyword as an asynchronous job: it is submitted,
//! becomes ready at some later point, and its result listing is fetched
//! separately. These types are the provider-neutral shape of that protocol.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Job parameters ──────────────────────────────────────────────────────────

/// The device class the search is performed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
  #[default]
  Desktop,
  Mobile,
}

impl Device {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Desktop => "desktop",
      Self::Mobile => "mobile",
    }
  }
}

impl FromStr for Device {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "desktop" => Ok(Self::Desktop),
      "mobile" => Ok(Self::Mobile),
      other => Err(Error::UnknownDevice(other.to_owned())),
    }
  }
}

/// One job to submit: a single keyword with its search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
  pub keyword:       String,
  pub language_code: String,
  pub location_code: u32,
  pub device:        Device,
  /// Number of ranked positions requested.
  pub depth:         u32,
}

// ─── Job identity and status ─────────────────────────────────────────────────

/// Opaque, provider-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for JobId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Status codes that mean the job finished and its result can be fetched.
pub const COMPLETED_CODES: RangeInclusive<u32> = 20000..=20000;

/// Status codes that mean the job failed permanently. Such jobs are never
/// retried within a run.
pub const FAILED_CODES: RangeInclusive<u32> = 40000..=49999;

/// The lifecycle state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  InProgress,
  Completed,
  Failed,
}

impl JobStatus {
  /// Classify a numeric provider status code. Anything outside the
  /// completed and failed ranges is still in progress.
  pub fn from_code(code: u32) -> Self {
    if COMPLETED_CODES.contains(&code) {
      Self::Completed
    } else if FAILED_CODES.contains(&code) {
      Self::Failed
    } else {
      Self::InProgress
    }
  }

  pub fn is_terminal(self) -> bool { !matches!(self, Self::InProgress) }
}

/// Per-job outcome of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
  Accepted { job_id: JobId, keyword: String },
  Rejected { keyword: String, reason: String },
}

/// Outcome of fetching one job's result.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
  Ready(SerpResult),
  /// The provider reports the job as permanently failed.
  Failed(String),
  /// The job has no result yet.
  Pending,
}

// ─── Result listing ──────────────────────────────────────────────────────────

/// Entry type of a regular (non-paid, non-feature) search result.
pub const ORGANIC: &str = "organic";

/// One entry of a result listing. Every field is optional because listings
/// mix organic results with ads and rich features of differing shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpEntry {
  #[serde(rename = "type", default)]
  pub kind:          Option<String>,
  #[serde(default)]
  pub rank_absolute: Option<u32>,
  #[serde(default)]
  pub rank_group:    Option<u32>,
  #[serde(default)]
  pub url:           Option<String>,
}

impl SerpEntry {
  /// Build an organic entry; mostly useful in tests and fixtures.
  pub fn organic(rank: u32, url: impl Into<String>) -> Self {
    Self {
      kind:          Some(ORGANIC.to_owned()),
      rank_absolute: Some(rank),
      rank_group:    None,
      url:           Some(url.into()),
    }
  }

  /// Decode one raw listing entry.
  pub fn from_value(value: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  pub fn is_organic(&self) -> bool { self.kind.as_deref() == Some(ORGANIC) }

  /// The entry's absolute position, falling back to its group position.
  /// Zero is treated as absent.
  pub fn rank(&self) -> Option<u32> {
    self
      .rank_absolute
      .filter(|r| *r > 0)
      .or(self.rank_group.filter(|r| *r > 0))
  }
}

/// A completed job's result listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResult {
  /// The keyword as echoed back by the provider.
  pub keyword: String,
  pub entries: Vec<SerpEntry>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn status_code_ranges() {
    assert_eq!(JobStatus::from_code(20000), JobStatus::Completed);
    assert_eq!(JobStatus::from_code(40000), JobStatus::Failed);
    assert_eq!(JobStatus::from_code(40501), JobStatus::Failed);
    assert_eq!(JobStatus::from_code(49999), JobStatus::Failed);
    assert_eq!(JobStatus::from_code(20100), JobStatus::InProgress);
    assert_eq!(JobStatus::from_code(50000), JobStatus::InProgress);
    assert!(!JobStatus::InProgress.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
  }

  #[test]
  fn rank_falls_back_to_group() {
    let entry = SerpEntry {
      kind:          Some("organic".into()),
      rank_absolute: Some(0),
      rank_group:    Some(4),
      url:           Some("https://a.test/".into()),
    };
    assert_eq!(entry.rank(), Some(4));
    assert_eq!(SerpEntry::default().rank(), None);
  }

  #[test]
  fn decodes_entries_with_unknown_fields() {
    let entry = SerpEntry::from_value(json!({
      "type": "organic",
      "rank_absolute": 2,
      "rank_group": 2,
      "url": "https://a.test/",
      "title": "ignored",
    }))
    .unwrap();
    assert!(entry.is_organic());
    assert_eq!(entry.rank(), Some(2));
  }

  #[test]
  fn rejects_mistyped_entries() {
    assert!(SerpEntry::from_value(json!({ "rank_absolute": "first" })).is_err());
  }

  #[test]
  fn parses_device() {
    assert_eq!("Mobile".parse::<Device>().unwrap(), Device::Mobile);
    assert!("tablet".parse::<Device>().is_err());
  }
}
