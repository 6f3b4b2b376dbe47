//! Wire shapes of the task API responses.
//!
//! Every response is wrapped in an [`Envelope`] whose `tasks` array holds one
//! entry per submitted or looked-up task. Arrays the API may send as `null`
//! are modelled as `Option<Vec<_>>`.

use serde::{Deserialize, Serialize};
use serpwatch_core::serp::JobSpec;

/// Envelope status code of a successful request.
pub const OK: u32 = 20000;

/// Per-task status code of a task that was accepted for processing.
pub const TASK_CREATED: u32 = 20100;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  pub status_code:    u32,
  #[serde(default)]
  pub status_message: String,
  pub tasks:          Option<Vec<T>>,
}

impl<T> Envelope<T> {
  /// Fail unless the envelope reports success; otherwise yield its tasks.
  pub fn into_tasks(self) -> crate::Result<Vec<T>> {
    if self.status_code != OK {
      return Err(crate::Error::Api { code: self.status_code, message: self.status_message });
    }
    Ok(self.tasks.unwrap_or_default())
  }
}

// ─── task_post ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PostTask<'a> {
  pub keyword:       &'a str,
  pub language_code: &'a str,
  pub location_code: u32,
  pub device:        &'static str,
  pub depth:         u32,
}

impl<'a> From<&'a JobSpec> for PostTask<'a> {
  fn from(spec: &'a JobSpec) -> Self {
    Self {
      keyword:       &spec.keyword,
      language_code: &spec.language_code,
      location_code: spec.location_code,
      device:        spec.device.as_str(),
      depth:         spec.depth,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct PostedTask {
  #[serde(default)]
  pub id:             Option<String>,
  pub status_code:    u32,
  #[serde(default)]
  pub status_message: String,
  /// The submitted job parameters, echoed back.
  #[serde(default)]
  pub data:           Option<PostedData>,
}

impl PostedTask {
  pub fn echoed_keyword(&self) -> Option<&str> { self.data.as_ref().map(|d| d.keyword.as_str()) }
}

#[derive(Debug, Deserialize)]
pub struct PostedData {
  pub keyword: String,
}

// ─── tasks_ready ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReadyTask {
  #[serde(default)]
  pub result: Option<Vec<ReadyEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct ReadyEntry {
  pub id: String,
}

// ─── task_get ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FetchedTask {
  pub status_code:    u32,
  #[serde(default)]
  pub status_message: String,
  #[serde(default)]
  pub result:         Option<Vec<FetchedResult>>,
}

#[derive(Debug, Deserialize)]
pub struct FetchedResult {
  #[serde(default)]
  pub keyword: String,
  /// Kept as raw values so one malformed entry does not sink the listing.
  #[serde(default)]
  pub items:   Option<Vec<serde_json::Value>>,
}
