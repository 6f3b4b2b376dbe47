//! Error type for `serpwatch-check`.
//!
//! Provider and store failures inside a run are logged and absorbed, so the
//! only error a run can return is the concurrency guard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
  #[error("a check is already running")]
  AlreadyRunning,
}
