//! The check engine.
//!
//! [`TaskLifecycle`] drives provider jobs from submission to a terminal state
//! and [`CheckOrchestrator`] runs a whole check: batch submission, waiting,
//! normalisation, classification against the previous record, and commit.
//! Both are generic over the traits in `serpwatch-core`, so any provider and
//! history backend can be plugged in.

pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod params;
pub mod report;

#[cfg(test)]
mod fake;

pub use error::CheckError;
pub use lifecycle::{BatchSubmission, SubmittedJob, TaskLifecycle, WaitOutcome};
pub use orchestrator::CheckOrchestrator;
pub use params::CheckParams;
pub use report::{CheckReport, RejectedKeyword};
