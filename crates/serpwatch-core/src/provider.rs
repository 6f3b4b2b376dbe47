//! The `RankProvider` trait: capability surface of the external ranking API.
//!
//! Completion is observable through two independent signals, a cheap global
//! ready list ([`RankProvider::ready`]) that may lag behind, and a per-job
//! status lookup ([`RankProvider::status`]). Either one is sufficient to
//! treat a job as complete.

use std::future::Future;

use crate::serp::{FetchOutcome, JobId, JobSpec, JobStatus, Submission};

pub trait RankProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Submit a batch of jobs in one call. The returned vector has one
  /// [`Submission`] per input job, in order.
  fn submit<'a>(
    &'a self,
    jobs: &'a [JobSpec],
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + 'a;

  /// Identifiers the provider currently lists as ready. Best effort: a
  /// completed job may be missing from this list.
  fn ready(&self) -> impl Future<Output = Result<Vec<JobId>, Self::Error>> + Send + '_;

  /// Direct status lookup for one job.
  fn status<'a>(
    &'a self,
    id: &'a JobId,
  ) -> impl Future<Output = Result<JobStatus, Self::Error>> + Send + 'a;

  /// Retrieve a job's result listing.
  fn fetch<'a>(
    &'a self,
    id: &'a JobId,
  ) -> impl Future<Output = Result<FetchOutcome, Self::Error>> + Send + 'a;
}
