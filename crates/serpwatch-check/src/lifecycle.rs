//! Driving provider jobs through submit, wait and fetch.
//!
//! Every provider call here is fallible in isolation: a failed call is
//! logged and counts as "no data this round". Only the overall poll timeout
//! ends the wait early.

use std::{collections::HashSet, time::Duration};

use serpwatch_core::{
  provider::RankProvider,
  serp::{FetchOutcome, JobId, JobSpec, JobStatus, SerpResult, Submission},
};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// A job the provider accepted, with the keyword it was submitted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
  pub job_id:  JobId,
  pub keyword: String,
}

/// The split of one batch submission.
#[derive(Debug, Default)]
pub struct BatchSubmission {
  pub accepted: Vec<SubmittedJob>,
  /// `(keyword, reason)` for every job that was not accepted.
  pub rejected: Vec<(String, String)>,
}

/// Where each waited-on job ended up. Every list keeps the input order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WaitOutcome {
  pub completed: Vec<JobId>,
  pub failed:    Vec<JobId>,
  /// Still in progress when the timeout elapsed.
  pub pending:   Vec<JobId>,
}

pub struct TaskLifecycle<'p, P> {
  provider:      &'p P,
  poll_interval: Duration,
  poll_timeout:  Duration,
}

impl<'p, P: RankProvider> TaskLifecycle<'p, P> {
  pub fn new(provider: &'p P, poll_interval: Duration, poll_timeout: Duration) -> Self {
    Self { provider, poll_interval, poll_timeout }
  }

  // ─── Submit ────────────────────────────────────────────────────────────────

  /// Submit `jobs` in a single call. Rejections are logged and returned; a
  /// failed call rejects the whole batch.
  pub async fn submit_batch(&self, jobs: &[JobSpec]) -> BatchSubmission {
    let mut out = BatchSubmission::default();
    if jobs.is_empty() {
      return out;
    }

    let submissions = match self.provider.submit(jobs).await {
      Ok(s) => s,
      Err(e) => {
        warn!(jobs = jobs.len(), error = %e, "batch submission failed");
        out.rejected = jobs
          .iter()
          .map(|j| (j.keyword.clone(), format!("submission failed: {e}")))
          .collect();
        return out;
      }
    };

    for submission in submissions {
      match submission {
        Submission::Accepted { job_id, keyword } => {
          debug!(%job_id, %keyword, "job accepted");
          out.accepted.push(SubmittedJob { job_id, keyword });
        }
        Submission::Rejected { keyword, reason } => {
          warn!(%keyword, %reason, "job rejected");
          out.rejected.push((keyword, reason));
        }
      }
    }

    out
  }

  // ─── Wait ──────────────────────────────────────────────────────────────────

  /// Poll until every id is terminal or the timeout elapses.
  ///
  /// Each round first consults the ready list, then looks up the status of
  /// every id it did not mention. Either signal is enough to mark a job as
  /// completed; failed jobs leave the wait set and are never retried.
  pub async fn wait(&self, ids: &[JobId]) -> WaitOutcome {
    let deadline = Instant::now() + self.poll_timeout;
    let mut completed: HashSet<&JobId> = HashSet::new();
    let mut failed: HashSet<&JobId> = HashSet::new();
    let mut waiting: Vec<&JobId> = ids.iter().collect();
    let mut round = 0u32;

    while !waiting.is_empty() {
      round += 1;

      match self.provider.ready().await {
        Ok(ready) => {
          let ready: HashSet<JobId> = ready.into_iter().collect();
          waiting.retain(|id| {
            if ready.contains(*id) {
              completed.insert(*id);
              false
            } else {
              true
            }
          });
        }
        Err(e) => warn!(round, error = %e, "ready list unavailable"),
      }

      let mut still_waiting = Vec::with_capacity(waiting.len());
      for id in waiting {
        match self.provider.status(id).await {
          Ok(JobStatus::Completed) => {
            completed.insert(id);
          }
          Ok(JobStatus::Failed) => {
            warn!(job_id = %id, "job failed");
            failed.insert(id);
          }
          Ok(JobStatus::InProgress) => still_waiting.push(id),
          Err(e) => {
            warn!(job_id = %id, error = %e, "status lookup failed");
            still_waiting.push(id);
          }
        }
      }
      waiting = still_waiting;

      debug!(round, completed = completed.len(), failed = failed.len(), waiting = waiting.len(), "poll round");

      if waiting.is_empty() {
        break;
      }
      let now = Instant::now();
      if now >= deadline {
        warn!(pending = waiting.len(), "poll timeout reached; abandoning pending jobs");
        break;
      }
      sleep(self.poll_interval.min(deadline - now)).await;
    }

    let pick = |set: &HashSet<&JobId>| -> Vec<JobId> {
      ids.iter().filter(|id| set.contains(id)).cloned().collect()
    };
    let outcome = WaitOutcome {
      completed: pick(&completed),
      failed:    pick(&failed),
      pending:   ids
        .iter()
        .filter(|id| !completed.contains(id) && !failed.contains(id))
        .cloned()
        .collect(),
    };
    info!(
      completed = outcome.completed.len(),
      failed = outcome.failed.len(),
      pending = outcome.pending.len(),
      "wait finished"
    );
    outcome
  }

  // ─── Fetch ─────────────────────────────────────────────────────────────────

  /// Retrieve the listing of a completed job. `None` if the provider reports
  /// a failure, has no result yet, or the call itself fails.
  pub async fn fetch(&self, id: &JobId) -> Option<SerpResult> {
    match self.provider.fetch(id).await {
      Ok(FetchOutcome::Ready(result)) => Some(result),
      Ok(FetchOutcome::Failed(reason)) => {
        warn!(job_id = %id, %reason, "job failed at fetch");
        None
      }
      Ok(FetchOutcome::Pending) => {
        warn!(job_id = %id, "job reported complete but has no result");
        None
      }
      Err(e) => {
        warn!(job_id = %id, error = %e, "fetch failed");
        None
      }
    }
  }
}
