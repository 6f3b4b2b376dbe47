//! Running a full check over a keyword list.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serpwatch_core::{
  delta::{RankDelta, classify},
  keyword::{normalize_keywords, normalize_phrase},
  observation::ResultNormalizer,
  provider::RankProvider,
  serp::{JobId, JobSpec},
  store::RankHistoryStore,
};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
  error::CheckError,
  lifecycle::TaskLifecycle,
  params::CheckParams,
  report::{CheckReport, RejectedKeyword},
};

/// Runs checks for one tracked domain against one provider and one history
/// store. Only one run may be in flight per instance.
pub struct CheckOrchestrator<P, S> {
  provider:   Arc<P>,
  store:      Arc<S>,
  normalizer: ResultNormalizer,
  params:     CheckParams,
  running:    Mutex<()>,
}

impl<P, S> CheckOrchestrator<P, S>
where
  P: RankProvider,
  S: RankHistoryStore,
{
  pub fn new(provider: Arc<P>, store: Arc<S>, target_domain: &str, params: CheckParams) -> Self {
    Self {
      provider,
      store,
      normalizer: ResultNormalizer::new(target_domain, params.max_competitors_above),
      params,
      running: Mutex::new(()),
    }
  }

  pub fn target_domain(&self) -> &str { self.normalizer.target_domain() }

  pub fn params(&self) -> &CheckParams { &self.params }

  /// Check every keyword once and commit the new observations.
  ///
  /// Failures of individual provider or store calls never abort the run; the
  /// affected keywords show up in the report's `rejected`, `failed` or
  /// `abandoned` lists and keep their previous record.
  pub async fn run(&self, keywords: &[String]) -> Result<CheckReport, CheckError> {
    let Ok(_guard) = self.running.try_lock() else {
      return Err(CheckError::AlreadyRunning);
    };

    let run_id = Uuid::new_v4();
    let span = info_span!("check", %run_id, domain = %self.target_domain());
    Ok(self.run_locked(run_id, keywords).instrument(span).await)
  }

  async fn run_locked(&self, run_id: Uuid, keywords: &[String]) -> CheckReport {
    let started_at = Utc::now();
    let keywords = normalize_keywords(keywords);
    info!(keywords = keywords.len(), "check started");

    let lifecycle = TaskLifecycle::new(
      self.provider.as_ref(),
      self.params.poll_interval(),
      self.params.poll_timeout(),
    );

    let mut report = CheckReport {
      run_id,
      target_domain: self.target_domain().to_string(),
      started_at,
      finished_at: started_at,
      checked_at: started_at,
      submitted: 0,
      completed: 0,
      dropped: Vec::new(),
      out_of_window: Vec::new(),
      rejected: Vec::new(),
      failed: Vec::new(),
      abandoned: Vec::new(),
    };

    // ── Submit every batch before waiting on any of them ─────────────────────
    let mut keyword_of: HashMap<JobId, String> = HashMap::new();
    let mut ids: Vec<JobId> = Vec::new();
    for (batch, chunk) in keywords.chunks(self.params.batch_size()).enumerate() {
      let jobs: Vec<JobSpec> = chunk.iter().map(|k| self.params.job_spec(k.as_str())).collect();
      let submitted = lifecycle.submit_batch(&jobs).await;
      info!(
        batch = batch + 1,
        accepted = submitted.accepted.len(),
        rejected = submitted.rejected.len(),
        "batch submitted"
      );

      for job in submitted.accepted {
        ids.push(job.job_id.clone());
        keyword_of.insert(job.job_id, job.keyword);
      }
      report.rejected.extend(
        submitted
          .rejected
          .into_iter()
          .map(|(keyword, reason)| RejectedKeyword { keyword, reason }),
      );
    }
    report.submitted = ids.len();

    if ids.is_empty() {
      warn!("no jobs accepted");
      report.finished_at = Utc::now();
      return report;
    }

    // ── Wait ─────────────────────────────────────────────────────────────────
    let outcome = lifecycle.wait(&ids).await;
    let keyword_for = |id: &JobId| keyword_of.get(id).cloned().unwrap_or_else(|| id.to_string());
    report.failed = outcome.failed.iter().map(keyword_for).collect();
    report.abandoned = outcome.pending.iter().map(keyword_for).collect();

    // ── Fetch, normalise, classify, commit ───────────────────────────────────
    let checked_at = Utc::now();
    report.checked_at = checked_at;

    for id in &outcome.completed {
      let keyword = keyword_for(id);
      let Some(result) = lifecycle.fetch(id).await else {
        report.failed.push(keyword);
        continue;
      };

      if !result.keyword.is_empty()
        && normalize_phrase(&result.keyword).ok().as_deref() != Some(keyword.as_str())
      {
        warn!(%keyword, echoed = %result.keyword, "listing is for another keyword; discarding it");
        report.failed.push(keyword);
        continue;
      }

      let observation = self.normalizer.normalize(keyword.clone(), &result.entries);

      let previous = match self.store.get_previous(&keyword).await {
        Ok(previous) => previous,
        Err(e) => {
          error!(%keyword, error = %e, "failed to read previous record; leaving it untouched");
          report.failed.push(keyword);
          continue;
        }
      };

      let delta = classify(previous.as_ref(), &observation);

      if let Err(e) = self.store.commit(&keyword, &observation, checked_at).await {
        error!(%keyword, error = %e, "failed to commit observation");
        report.failed.push(keyword);
        continue;
      }
      report.completed += 1;

      match delta {
        RankDelta::Dropped(dropped) => {
          info!(
            %keyword,
            previous = dropped.previous_rank,
            current = dropped.current_rank,
            "rank dropped"
          );
          report.dropped.push(dropped);
        }
        RankDelta::OutOfWindow(vanished) => {
          info!(%keyword, previous = vanished.previous_rank, "dropped out of the observed window");
          report.out_of_window.push(vanished);
        }
        other => debug!(%keyword, delta = ?other, "no regression"),
      }
    }

    report
      .dropped
      .sort_by(|a, b| b.magnitude().cmp(&a.magnitude()).then_with(|| a.keyword.cmp(&b.keyword)));
    report.finished_at = Utc::now();

    info!(
      submitted = report.submitted,
      completed = report.completed,
      dropped = report.dropped.len(),
      out_of_window = report.out_of_window.len(),
      failed = report.failed.len(),
      abandoned = report.abandoned.len(),
      "check finished"
    );
    report
  }
}
