//! A scripted in-memory provider for engine tests.
//!
//! Each keyword is given a script up front. Time is measured in poll rounds:
//! every `ready()` call starts a new round.

use std::{collections::HashMap, sync::Mutex};

use serpwatch_core::{
  provider::RankProvider,
  serp::{FetchOutcome, JobId, JobSpec, JobStatus, SerpEntry, SerpResult, Submission},
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(String);

#[derive(Debug, Clone)]
enum Script {
  Listing {
    entries:       Vec<SerpEntry>,
    ready_from:    u32,
    in_ready_list: bool,
    /// Keyword reported back with the listing, if not the submitted one.
    echo:          Option<String>,
  },
  Fail,
  Hang,
  Reject(String),
}

#[derive(Default)]
struct State {
  jobs:        HashMap<JobId, String>,
  rounds:      u32,
  batch_sizes: Vec<usize>,
}

#[derive(Default)]
pub struct ScriptedProvider {
  scripts:        HashMap<String, Script>,
  failing_submit: bool,
  failing_ready:  bool,
  state:          Mutex<State>,
}

impl ScriptedProvider {
  pub fn new() -> Self { Self::default() }

  fn script(mut self, keyword: &str, script: Script) -> Self {
    self.scripts.insert(keyword.to_string(), script);
    self
  }

  /// Completes immediately and shows up in the ready list.
  pub fn listing(self, keyword: &str, entries: Vec<SerpEntry>) -> Self {
    self.script(keyword, Script::Listing {
      entries,
      ready_from: 0,
      in_ready_list: true,
      echo: None,
    })
  }

  /// Completes from poll round `round` on.
  pub fn listing_after(self, keyword: &str, round: u32, entries: Vec<SerpEntry>) -> Self {
    self.script(keyword, Script::Listing {
      entries,
      ready_from: round,
      in_ready_list: true,
      echo: None,
    })
  }

  /// Completes immediately but never appears in the ready list.
  pub fn listing_status_only(self, keyword: &str, entries: Vec<SerpEntry>) -> Self {
    self.script(keyword, Script::Listing {
      entries,
      ready_from: 0,
      in_ready_list: false,
      echo: None,
    })
  }

  /// Completes immediately, but the listing claims to be for `echo`.
  pub fn listing_echoing(self, keyword: &str, echo: &str, entries: Vec<SerpEntry>) -> Self {
    self.script(keyword, Script::Listing {
      entries,
      ready_from: 0,
      in_ready_list: true,
      echo: Some(echo.to_string()),
    })
  }

  pub fn fail(self, keyword: &str) -> Self { self.script(keyword, Script::Fail) }

  pub fn hang(self, keyword: &str) -> Self { self.script(keyword, Script::Hang) }

  pub fn reject(self, keyword: &str, reason: &str) -> Self {
    self.script(keyword, Script::Reject(reason.to_string()))
  }

  pub fn failing_submit(mut self) -> Self {
    self.failing_submit = true;
    self
  }

  pub fn failing_ready(mut self) -> Self {
    self.failing_ready = true;
    self
  }

  /// Sizes of every submitted batch, in call order.
  pub fn batch_sizes(&self) -> Vec<usize> { self.state.lock().unwrap().batch_sizes.clone() }

  fn lookup(&self, id: &JobId) -> Result<(String, Script, u32), FakeError> {
    let state = self.state.lock().unwrap();
    let keyword = state
      .jobs
      .get(id)
      .cloned()
      .ok_or_else(|| FakeError(format!("unknown job {id}")))?;
    let script = self.scripts[&keyword].clone();
    Ok((keyword, script, state.rounds))
  }
}

impl RankProvider for ScriptedProvider {
  type Error = FakeError;

  async fn submit(&self, jobs: &[JobSpec]) -> Result<Vec<Submission>, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.batch_sizes.push(jobs.len());
    if self.failing_submit {
      return Err(FakeError("connection reset".into()));
    }

    let mut out = Vec::with_capacity(jobs.len());
    for job in jobs {
      let keyword = job.keyword.clone();
      match self.scripts.get(&keyword) {
        None => out.push(Submission::Rejected { keyword, reason: "unscripted keyword".into() }),
        Some(Script::Reject(reason)) => {
          out.push(Submission::Rejected { keyword, reason: reason.clone() })
        }
        Some(_) => {
          let job_id = JobId::new(format!("job-{}", state.jobs.len() + 1));
          state.jobs.insert(job_id.clone(), keyword.clone());
          out.push(Submission::Accepted { job_id, keyword });
        }
      }
    }
    Ok(out)
  }

  async fn ready(&self) -> Result<Vec<JobId>, FakeError> {
    let mut state = self.state.lock().unwrap();
    state.rounds += 1;
    if self.failing_ready {
      return Err(FakeError("ready list unavailable".into()));
    }

    let rounds = state.rounds;
    let mut ids: Vec<JobId> = state
      .jobs
      .iter()
      .filter(|(_, keyword)| {
        matches!(
          self.scripts[*keyword],
          Script::Listing { ready_from, in_ready_list: true, .. } if ready_from <= rounds
        )
      })
      .map(|(id, _)| id.clone())
      .collect();
    ids.sort();
    Ok(ids)
  }

  async fn status(&self, id: &JobId) -> Result<JobStatus, FakeError> {
    let (_, script, rounds) = self.lookup(id)?;
    Ok(match script {
      Script::Listing { ready_from, .. } if ready_from <= rounds => JobStatus::Completed,
      Script::Fail => JobStatus::Failed,
      _ => JobStatus::InProgress,
    })
  }

  async fn fetch(&self, id: &JobId) -> Result<FetchOutcome, FakeError> {
    let (keyword, script, rounds) = self.lookup(id)?;
    Ok(match script {
      Script::Listing { entries, ready_from, echo, .. } if ready_from <= rounds => {
        FetchOutcome::Ready(SerpResult { keyword: echo.unwrap_or(keyword), entries })
      }
      Script::Fail => FetchOutcome::Failed("scripted failure".into()),
      _ => FetchOutcome::Pending,
    })
  }
}
