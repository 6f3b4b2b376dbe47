//! Async HTTP client wrapping the task API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serpwatch_core::{
  keyword::normalize_phrase,
  provider::RankProvider,
  serp::{FetchOutcome, JobId, JobSpec, JobStatus, SerpEntry, SerpResult, Submission},
};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  wire::{Envelope, FetchedTask, PostTask, PostedTask, ReadyTask, TASK_CREATED},
};

fn default_base_url() -> String { "https://api.dataforseo.com".to_string() }

fn default_request_timeout_secs() -> u64 { 30 }

/// "Task Handed" and "Task In Queue": the job is alive, just not started.
fn default_pending_codes() -> Vec<u32> { vec![40601, 40602] }

/// Connection settings for the task API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
  #[serde(default = "default_base_url")]
  pub base_url:             String,
  #[serde(default)]
  pub login:                String,
  #[serde(default)]
  pub password:             String,
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
  /// Task status codes reported as in progress even though they fall in
  /// the failed range.
  #[serde(default = "default_pending_codes")]
  pub pending_codes:        Vec<u32>,
}

impl Default for ProviderConfig {
  fn default() -> Self {
    Self {
      base_url:             default_base_url(),
      login:                String::new(),
      password:             String::new(),
      request_timeout_secs: default_request_timeout_secs(),
      pending_codes:        default_pending_codes(),
    }
  }
}

impl ProviderConfig {
  pub fn has_credentials(&self) -> bool { !self.login.is_empty() && !self.password.is_empty() }
}

/// Async HTTP client for the SERP task API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct DataForSeoClient {
  client: Client,
  config: ProviderConfig,
}

impl DataForSeoClient {
  pub fn new(config: ProviderConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/v3/serp/google/organic{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn job_status(&self, code: u32) -> JobStatus {
    if self.config.pending_codes.contains(&code) {
      JobStatus::InProgress
    } else {
      JobStatus::from_code(code)
    }
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.basic_auth(&self.config.login, Some(&self.config.password))
  }

  async fn envelope<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<Vec<T>> {
    let resp = self.auth(req).send().await?.error_for_status()?;
    resp.json::<Envelope<T>>().await?.into_tasks()
  }

  /// `GET /task_get/regular/{id}` — the single task entry for `id`.
  async fn task_get(&self, id: &JobId) -> Result<FetchedTask> {
    let path = format!("/task_get/regular/{id}");
    let tasks: Vec<FetchedTask> = self.envelope(self.client.get(self.url(&path))).await?;
    tasks
      .into_iter()
      .next()
      .ok_or_else(|| Error::Malformed(format!("task_get returned no task for {id}")))
  }
}

// ─── RankProvider impl ───────────────────────────────────────────────────────

impl RankProvider for DataForSeoClient {
  type Error = Error;

  /// `POST /task_post` — one array element per job.
  async fn submit(&self, jobs: &[JobSpec]) -> Result<Vec<Submission>> {
    if jobs.is_empty() {
      return Ok(Vec::new());
    }

    let body: Vec<PostTask<'_>> = jobs.iter().map(PostTask::from).collect();
    let posted: Vec<PostedTask> = self
      .envelope(self.client.post(self.url("/task_post")).json(&body))
      .await?;
    debug!(jobs = jobs.len(), tasks = posted.len(), "task_post answered");

    Ok(pair_tasks(jobs, posted))
  }

  /// `GET /tasks_ready`
  async fn ready(&self) -> Result<Vec<JobId>> {
    let tasks: Vec<ReadyTask> = self.envelope(self.client.get(self.url("/tasks_ready"))).await?;
    Ok(
      tasks
        .into_iter()
        .flat_map(|t| t.result.unwrap_or_default())
        .map(|entry| JobId::new(entry.id))
        .collect(),
    )
  }

  async fn status(&self, id: &JobId) -> Result<JobStatus> {
    let task = self.task_get(id).await?;
    Ok(self.job_status(task.status_code))
  }

  async fn fetch(&self, id: &JobId) -> Result<FetchOutcome> {
    let task = self.task_get(id).await?;

    match self.job_status(task.status_code) {
      JobStatus::InProgress => Ok(FetchOutcome::Pending),
      JobStatus::Failed => Ok(FetchOutcome::Failed(format!(
        "{}: {}",
        task.status_code, task.status_message
      ))),
      JobStatus::Completed => {
        let Some(result) = task.result.and_then(|r| r.into_iter().next()) else {
          return Ok(FetchOutcome::Failed("task completed without a result".to_string()));
        };

        let entries = result
          .items
          .unwrap_or_default()
          .into_iter()
          .enumerate()
          .filter_map(|(index, value)| match SerpEntry::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
              warn!(job_id = %id, index, error = %e, "skipping malformed result entry");
              None
            }
          })
          .collect();

        Ok(FetchOutcome::Ready(SerpResult { keyword: result.keyword, entries }))
      }
    }
  }
}

/// Pair every job with the task the provider created for it.
///
/// Tasks are matched on the keyword they echo back. A task without an echo
/// is taken from the job's own position in the response.
fn pair_tasks(jobs: &[JobSpec], posted: Vec<PostedTask>) -> Vec<Submission> {
  let mut slots: Vec<Option<PostedTask>> = posted.into_iter().map(Some).collect();

  jobs
    .iter()
    .enumerate()
    .map(|(position, job)| {
      let wanted = normalize_phrase(&job.keyword).ok();
      let index = slots
        .iter()
        .position(|slot| {
          slot
            .as_ref()
            .and_then(PostedTask::echoed_keyword)
            .is_some_and(|echo| normalize_phrase(echo).ok() == wanted)
        })
        .or_else(|| {
          slots
            .get(position)
            .and_then(Option::as_ref)
            .is_some_and(|task| task.data.is_none())
            .then_some(position)
        });
      let task = index.and_then(|i| slots[i].take());

      let keyword = job.keyword.clone();
      match task {
        Some(PostedTask { id: Some(id), status_code: TASK_CREATED, .. }) => {
          Submission::Accepted { job_id: JobId::new(id), keyword }
        }
        Some(task) => Submission::Rejected {
          keyword,
          reason: format!("{}: {}", task.status_code, task.status_message),
        },
        None => {
          warn!(%keyword, "no task returned for job");
          Submission::Rejected { keyword, reason: "no task returned for job".to_string() }
        }
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use serpwatch_core::serp::Device;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{basic_auth, body_json, method, path},
  };

  use super::*;

  const BASE: &str = "/v3/serp/google/organic";

  async fn client_for(server: &MockServer) -> DataForSeoClient {
    DataForSeoClient::new(ProviderConfig {
      base_url: server.uri(),
      login: "login".into(),
      password: "secret".into(),
      ..ProviderConfig::default()
    })
    .unwrap()
  }

  fn spec(keyword: &str) -> JobSpec {
    JobSpec {
      keyword:       keyword.into(),
      language_code: "ja".into(),
      location_code: 2392,
      device:        Device::Desktop,
      depth:         10,
    }
  }

  fn envelope(tasks: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
      "status_code": 20000,
      "status_message": "Ok.",
      "tasks": tasks,
    }))
  }

  // ── submit ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_reports_partial_acceptance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("{BASE}/task_post")))
      .and(basic_auth("login", "secret"))
      .and(body_json(json!([
        { "keyword": "a", "language_code": "ja", "location_code": 2392, "device": "desktop", "depth": 10 },
        { "keyword": "b", "language_code": "ja", "location_code": 2392, "device": "desktop", "depth": 10 },
      ])))
      .respond_with(envelope(json!([
        { "id": "t-a", "status_code": 20100, "status_message": "Task Created." },
        { "id": "t-b", "status_code": 40501, "status_message": "Invalid Field: 'keyword'." },
      ])))
      .mount(&server)
      .await;

    let subs = client_for(&server).await.submit(&[spec("a"), spec("b")]).await.unwrap();
    assert_eq!(subs, vec![
      Submission::Accepted { job_id: JobId::new("t-a"), keyword: "a".into() },
      Submission::Rejected { keyword: "b".into(), reason: "40501: Invalid Field: 'keyword'.".into() },
    ]);
  }

  #[tokio::test]
  async fn submit_envelope_error_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("{BASE}/task_post")))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "status_code": 40100,
        "status_message": "You are not authorized.",
        "tasks": null,
      })))
      .mount(&server)
      .await;

    let err = client_for(&server).await.submit(&[spec("a")]).await.unwrap_err();
    assert!(matches!(err, Error::Api { code: 40100, .. }));
  }

  #[tokio::test]
  async fn submit_http_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let err = client_for(&server).await.submit(&[spec("a")]).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
  }

  #[tokio::test]
  async fn submit_pairs_tasks_by_echoed_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(format!("{BASE}/task_post")))
      .respond_with(envelope(json!([
        { "id": "t-c", "status_code": 40501, "status_message": "Invalid Field.", "data": { "keyword": "c" } },
        { "id": "t-b", "status_code": 20100, "data": { "keyword": "b" } },
        { "id": "t-a", "status_code": 20100, "data": { "keyword": "a" } },
      ])))
      .mount(&server)
      .await;

    let subs = client_for(&server)
      .await
      .submit(&[spec("a"), spec("b"), spec("c"), spec("d")])
      .await
      .unwrap();
    assert_eq!(subs, vec![
      Submission::Accepted { job_id: JobId::new("t-a"), keyword: "a".into() },
      Submission::Accepted { job_id: JobId::new("t-b"), keyword: "b".into() },
      Submission::Rejected { keyword: "c".into(), reason: "40501: Invalid Field.".into() },
      Submission::Rejected { keyword: "d".into(), reason: "no task returned for job".into() },
    ]);
  }

  // ── ready ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn ready_flattens_result_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path(format!("{BASE}/tasks_ready")))
      .respond_with(envelope(json!([
        { "id": "outer", "status_code": 20000, "result": [{ "id": "t-1" }, { "id": "t-2" }] },
        { "id": "outer-2", "status_code": 20000, "result": null },
      ])))
      .mount(&server)
      .await;

    let ids = client_for(&server).await.ready().await.unwrap();
    assert_eq!(ids, vec![JobId::new("t-1"), JobId::new("t-2")]);
  }

  // ── status / fetch ─────────────────────────────────────────────────────────

  async fn mount_task(server: &MockServer, id: &str, task: serde_json::Value) {
    Mock::given(method("GET"))
      .and(path(format!("{BASE}/task_get/regular/{id}")))
      .respond_with(envelope(json!([task])))
      .mount(server)
      .await;
  }

  #[tokio::test]
  async fn status_maps_task_codes() {
    let server = MockServer::start().await;
    mount_task(&server, "done", json!({ "status_code": 20000, "result": [] })).await;
    mount_task(&server, "bad", json!({ "status_code": 40403, "status_message": "Invalid Path." })).await;
    mount_task(&server, "queued", json!({ "status_code": 20100, "result": null })).await;
    mount_task(&server, "handed", json!({ "status_code": 40601, "status_message": "Task Handed." })).await;
    let client = client_for(&server).await;

    assert_eq!(client.status(&JobId::new("done")).await.unwrap(), JobStatus::Completed);
    assert_eq!(client.status(&JobId::new("bad")).await.unwrap(), JobStatus::Failed);
    assert_eq!(client.status(&JobId::new("queued")).await.unwrap(), JobStatus::InProgress);
    assert_eq!(client.status(&JobId::new("handed")).await.unwrap(), JobStatus::InProgress);
  }

  #[tokio::test]
  async fn fetch_skips_malformed_entries() {
    let server = MockServer::start().await;
    mount_task(&server, "t-1", json!({
      "status_code": 20000,
      "result": [{
        "keyword": "rust books",
        "items": [
          { "type": "organic", "rank_absolute": 1, "rank_group": 1, "url": "https://a.test/" },
          { "type": "organic", "rank_absolute": "broken", "url": "https://b.test/" },
          { "type": "paid", "rank_absolute": 3, "url": "https://ad.test/" },
        ],
      }],
    }))
    .await;

    let outcome = client_for(&server).await.fetch(&JobId::new("t-1")).await.unwrap();
    let FetchOutcome::Ready(result) = outcome else { panic!("expected ready, got {outcome:?}") };
    assert_eq!(result.keyword, "rust books");
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0], SerpEntry {
      rank_group: Some(1),
      ..SerpEntry::organic(1, "https://a.test/")
    });
    assert!(!result.entries[1].is_organic());
  }

  #[tokio::test]
  async fn fetch_reports_failed_and_pending_tasks() {
    let server = MockServer::start().await;
    mount_task(&server, "bad", json!({ "status_code": 40102, "status_message": "No Search Results." })).await;
    mount_task(&server, "queued", json!({ "status_code": 40602, "status_message": "Task In Queue." })).await;
    mount_task(&server, "slow", json!({ "status_code": 20100 })).await;
    mount_task(&server, "empty", json!({ "status_code": 20000, "result": null })).await;
    let client = client_for(&server).await;

    assert_eq!(
      client.fetch(&JobId::new("bad")).await.unwrap(),
      FetchOutcome::Failed("40102: No Search Results.".into())
    );
    assert_eq!(client.fetch(&JobId::new("queued")).await.unwrap(), FetchOutcome::Pending);
    assert_eq!(client.fetch(&JobId::new("slow")).await.unwrap(), FetchOutcome::Pending);
    assert!(matches!(client.fetch(&JobId::new("empty")).await.unwrap(), FetchOutcome::Failed(_)));
  }

  #[tokio::test]
  async fn task_get_without_tasks_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path(format!("{BASE}/task_get/regular/ghost")))
      .respond_with(envelope(json!([])))
      .mount(&server)
      .await;

    let err = client_for(&server).await.status(&JobId::new("ghost")).await.unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
  }
}
