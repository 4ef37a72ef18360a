//! Submit-then-poll orchestration of long-running analysis jobs.

use super::reconcile::reconcile;
use super::submit::{Submission, TEXT_JOBS_PATH};
use super::types::{DocumentResult, JobError, JobRequest, JobResult, JobState, Outcome};
use crate::config::Config;
use crate::metrics::JobMetrics;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub(crate) const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Immutable settings copied into a [`JobClient`] at construction.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Base URL of the language resource.
    pub endpoint: String,
    /// Subscription key.
    pub api_key: String,
    /// `api-version` sent on submission.
    pub api_version: String,
    /// Deadline for one polling session.
    pub timeout: Duration,
    /// Delay between two polls.
    pub poll_interval: Duration,
}

impl JobSettings {
    /// Derive job settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.language_endpoint.clone(),
            api_key: config.language_api_key.clone(),
            api_version: config.language_api_version.clone(),
            timeout: config.job_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Client driving analysis jobs from submission to a reconciled outcome.
pub struct JobClient {
    pub(crate) http: Client,
    pub(crate) settings: JobSettings,
    pub(crate) metrics: Arc<JobMetrics>,
}

impl JobClient {
    /// Build a client, validating the endpoint up front.
    pub fn new(settings: JobSettings, metrics: Arc<JobMetrics>) -> Result<Self, JobError> {
        reqwest::Url::parse(&settings.endpoint).map_err(|err| {
            JobError::InvalidArgument(format!(
                "invalid language endpoint '{}': {err}",
                settings.endpoint
            ))
        })?;
        let http = Client::builder()
            .user_agent(concat!("language-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| JobError::InvalidArgument(format!("HTTP client setup failed: {err}")))?;

        tracing::debug!(
            endpoint = %settings.endpoint,
            api_version = %settings.api_version,
            timeout_secs = settings.timeout.as_secs(),
            poll_interval_ms = settings.poll_interval.as_millis() as u64,
            "Initialized job client"
        );

        Ok(Self {
            http,
            settings,
            metrics,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config, metrics: Arc<JobMetrics>) -> Result<Self, JobError> {
        Self::new(JobSettings::from_config(config), metrics)
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Run a document job end to end and reconcile its result.
    pub async fn analyze_documents(
        &self,
        request: &JobRequest,
        cancellation: &CancellationToken,
    ) -> Result<Outcome<DocumentResult>, JobError> {
        let submission = self.submit(request, cancellation).await;
        self.finish(submission, cancellation).await
    }

    /// Run an analyze-text job (summarization) and reconcile its documents as raw JSON.
    pub async fn analyze_text_job<B>(
        &self,
        body: &B,
        cancellation: &CancellationToken,
    ) -> Result<Outcome<Value>, JobError>
    where
        B: Serialize + ?Sized,
    {
        let submission = self.submit_to(TEXT_JOBS_PATH, body, cancellation).await;
        self.finish(submission, cancellation).await
    }

    async fn finish<D>(
        &self,
        submission: Result<Submission, JobError>,
        cancellation: &CancellationToken,
    ) -> Result<Outcome<D>, JobError>
    where
        D: DeserializeOwned + Clone,
    {
        let result = self.drive(submission, cancellation).await;
        match &result {
            Ok(outcome) if !outcome.is_error() => self.metrics.record_job_succeeded(),
            Ok(_) => self.metrics.record_job_failed(),
            Err(JobError::Timeout { .. }) => self.metrics.record_job_timed_out(),
            Err(JobError::Cancelled) => self.metrics.record_job_cancelled(),
            Err(_) => self.metrics.record_job_failed(),
        }
        result
    }

    async fn drive<D>(
        &self,
        submission: Result<Submission, JobError>,
        cancellation: &CancellationToken,
    ) -> Result<Outcome<D>, JobError>
    where
        D: DeserializeOwned + Clone,
    {
        let terminal = match submission? {
            Submission::Pending(handle) => self.poll_until_terminal(&handle, cancellation).await?,
            Submission::Completed(terminal) => terminal,
        };

        let result: JobResult<D> = serde_json::from_str(&terminal.body)?;
        let outcome = reconcile(&result);
        tracing::info!(
            state = ?terminal.state,
            is_error = outcome.is_error(),
            "Job reached a terminal state"
        );

        if terminal.state != JobState::Succeeded && !outcome.is_error() {
            return Err(JobError::JobFailed {
                reason: terminal.reason,
            });
        }
        Ok(outcome)
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        let base = self.settings.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::request::{build_job_request, single_document};
    use crate::jobs::types::{AnalysisTask, PiiTaskParameters, PollFault, SubmissionFault};
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::Instant;

    const SOURCE: &str = "https://blob.example/in/a.docx";
    const TARGET: &str = "https://blob.example/out";

    fn client(server: &MockServer, poll_ms: u64, timeout_ms: u64) -> JobClient {
        JobClient::new(
            JobSettings {
                endpoint: server.base_url(),
                api_key: "test-key".into(),
                api_version: "2024-11-15-preview".into(),
                timeout: Duration::from_millis(timeout_ms),
                poll_interval: Duration::from_millis(poll_ms),
            },
            Arc::new(JobMetrics::new()),
        )
        .expect("client")
    }

    fn request() -> JobRequest {
        build_job_request(
            vec![single_document(SOURCE, TARGET, "en")],
            vec![AnalysisTask::PiiEntityRecognition(
                PiiTaskParameters::default(),
            )],
        )
        .expect("request")
    }

    fn succeeded_body() -> serde_json::Value {
        json!({
            "jobId": "job-1",
            "status": "succeeded",
            "tasks": { "items": [{
                "kind": "PiiEntityRecognitionLROResults",
                "status": "succeeded",
                "results": {
                    "errors": [],
                    "documents": [{
                        "id": "1",
                        "source": { "location": SOURCE, "kind": "AzureBlob" },
                        "targets": [{ "location": format!("{TARGET}/a.docx"), "kind": "AzureBlob" }],
                        "warnings": []
                    }]
                }
            }]}
        })
    }

    async fn accept_job(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/language/analyze-documents/jobs")
                    .query_param("api-version", "2024-11-15-preview")
                    .header("ocp-apim-subscription-key", "test-key")
                    .header("accept", "application/json")
                    .header("content-type", "application/json");
                then.status(202)
                    .header("operation-location", server.url("/ops/1"));
            })
            .await
    }

    #[tokio::test]
    async fn running_then_succeeded_yields_single_document() {
        let server = MockServer::start_async().await;
        let submit = accept_job(&server).await;
        let running = server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(json!({ "status": "running" }));
            })
            .await;

        let client = client(&server, 20, 5_000);
        let token = CancellationToken::new();
        let job = tokio::spawn({
            let request = request();
            async move { client.analyze_documents(&request, &token).await }
        });

        while running.hits_async().await == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let succeeded = server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(succeeded_body());
            })
            .await;
        running.delete_async().await;

        let outcome = job.await.expect("join").expect("job succeeds");
        submit.assert_async().await;
        assert!(succeeded.hits_async().await >= 1);
        let Outcome::Documents(documents) = outcome else {
            panic!("expected documents");
        };
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source.location, SOURCE);
    }

    #[tokio::test]
    async fn deadline_bounds_the_number_of_polls() {
        let server = MockServer::start_async().await;
        accept_job(&server).await;
        let running = server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(202);
            })
            .await;

        let client = client(&server, 50, 300);
        let started = Instant::now();
        let err = client
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("job must time out");

        assert!(matches!(err, JobError::Timeout { .. }), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));
        let polls = running.hits_async().await;
        assert!(polls >= 1);
        assert!(polls <= 300 / 50 + 1, "polled {polls} times");
        assert_eq!(client.metrics.snapshot().jobs_timed_out, 1);
    }

    #[tokio::test]
    async fn cancellation_is_distinct_from_timeout() {
        let server = MockServer::start_async().await;
        accept_job(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(json!({ "status": "notStarted" }));
            })
            .await;

        let client = client(&server, 50, 60_000);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            canceller.cancel();
        });

        let err = client
            .analyze_documents(&request(), &token)
            .await
            .expect_err("job must be cancelled");
        assert!(matches!(err, JobError::Cancelled), "got {err:?}");
        assert_eq!(client.metrics.snapshot().jobs_cancelled, 1);
    }

    #[tokio::test]
    async fn cancelled_token_never_submits() {
        let server = MockServer::start_async().await;
        let submit = accept_job(&server).await;
        let token = CancellationToken::new();
        token.cancel();

        let err = client(&server, 20, 1_000)
            .analyze_documents(&request(), &token)
            .await
            .expect_err("cancelled before submission");
        assert!(matches!(err, JobError::Cancelled));
        assert_eq!(submit.hits_async().await, 0);
    }

    #[tokio::test]
    async fn missing_status_field_is_malformed() {
        let server = MockServer::start_async().await;
        accept_job(&server).await;
        let poll = server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(json!({ "jobId": "job-1" }));
            })
            .await;

        let err = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("malformed body");
        assert_eq!(err.to_string(), "Invalid response format.");
        assert_eq!(poll.hits_async().await, 1);
    }

    #[tokio::test]
    async fn unexpected_poll_status_reports_reason_phrase() {
        let server = MockServer::start_async().await;
        accept_job(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(503).body("busy");
            })
            .await;

        let err = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("poll rejected");
        assert!(matches!(err, JobError::Poll(PollFault::Rejected { .. })));
        assert_eq!(err.to_string(), "Service Unavailable");
    }

    #[tokio::test]
    async fn failed_job_surfaces_task_errors() {
        let server = MockServer::start_async().await;
        accept_job(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(json!({
                    "status": "failed",
                    "tasks": { "items": [{
                        "status": "failed",
                        "results": { "errors": [{
                            "id": "1",
                            "error": { "code": "InvalidDocument", "message": "Document is unreadable" }
                        }] }
                    }]}
                }));
            })
            .await;

        let outcome = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect("errors are reconciled, not raised");
        let rendered = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(rendered[0]["id"], "1");
        assert_eq!(rendered[0]["error"]["code"], "InvalidDocument");
    }

    #[tokio::test]
    async fn failed_job_without_details_is_a_job_failure() {
        let server = MockServer::start_async().await;
        accept_job(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(json!({ "status": "canceled" }));
            })
            .await;

        let err = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("no details to reconcile");
        assert!(matches!(err, JobError::JobFailed { ref reason } if reason == "canceled"));
    }

    #[tokio::test]
    async fn rejected_submission_with_json_body_skips_polling() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/language/analyze-documents/jobs");
                then.status(400).json_body(json!({
                    "error": { "code": "InvalidRequest", "message": "Invalid document location" }
                }));
            })
            .await;
        let poll = server
            .mock_async(|when, then| {
                when.method(GET).path("/ops/1");
                then.status(200).json_body(succeeded_body());
            })
            .await;

        let outcome = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect("error body is reconciled");
        assert!(outcome.is_error());
        let rendered = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(rendered[0]["code"], "InvalidRequest");
        assert_eq!(poll.hits_async().await, 0);
    }

    #[tokio::test]
    async fn accepted_submission_without_handle_is_a_submission_fault() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/language/analyze-documents/jobs");
                then.status(202).header("operation-location", "");
            })
            .await;

        let err = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("empty handle");
        assert!(matches!(
            err,
            JobError::Submission(SubmissionFault::MissingOperationLocation)
        ));
    }

    #[tokio::test]
    async fn rejected_submission_without_body_is_a_submission_fault() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/language/analyze-documents/jobs");
                then.status(500);
            })
            .await;

        let err = client(&server, 20, 1_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("server error");
        assert!(matches!(
            err,
            JobError::Submission(SubmissionFault::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn terminal_submission_body_is_reconciled_without_polling() {
        let server = MockServer::start_async().await;
        let submit = server
            .mock_async(|when, then| {
                when.method(POST).path("/language/analyze-documents/jobs");
                then.status(200).json_body(succeeded_body());
            })
            .await;

        let client = client(&server, 20, 1_000);
        let outcome = client
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect("completed on submission");

        submit.assert_async().await;
        let Outcome::Documents(documents) = outcome else {
            panic!("expected documents");
        };
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source.location, SOURCE);
        let snapshot = client.metrics.snapshot();
        assert_eq!(snapshot.polls, 0);
        assert_eq!(snapshot.jobs_succeeded, 1);
    }

    #[tokio::test]
    async fn transport_failure_while_polling_aborts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/language/analyze-documents/jobs");
                then.status(202)
                    .header("operation-location", "http://127.0.0.1:9/ops/1");
            })
            .await;

        let err = client(&server, 20, 5_000)
            .analyze_documents(&request(), &CancellationToken::new())
            .await
            .expect_err("connection refused");
        assert!(matches!(err, JobError::Poll(PollFault::Transport(_))));
    }
}
