//! Wire and domain types shared by the job submitter, poller, and reconciler.

use crate::language::options::{PiiCategory, RedactionPolicyKind};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Identifier used when a call analyses a single document.
pub const DEFAULT_DOCUMENT_ID: &str = "1";

/// Message reported when a poll response does not carry a readable status.
pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format.";

/// Errors surfaced by a document analysis job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Caller supplied arguments that cannot form a valid request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The job could not be submitted.
    #[error(transparent)]
    Submission(#[from] SubmissionFault),
    /// A status poll failed before the job reached a terminal state.
    #[error(transparent)]
    Poll(#[from] PollFault),
    /// A poll response did not contain a string `status` field.
    #[error("Invalid response format.")]
    MalformedResponse,
    /// The job reached a failure state without reporting any error detail.
    #[error("Job finished with status '{reason}'")]
    JobFailed {
        /// Terminal status or HTTP reason phrase.
        reason: String,
    },
    /// The polling session exceeded its deadline.
    #[error("Job did not reach a terminal state within {} seconds", .after.as_secs())]
    Timeout {
        /// Deadline that elapsed.
        after: Duration,
    },
    /// The caller cancelled the call.
    #[error("Job was cancelled by the caller")]
    Cancelled,
    /// The terminal body could not be decoded into a job result.
    #[error("Failed to decode job result: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reasons a job submission failed.
#[derive(Debug, Error)]
pub enum SubmissionFault {
    /// HTTP layer failed before a response arrived.
    #[error("Job submission failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Service rejected the request with a body that is not a job result.
    #[error("Job submission rejected ({status}): {body}")]
    Rejected {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// Accepted response carried neither an operation location nor a terminal body.
    #[error("Job submission response did not include an operation-location header")]
    MissingOperationLocation,
    /// Operation location header is not an absolute URL.
    #[error("Job submission returned an invalid operation-location: {0}")]
    InvalidOperationLocation(String),
}

/// Reasons a status poll failed.
#[derive(Debug, Error)]
pub enum PollFault {
    /// HTTP layer failed before a response arrived.
    #[error("Polling the job status failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Status endpoint answered with an unexpected HTTP status or an empty body.
    #[error("{reason}")]
    Rejected {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Reason phrase of `status`.
        reason: String,
    },
}

/// Lifecycle state reported by the service for a job or a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    /// Accepted but not picked up yet.
    NotStarted,
    /// Currently executing.
    Running,
    /// Cancellation requested, not yet effective.
    Cancelling,
    /// Cancelled before completion.
    #[serde(alias = "canceled")]
    Cancelled,
    /// Completed successfully.
    Succeeded,
    /// Completed with a failure.
    Failed,
    /// State could not be determined.
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Whether polling can stop in this state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Running | Self::Cancelling)
    }
}

/// Absolute URL returned by the service for tracking a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle(String);

impl OperationHandle {
    /// Validate an `operation-location` header value.
    pub fn parse(value: &str) -> Result<Self, SubmissionFault> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SubmissionFault::MissingOperationLocation);
        }
        reqwest::Url::parse(value)
            .map_err(|_| SubmissionFault::InvalidOperationLocation(value.to_string()))?;
        Ok(Self(value.to_string()))
    }

    /// URL to poll for the job status.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Terminal body produced either directly by submission or by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalResponse {
    /// Terminal state the job reached.
    pub state: JobState,
    /// Terminal status string or HTTP reason phrase.
    pub reason: String,
    /// Raw JSON body to reconcile.
    pub body: String,
}

/// Location of a document in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLocation {
    /// Absolute URL of the document.
    pub location: String,
    /// Storage kind reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl DocumentLocation {
    /// Location with no storage kind.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind: None,
        }
    }
}

/// Source/target pair handed to the request builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    /// Identifier unique within the request.
    pub id: String,
    /// URL of the document to analyse.
    pub source: String,
    /// URL of the container receiving the output.
    pub target: String,
    /// Language code of the document.
    pub language: String,
}

/// One document entry of an analyze-documents request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentTask {
    /// Identifier unique within the request.
    pub id: String,
    /// Document to analyse.
    pub source: DocumentLocation,
    /// Output container.
    pub target: DocumentLocation,
    /// Language code of the document.
    pub language: String,
}

/// Redaction settings of a PII task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionPolicy {
    /// Replacement strategy.
    pub policy_kind: RedactionPolicyKind,
    /// Mask character, only meaningful for character masking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redaction_character: Option<char>,
}

impl RedactionPolicy {
    /// Build a policy; the mask character is dropped unless the policy masks characters.
    pub fn new(policy_kind: RedactionPolicyKind, redaction_character: char) -> Self {
        Self {
            policy_kind,
            redaction_character: matches!(policy_kind, RedactionPolicyKind::CharacterMask)
                .then_some(redaction_character),
        }
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self::new(RedactionPolicyKind::CharacterMask, '*')
    }
}

/// Parameters of a PII entity recognition task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiTaskParameters {
    /// Model version, `latest` by default.
    pub model_version: String,
    /// Restrict recognition to these categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pii_categories: Option<Vec<PiiCategory>>,
    /// Categories to leave untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_pii_categories: Option<Vec<PiiCategory>>,
    /// How recognised entities are redacted.
    pub redaction_policy: RedactionPolicy,
}

impl Default for PiiTaskParameters {
    fn default() -> Self {
        Self {
            model_version: "latest".into(),
            pii_categories: None,
            exclude_pii_categories: None,
            redaction_policy: RedactionPolicy::default(),
        }
    }
}

/// Analysis task attached to a document job; serialised as `{"kind", "parameters"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "parameters")]
pub enum AnalysisTask {
    /// Detect and redact personal information.
    PiiEntityRecognition(PiiTaskParameters),
}

impl AnalysisTask {
    /// Wire name of the task kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PiiEntityRecognition(_) => "PiiEntityRecognition",
        }
    }
}

/// Documents of a job request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisInput {
    /// Documents to analyse.
    pub documents: Vec<DocumentTask>,
}

/// Body of an analyze-documents job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Documents to analyse.
    pub analysis_input: AnalysisInput,
    /// Tasks applied to every document.
    pub tasks: Vec<AnalysisTask>,
}

/// Inner error detail nested in a service error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerError {
    /// Detailed error code.
    #[serde(default)]
    pub code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
}

/// Error object returned by the service at job, task, or document level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error code.
    #[serde(default)]
    pub code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Element the error refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Additional detail.
    #[serde(
        default,
        rename = "innererror",
        alias = "innerError",
        skip_serializing_if = "Option::is_none"
    )]
    pub inner_error: Option<InnerError>,
}

/// Document level error inside a task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    /// Document the error refers to.
    #[serde(default)]
    pub id: String,
    /// Error detail.
    pub error: ServiceError,
}

/// Warning attached to a processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWarning {
    /// Warning code.
    #[serde(default)]
    pub code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Element the warning refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,
}

/// Per-document output of a document job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Identifier echoed from the request.
    pub id: String,
    /// Document that was analysed.
    pub source: DocumentLocation,
    /// Output documents written by the service.
    #[serde(default)]
    pub targets: Vec<DocumentLocation>,
    /// Warnings raised while processing the document.
    #[serde(default)]
    pub warnings: Vec<DocumentWarning>,
}

/// Payload of a task: document errors and successful documents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "D: serde::de::DeserializeOwned"))]
pub struct TaskResults<D> {
    /// Document level errors.
    #[serde(default)]
    pub errors: Option<Vec<TaskError>>,
    /// Successfully processed documents.
    #[serde(default)]
    pub documents: Option<Vec<D>>,
    /// Model version used by the task.
    #[serde(default)]
    pub model_version: Option<String>,
}

/// Status and payload of one task of a job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "D: serde::de::DeserializeOwned"))]
pub struct TaskResult<D> {
    /// Result kind reported by the service.
    #[serde(default)]
    pub kind: Option<String>,
    /// Task name, when the request named it.
    #[serde(default)]
    pub task_name: Option<String>,
    /// Task lifecycle state.
    #[serde(default)]
    pub status: JobState,
    /// Task payload.
    #[serde(default)]
    pub results: Option<TaskResults<D>>,
}

/// Task list of a job result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "D: serde::de::DeserializeOwned"))]
pub struct TaskCollection<D> {
    /// Tasks in submission order.
    #[serde(default)]
    pub items: Vec<TaskResult<D>>,
}

impl<D> Default for TaskCollection<D> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// Parsed terminal body of a job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "D: serde::de::DeserializeOwned"))]
pub struct JobResult<D> {
    /// Service assigned job identifier.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Job lifecycle state.
    #[serde(default)]
    pub status: JobState,
    /// Job level error.
    #[serde(default)]
    pub error: Option<ServiceError>,
    /// Additional job level errors.
    #[serde(default)]
    pub errors: Option<Vec<ServiceError>>,
    /// Per-task results.
    #[serde(default)]
    pub tasks: TaskCollection<D>,
}

/// Error reported back to the caller after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportedError {
    /// Error raised for the job as a whole.
    Job(ServiceError),
    /// Error raised for a single document of a task.
    Document(TaskError),
}

/// Reconciled outcome of a job: either documents or errors, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<D> {
    /// Documents concatenated across tasks.
    Documents(Vec<D>),
    /// Errors in priority order.
    Errors(Vec<ReportedError>),
}

impl<D> Outcome<D> {
    /// Whether the outcome carries errors.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Errors(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unrecognised_state_is_unknown_and_terminal() {
        let state: JobState = serde_json::from_value(json!("partiallyCompleted")).expect("state");
        assert_eq!(state, JobState::Unknown);
        assert!(state.is_terminal());

        let state: JobState = serde_json::from_value(json!("canceled")).expect("state");
        assert_eq!(state, JobState::Cancelled);
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn job_result_decodes_documents_without_default() {
        let body = json!({
            "jobId": "job-7",
            "status": "succeeded",
            "tasks": { "items": [{
                "kind": "PiiEntityRecognitionLROResults",
                "status": "succeeded",
                "results": {
                    "documents": [{
                        "id": "1",
                        "source": { "location": "https://blob.example/a.docx" },
                        "targets": [{ "location": "https://blob.example/out/a.docx" }]
                    }]
                }
            }]}
        })
        .to_string();

        let result: JobResult<DocumentResult> = serde_json::from_str(&body).expect("decode");
        assert_eq!(result.job_id.as_deref(), Some("job-7"));
        assert_eq!(result.status, JobState::Succeeded);
        let task = &result.tasks.items[0];
        let documents = task
            .results
            .as_ref()
            .and_then(|results| results.documents.as_ref())
            .expect("documents");
        assert_eq!(documents[0].source.location, "https://blob.example/a.docx");
        assert!(documents[0].warnings.is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let result: JobResult<DocumentResult> =
            serde_json::from_value(json!({ "status": "someFutureState" })).expect("decode");
        assert_eq!(result.status, JobState::Unknown);
        assert!(result.tasks.items.is_empty());
        assert!(result.error.is_none());
    }
}
