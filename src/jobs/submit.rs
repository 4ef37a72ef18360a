//! Job submission against the asynchronous analysis endpoints.

use super::client::{JobClient, SUBSCRIPTION_KEY_HEADER};
use super::poll::{PollVerdict, classify_poll_response, reason_phrase};
use super::types::{
    JobError, JobRequest, JobState, OperationHandle, SubmissionFault, TerminalResponse,
};
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Path of the analyze-documents job endpoint.
pub const DOCUMENT_JOBS_PATH: &str = "language/analyze-documents/jobs";
/// Path of the analyze-text job endpoint.
pub const TEXT_JOBS_PATH: &str = "language/analyze-text/jobs";

const OPERATION_LOCATION_HEADER: &str = "operation-location";

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The job was accepted; poll the handle for its status.
    Pending(OperationHandle),
    /// The service answered with a terminal body right away.
    Completed(TerminalResponse),
}

impl JobClient {
    /// Submit a document analysis job.
    pub async fn submit(
        &self,
        request: &JobRequest,
        cancellation: &CancellationToken,
    ) -> Result<Submission, JobError> {
        self.submit_to(DOCUMENT_JOBS_PATH, request, cancellation)
            .await
    }

    /// Submit any job body to the job endpoint at `path`. Nothing is retried.
    pub(crate) async fn submit_to<B>(
        &self,
        path: &str,
        body: &B,
        cancellation: &CancellationToken,
    ) -> Result<Submission, JobError>
    where
        B: Serialize + ?Sized,
    {
        if cancellation.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let request = self
            .http
            .post(self.endpoint_url(path))
            .query(&[("api-version", self.settings.api_version.as_str())])
            .header(ACCEPT, "application/json")
            .header(SUBSCRIPTION_KEY_HEADER, &self.settings.api_key)
            .json(body);

        let response = tokio::select! {
            _ = cancellation.cancelled() => return Err(JobError::Cancelled),
            response = request.send() => response.map_err(SubmissionFault::Transport)?,
        };
        self.metrics.record_job_submitted();

        let status = response.status();
        let operation_location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .map(|value| value.to_str().unwrap_or_default().to_owned());
        let body = response.text().await.map_err(SubmissionFault::Transport)?;

        if status.is_success() {
            if let Some(location) = operation_location {
                let handle = OperationHandle::parse(&location)?;
                tracing::info!(
                    operation = handle.as_str(),
                    status = %status,
                    "Submitted analysis job"
                );
                return Ok(Submission::Pending(handle));
            }

            return match classify_poll_response(status, &body) {
                PollVerdict::Succeeded => Ok(Submission::Completed(TerminalResponse {
                    state: JobState::Succeeded,
                    reason: "succeeded".into(),
                    body,
                })),
                PollVerdict::Failed { state, reason } => {
                    Ok(Submission::Completed(TerminalResponse {
                        state,
                        reason,
                        body,
                    }))
                }
                _ => Err(SubmissionFault::MissingOperationLocation.into()),
            };
        }

        let is_json_object = serde_json::from_str::<Value>(&body)
            .map(|value| value.is_object())
            .unwrap_or(false);
        if is_json_object {
            tracing::warn!(status = %status, "Job submission rejected with an error body");
            return Ok(Submission::Completed(TerminalResponse {
                state: JobState::Failed,
                reason: reason_phrase(status),
                body,
            }));
        }

        let fault = SubmissionFault::Rejected { status, body };
        tracing::error!(error = %fault, "Job submission failed");
        Err(fault.into())
    }
}
