//! Status polling of submitted jobs.

use super::client::JobClient;
use super::types::{
    INVALID_RESPONSE_FORMAT, JobError, JobState, OperationHandle, PollFault, TerminalResponse,
};
use reqwest::StatusCode;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Classification of a single poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    /// Keep polling.
    Pending(JobState),
    /// The job completed successfully.
    Succeeded,
    /// The job reported `failed` or `canceled`; the body still carries error details.
    Failed {
        /// Terminal state reported by the service.
        state: JobState,
        /// Status string as reported.
        reason: String,
    },
    /// Body had no string `status` field.
    Malformed,
    /// Unexpected HTTP status or empty success body.
    Rejected {
        /// Reason phrase of the HTTP status.
        reason: String,
    },
}

impl PollVerdict {
    /// Whether polling stops on this verdict.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }

    /// Failure message for terminal failures.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } | Self::Rejected { reason } => Some(reason),
            Self::Malformed => Some(INVALID_RESPONSE_FORMAT),
            Self::Pending(_) | Self::Succeeded => None,
        }
    }
}

/// Classify a poll response from its HTTP status and body.
///
/// `202` keeps polling regardless of the body. A `200..=204` response with a body is parsed for
/// its `status` field: `failed` and `canceled` end the job as a failure, `succeeded` ends it
/// successfully, and any other value keeps polling. Everything else ends the job as a failure
/// carrying the HTTP reason phrase.
pub fn classify_poll_response(status: StatusCode, body: &str) -> PollVerdict {
    if status == StatusCode::ACCEPTED {
        return PollVerdict::Pending(JobState::Unknown);
    }

    if (200..=204).contains(&status.as_u16()) && !body.is_empty() {
        let Some(job_status) = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| value.get("status").and_then(Value::as_str).map(str::to_owned))
        else {
            return PollVerdict::Malformed;
        };

        return match job_status.to_ascii_lowercase().as_str() {
            "failed" => PollVerdict::Failed {
                state: JobState::Failed,
                reason: job_status,
            },
            "canceled" => PollVerdict::Failed {
                state: JobState::Cancelled,
                reason: job_status,
            },
            "succeeded" => PollVerdict::Succeeded,
            "notstarted" => PollVerdict::Pending(JobState::NotStarted),
            "running" => PollVerdict::Pending(JobState::Running),
            "cancelling" => PollVerdict::Pending(JobState::Cancelling),
            _ => PollVerdict::Pending(JobState::Unknown),
        };
    }

    PollVerdict::Rejected {
        reason: reason_phrase(status),
    }
}

pub(crate) fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| status.as_str().to_owned())
}

impl JobClient {
    /// Poll the operation until it reaches a terminal state, the deadline passes, or the caller
    /// cancels.
    ///
    /// The whole session runs under one deadline; when it elapses the in-flight request is
    /// dropped and [`JobError::Timeout`] is returned. Cancellation is observed before every poll
    /// and during every delay and yields [`JobError::Cancelled`].
    pub async fn poll_until_terminal(
        &self,
        handle: &OperationHandle,
        cancellation: &CancellationToken,
    ) -> Result<TerminalResponse, JobError> {
        let deadline = self.settings.timeout;
        match tokio::time::timeout(deadline, self.poll_loop(handle, cancellation)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = handle.as_str(),
                    timeout_secs = deadline.as_secs(),
                    "Job polling deadline elapsed"
                );
                Err(JobError::Timeout { after: deadline })
            }
        }
    }

    async fn poll_loop(
        &self,
        handle: &OperationHandle,
        cancellation: &CancellationToken,
    ) -> Result<TerminalResponse, JobError> {
        let mut attempt: u32 = 0;
        loop {
            if cancellation.is_cancelled() {
                return Err(JobError::Cancelled);
            }
            attempt += 1;

            let response = self
                .http
                .get(handle.as_str())
                .header(super::client::SUBSCRIPTION_KEY_HEADER, &self.settings.api_key)
                .send()
                .await
                .map_err(PollFault::Transport)?;
            self.metrics.record_poll();

            let status = response.status();
            let body = response.text().await.map_err(PollFault::Transport)?;
            let verdict = classify_poll_response(status, &body);
            tracing::debug!(
                operation = handle.as_str(),
                attempt,
                status = %status,
                verdict = ?verdict,
                "Polled job status"
            );

            match verdict {
                PollVerdict::Pending(_) => {}
                PollVerdict::Succeeded => {
                    return Ok(TerminalResponse {
                        state: JobState::Succeeded,
                        reason: "succeeded".into(),
                        body,
                    });
                }
                PollVerdict::Failed { state, reason } => {
                    return Ok(TerminalResponse {
                        state,
                        reason,
                        body,
                    });
                }
                PollVerdict::Malformed => return Err(JobError::MalformedResponse),
                PollVerdict::Rejected { reason } => {
                    return Err(PollFault::Rejected { status, reason }.into());
                }
            }

            tokio::select! {
                _ = cancellation.cancelled() => return Err(JobError::Cancelled),
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }
}
