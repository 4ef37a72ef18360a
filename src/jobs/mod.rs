//! Long-running document analysis jobs: request building, submission, polling, reconciliation.

pub mod client;
pub mod poll;
pub mod reconcile;
pub mod request;
pub mod submit;
pub mod types;

pub use client::{JobClient, JobSettings};
pub use poll::{PollVerdict, classify_poll_response};
pub use reconcile::{reconcile, reconcile_tasks};
pub use request::{build_job_request, single_document};
pub use submit::Submission;
pub use types::{
    AnalysisTask, DocumentPair, DocumentResult, JobError, JobRequest, JobResult, JobState,
    OperationHandle, Outcome, PiiTaskParameters, PollFault, RedactionPolicy, ReportedError,
    ServiceError, SubmissionFault, TaskError, TaskResults,
};
