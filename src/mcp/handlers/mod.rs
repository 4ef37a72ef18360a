//! Tool handlers for the MCP server.
//!
//! Every handler parses its arguments into a typed struct, validates the closed option sets, calls
//! exactly one backend and renders the result as a [`ResponseEnvelope`](super::ResponseEnvelope).
//! Faults are returned as [`ToolError`] and rendered by the service at the tool boundary.

use std::future::Future;

use rmcp::model::JsonObject;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::jobs::JobError;
use crate::language::LanguageError;
use crate::language::options::OptionError;
use crate::translator::TranslatorError;

pub mod conversation;
pub mod healthcare;
pub mod pii;
pub mod question_answering;
pub mod summarize;
pub mod text;
pub mod translate;

/// Faults a tool call can end with.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments failed to deserialize or violate a constraint.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    /// An option value is outside its closed set.
    #[error(transparent)]
    Option(#[from] OptionError),
    /// A long-running job failed.
    #[error(transparent)]
    Job(#[from] JobError),
    /// A synchronous language call failed.
    #[error(transparent)]
    Language(#[from] LanguageError),
    /// Translation failed.
    #[error(transparent)]
    Translator(#[from] TranslatorError),
    /// The caller cancelled the call.
    #[error("Request was cancelled by the caller")]
    Cancelled,
    /// Output could not be rendered.
    #[error("Failed to render tool output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Parse structured arguments supplied to a tool invocation.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, ToolError> {
    let value = Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

/// Reject blank text arguments.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidArguments(format!(
            "'{field}' must not be empty"
        )));
    }
    Ok(())
}

/// Await `future` unless the caller cancels first.
pub(crate) async fn until_cancelled<F, T, E>(
    cancellation: &CancellationToken,
    future: F,
) -> Result<T, ToolError>
where
    F: Future<Output = Result<T, E>>,
    ToolError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(ToolError::Cancelled),
        result = future => result.map_err(ToolError::from),
    }
}

pub(crate) fn default_language() -> String {
    "en".to_string()
}

pub(crate) fn default_model_version() -> String {
    "latest".to_string()
}
