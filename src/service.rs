//! Tool service shared by the MCP and HTTP surfaces.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::JsonObject;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::jobs::{JobClient, JobError};
use crate::language::{LanguageClient, LanguageError};
use crate::mcp::{ResponseEnvelope, ToolName};
use crate::metrics::{JobMetrics, MetricsSnapshot};
use crate::translator::{Translator, TranslatorClient, TranslatorError};

/// Failures while wiring the backend clients.
#[derive(Debug, Error)]
pub enum ServiceInitError {
    /// Job client rejected its settings.
    #[error("Failed to initialize job client: {0}")]
    Jobs(#[from] JobError),
    /// Language client rejected its settings.
    #[error("Failed to initialize language client: {0}")]
    Language(#[from] LanguageError),
    /// Translator client rejected its settings.
    #[error("Failed to initialize translator client: {0}")]
    Translator(#[from] TranslatorError),
}

/// Abstraction over tool execution used by external surfaces (HTTP, MCP).
#[async_trait]
pub trait ToolApi: Send + Sync {
    /// Run `tool` and render its outcome; faults come back as an error envelope.
    async fn call_tool(
        &self,
        tool: ToolName,
        arguments: Option<JsonObject>,
        cancellation: CancellationToken,
    ) -> ResponseEnvelope;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Backend clients behind every tool.
pub struct LanguageService {
    jobs: JobClient,
    language: LanguageClient,
    translator: Arc<dyn Translator>,
    metrics: Arc<JobMetrics>,
}

impl LanguageService {
    /// Assemble a service from already built clients.
    pub fn new(
        jobs: JobClient,
        language: LanguageClient,
        translator: Arc<dyn Translator>,
        metrics: Arc<JobMetrics>,
    ) -> Self {
        Self {
            jobs,
            language,
            translator,
            metrics,
        }
    }

    /// Build every client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ServiceInitError> {
        let metrics = Arc::new(JobMetrics::new());
        tracing::info!(endpoint = %config.language_endpoint, "Initializing language clients");
        let jobs = JobClient::from_config(config, metrics.clone())?;
        let language = LanguageClient::from_config(config)?;
        let translator = Arc::new(TranslatorClient::from_config(config)?);
        Ok(Self::new(jobs, language, translator, metrics))
    }

    /// Long-running job client.
    pub fn jobs(&self) -> &JobClient {
        &self.jobs
    }

    /// Synchronous analysis client.
    pub fn language(&self) -> &LanguageClient {
        &self.language
    }

    /// Translation backend.
    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    /// Run one tool call and render every outcome, faults included, as an envelope.
    pub async fn dispatch(
        &self,
        tool: ToolName,
        arguments: Option<JsonObject>,
        cancellation: CancellationToken,
    ) -> ResponseEnvelope {
        tracing::debug!(tool = %tool, "Dispatching tool call");
        match (tool.handler())(self, arguments, cancellation).await {
            Ok(envelope) => {
                tracing::info!(tool = %tool, is_error = envelope.is_error, "Tool call completed");
                envelope
            }
            Err(error) => {
                tracing::warn!(tool = %tool, %error, "Tool call failed");
                ResponseEnvelope::failure(error.to_string())
            }
        }
    }
}

#[async_trait]
impl ToolApi for LanguageService {
    async fn call_tool(
        &self,
        tool: ToolName,
        arguments: Option<JsonObject>,
        cancellation: CancellationToken,
    ) -> ResponseEnvelope {
        self.dispatch(tool, arguments, cancellation).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
