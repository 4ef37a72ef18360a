//! Formatting helpers shared by the MCP resources.

use rmcp::model::ResourceContents;
use serde::Serialize;
use serde_json::{Value, json};

use crate::jobs::JobSettings;
use crate::language::{LanguageSettings, ProjectDeployment};
use crate::mcp::registry::ToolName;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Effective connection settings, without secrets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SettingsSnapshot {
    pub(crate) endpoint: String,
    pub(crate) api_version: String,
    pub(crate) jobs: JobSettingsSnapshot,
    /// `project/deployment` of the knowledge base, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) question_answering: Option<String>,
    /// `project/deployment` of the conversation project, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) conversation: Option<String>,
    pub(crate) enabled_tools: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobSettingsSnapshot {
    pub(crate) timeout_seconds: u64,
    pub(crate) poll_interval_ms: u64,
}

impl SettingsSnapshot {
    pub(crate) fn new(
        jobs: &JobSettings,
        language: &LanguageSettings,
        tools: impl IntoIterator<Item = ToolName>,
    ) -> Self {
        Self {
            endpoint: jobs.endpoint.clone(),
            api_version: jobs.api_version.clone(),
            jobs: JobSettingsSnapshot {
                timeout_seconds: jobs.timeout.as_secs(),
                poll_interval_ms: u64::try_from(jobs.poll_interval.as_millis()).unwrap_or(u64::MAX),
            },
            question_answering: language.question_answering.as_ref().map(project_label),
            conversation: language.conversation.as_ref().map(project_label),
            enabled_tools: tools.into_iter().map(ToolName::as_str).collect(),
        }
    }
}

fn project_label(project: &ProjectDeployment) -> String {
    format!("{}/{}", project.project, project.deployment)
}

/// Guidance document served by the `usage` resource.
pub(crate) fn usage_payload() -> Value {
    json!({
        "title": "Language MCP Usage",
        "policy": [
            "Every tool answers { isError, content: { type: \"text\", text } }; text is JSON unless isError describes a fault.",
            "Option values (PII categories, entity categories, policies) are case-insensitive and validated before any remote call.",
            "Document tools take absolute URLs for the source document and the target container.",
            "Document redaction, summarization and healthcare extraction run as jobs and may take minutes; cancel the call to stop polling.",
        ],
        "flows": [
            {
                "name": "Redact a stored document",
                "steps": [
                    "redact-pii-document({ sourceDocument, targetDocument, piiCategories?, redactionPolicy? })",
                    "read the targets array of the returned document"
                ]
            },
            {
                "name": "Understand a message",
                "steps": [
                    "detect-language({ message })",
                    "extract-entities({ message, language }) or analyze-sentiment({ message, language })",
                    "translate-text({ message, targetLanguages }) when needed"
                ]
            },
            {
                "name": "Route a user request",
                "steps": [
                    "detect-intent({ message })",
                    "act on prediction.topIntent and the recognised entities"
                ]
            }
        ]
    })
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}
