//! Handler for the `summarize-text` tool, driven as an analyze-text job.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ToolError, default_language, default_model_version, parse_arguments, require_text};
use crate::language::options::{SummarizationKind, SummaryLength, parse_option};
use crate::language::types::{
    AbstractiveSummaryParameters, ExtractiveSummaryParameters, TextInput, TextJobTask,
};
use crate::language::{TextDocument, TextJobRequest};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;

/// Arguments of `summarize-text`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeTextArgs {
    /// Text to summarize.
    pub message: String,
    /// `abstractive` (default) or `extractive`.
    #[serde(default)]
    pub summarization_type: Option<String>,
    /// Abstractive summary length: `short`, `medium` (default) or `long`.
    #[serde(default, alias = "summaryLengthBucket")]
    pub summary_length: Option<String>,
    /// Maximum number of sentences of an extractive summary.
    #[serde(default)]
    pub sentence_count: Option<u32>,
    /// Language code of the text. Defaults to `en`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl SummarizeTextArgs {
    fn to_task(&self) -> Result<TextJobTask, ToolError> {
        let kind = match self.summarization_type.as_deref() {
            Some(value) => parse_option::<SummarizationKind>("summarizationType", value)?,
            None => SummarizationKind::default(),
        };
        let task = match kind {
            SummarizationKind::Abstractive => {
                let summary_length = match self.summary_length.as_deref() {
                    Some(value) => parse_option::<SummaryLength>("summaryLength", value)?,
                    None => SummaryLength::default(),
                };
                TextJobTask::AbstractiveSummarization(AbstractiveSummaryParameters {
                    model_version: self.model_version.clone(),
                    summary_length,
                })
            }
            SummarizationKind::Extractive => {
                if self.sentence_count == Some(0) {
                    return Err(ToolError::InvalidArguments(
                        "'sentenceCount' must be at least 1".into(),
                    ));
                }
                TextJobTask::ExtractiveSummarization(ExtractiveSummaryParameters {
                    model_version: self.model_version.clone(),
                    sentence_count: self.sentence_count,
                })
            }
        };
        Ok(task)
    }
}

pub(crate) async fn handle_summarize_text(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: SummarizeTextArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let task = args.to_task()?;

    let request = TextJobRequest {
        analysis_input: TextInput {
            documents: vec![TextDocument::with_language(args.message, args.language)],
        },
        tasks: vec![task],
    };
    let outcome = service
        .jobs()
        .analyze_text_job(&request, &cancellation)
        .await?;
    Ok(ResponseEnvelope::from_outcome(&outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::{Value, json};

    fn args(value: Value) -> SummarizeTextArgs {
        serde_json::from_value(value).expect("arguments")
    }

    #[test]
    fn abstractive_is_the_default() {
        let task = args(json!({ "message": "text" })).to_task().expect("task");
        assert_eq!(
            task,
            TextJobTask::AbstractiveSummarization(AbstractiveSummaryParameters {
                model_version: "latest".into(),
                summary_length: SummaryLength::Medium,
            })
        );
    }

    #[test]
    fn legacy_length_bucket_name_is_accepted() {
        let task = args(json!({ "message": "text", "summaryLengthBucket": "Short" }))
            .to_task()
            .expect("task");
        assert!(matches!(
            task,
            TextJobTask::AbstractiveSummarization(AbstractiveSummaryParameters {
                summary_length: SummaryLength::Short,
                ..
            })
        ));
    }

    #[test]
    fn extractive_summary_rejects_zero_sentences() {
        let err = args(json!({
            "message": "text",
            "summarizationType": "extractive",
            "sentenceCount": 0
        }))
        .to_task()
        .expect_err("zero sentences");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn summary_job_is_polled_to_completion() {
        let server = MockServer::start_async().await;
        let status_url = format!("{}/language/analyze-text/jobs/sum-1", server.base_url());
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/language/analyze-text/jobs")
                    .json_body_partial(
                        r#"{"tasks":[{"kind":"ExtractiveSummarization","parameters":{"sentenceCount":2}}]}"#,
                    );
                then.status(202).header("operation-location", &status_url);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/language/analyze-text/jobs/sum-1");
                then.status(200).json_body(json!({
                    "status": "succeeded",
                    "tasks": { "items": [{
                        "kind": "ExtractiveSummarizationLROResults",
                        "status": "succeeded",
                        "results": {
                            "documents": [{ "id": "1", "sentences": [{ "text": "First point." }], "warnings": [] }],
                            "errors": []
                        }
                    }]}
                }));
            })
            .await;

        let service =
            LanguageService::from_config(&test_config(&server.base_url())).expect("service");
        let envelope = handle_summarize_text(
            &service,
            json!({
                "message": "First point. Second point.",
                "summarizationType": "extractive",
                "sentenceCount": 2
            })
            .as_object()
            .cloned(),
            CancellationToken::new(),
        )
        .await
        .expect("handler succeeds");

        submit.assert_async().await;
        assert!(!envelope.is_error);
        let documents: Value = serde_json::from_str(&envelope.content.text).expect("json");
        assert_eq!(documents[0]["sentences"][0]["text"], "First point.");
    }
}
