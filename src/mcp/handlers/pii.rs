//! Handlers for the `redact-pii-text` and `redact-pii-document` tools.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{
    ToolError, default_language, default_model_version, parse_arguments, require_text,
    until_cancelled,
};
use crate::jobs::{
    AnalysisTask, PiiTaskParameters, RedactionPolicy, build_job_request, single_document,
};
use crate::language::options::{
    RedactionPolicyKind, parse_option, parse_option_list, parse_redaction_character,
};
use crate::language::{AnalyzeTextRequest, TextDocument, TextTask};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;

/// Redaction options shared by both PII tools.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PiiOptionsArgs {
    /// Only recognise these PII categories (for example `Email`, `PhoneNumber`).
    #[serde(default)]
    pub pii_categories: Option<Vec<String>>,
    /// PII categories to leave untouched.
    #[serde(default)]
    pub exclude_pii_categories: Option<Vec<String>>,
    /// `CharacterMask` (default), `EntityMask` or `NoMask`.
    #[serde(default)]
    pub redaction_policy: Option<String>,
    /// Mask character used by `CharacterMask`, one of `* $ ! # % & + - = ? @ ^ ~`. Defaults to `*`.
    #[serde(default)]
    pub redaction_character: Option<String>,
    /// Language code of the text. Defaults to `en`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl Default for PiiOptionsArgs {
    fn default() -> Self {
        Self {
            pii_categories: None,
            exclude_pii_categories: None,
            redaction_policy: None,
            redaction_character: None,
            language: default_language(),
            model_version: default_model_version(),
        }
    }
}

impl PiiOptionsArgs {
    /// Validate the options into task parameters.
    pub(crate) fn to_parameters(&self) -> Result<PiiTaskParameters, ToolError> {
        let policy_kind = match self.redaction_policy.as_deref() {
            Some(value) => parse_option::<RedactionPolicyKind>("redactionPolicy", value)?,
            None => RedactionPolicyKind::default(),
        };
        let redaction_character = match self.redaction_character.as_deref() {
            Some(value) => parse_redaction_character(value)?,
            None => '*',
        };
        Ok(PiiTaskParameters {
            model_version: self.model_version.clone(),
            pii_categories: parse_option_list("piiCategories", self.pii_categories.as_deref())?,
            exclude_pii_categories: parse_option_list(
                "excludePiiCategories",
                self.exclude_pii_categories.as_deref(),
            )?,
            redaction_policy: RedactionPolicy::new(policy_kind, redaction_character),
        })
    }
}

/// Arguments of `redact-pii-text`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedactPiiTextArgs {
    /// Text to redact.
    pub message: String,
    /// Redaction options.
    #[serde(flatten)]
    pub options: PiiOptionsArgs,
}

/// Arguments of `redact-pii-document`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedactPiiDocumentArgs {
    /// Absolute URL of the document to redact.
    pub source_document: String,
    /// Absolute URL of the container receiving the redacted copy.
    pub target_document: String,
    /// Redaction options.
    #[serde(flatten)]
    pub options: PiiOptionsArgs,
}

/// Redact a text message through a synchronous analyze-text call.
pub(crate) async fn handle_redact_pii_text(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: RedactPiiTextArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let parameters = args.options.to_parameters()?;

    let request = AnalyzeTextRequest::single(
        TextTask::PiiEntityRecognition(parameters),
        TextDocument::with_language(args.message, args.options.language),
    );
    let outcome = until_cancelled(&cancellation, service.language().analyze_text(&request)).await?;
    Ok(ResponseEnvelope::from_outcome(&outcome)?)
}

/// Redact a stored document through a long-running analyze-documents job.
pub(crate) async fn handle_redact_pii_document(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: RedactPiiDocumentArgs = parse_arguments(arguments)?;
    let parameters = args.options.to_parameters()?;

    let request = build_job_request(
        vec![single_document(
            args.source_document,
            args.target_document,
            args.options.language,
        )],
        vec![AnalysisTask::PiiEntityRecognition(parameters)],
    )?;
    let outcome = service
        .jobs()
        .analyze_documents(&request, &cancellation)
        .await?;
    Ok(ResponseEnvelope::from_outcome(&outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::jobs::JobError;
    use crate::language::options::{OptionError, PiiCategory};
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::{Value, json};

    fn arguments(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn options_parse_into_typed_parameters() {
        let options = PiiOptionsArgs {
            pii_categories: Some(vec!["email".into(), "phonenumber".into()]),
            redaction_policy: Some("entitymask".into()),
            redaction_character: Some("#".into()),
            ..PiiOptionsArgs::default()
        };
        let parameters = options.to_parameters().expect("valid options");
        assert_eq!(
            parameters.pii_categories,
            Some(vec![PiiCategory::Email, PiiCategory::PhoneNumber])
        );
        assert_eq!(
            parameters.redaction_policy,
            RedactionPolicy::new(RedactionPolicyKind::EntityMask, '#')
        );
        assert_eq!(parameters.redaction_policy.redaction_character, None);
    }

    #[test]
    fn unknown_category_lists_allowed_values() {
        let options = PiiOptionsArgs {
            exclude_pii_categories: Some(vec!["ShoeSize".into()]),
            ..PiiOptionsArgs::default()
        };
        let err = options.to_parameters().expect_err("unknown category");
        let ToolError::Option(OptionError::InvalidValue { field, allowed, .. }) = err else {
            panic!("expected option error");
        };
        assert_eq!(field, "excludePiiCategories");
        assert!(allowed.contains("CreditCardNumber"));
    }

    #[test]
    fn invalid_mask_character_is_rejected() {
        let options = PiiOptionsArgs {
            redaction_character: Some("x".into()),
            ..PiiOptionsArgs::default()
        };
        assert!(matches!(
            options.to_parameters(),
            Err(ToolError::Option(OptionError::InvalidValue { field: "redactionCharacter", .. }))
        ));
    }

    #[tokio::test]
    async fn text_redaction_returns_documents() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/language/:analyze-text")
                    .json_body_partial(
                        r#"{"kind":"PiiEntityRecognition","parameters":{"redactionPolicy":{"policyKind":"CharacterMask","redactionCharacter":"*"}}}"#,
                    );
                then.status(200).json_body(json!({
                    "kind": "PiiEntityRecognitionResults",
                    "results": {
                        "documents": [{ "id": "1", "redactedText": "Call ********", "entities": [] }],
                        "errors": []
                    }
                }));
            })
            .await;

        let service =
            LanguageService::from_config(&test_config(&server.base_url())).expect("service");
        let envelope = handle_redact_pii_text(
            &service,
            arguments(json!({ "message": "Call 555-0100" })),
            CancellationToken::new(),
        )
        .await
        .expect("handler succeeds");

        mock.assert_async().await;
        assert!(!envelope.is_error);
        let documents: Value = serde_json::from_str(&envelope.content.text).expect("json");
        assert_eq!(documents[0]["redactedText"], "Call ********");
    }

    #[tokio::test]
    async fn blank_message_never_reaches_the_service() {
        let service =
            LanguageService::from_config(&test_config("http://127.0.0.1:1")).expect("service");
        let err = handle_redact_pii_text(
            &service,
            arguments(json!({ "message": " " })),
            CancellationToken::new(),
        )
        .await
        .expect_err("blank message");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn document_redaction_runs_a_job() {
        let server = MockServer::start_async().await;
        let status_url = format!("{}/language/analyze-documents/jobs/job-1", server.base_url());
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/language/analyze-documents/jobs")
                    .json_body_partial(
                        r#"{"analysisInput":{"documents":[{"id":"1","source":{"location":"https://store.example/in/a.docx"},"target":{"location":"https://store.example/out"},"language":"en"}]}}"#,
                    );
                then.status(202).header("operation-location", &status_url);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/language/analyze-documents/jobs/job-1");
                then.status(200).json_body(json!({
                    "status": "succeeded",
                    "tasks": { "items": [{
                        "kind": "PiiEntityRecognitionLROResults",
                        "status": "succeeded",
                        "results": {
                            "documents": [{
                                "id": "1",
                                "source": { "location": "https://store.example/in/a.docx" },
                                "targets": [{ "location": "https://store.example/out/a.docx" }],
                                "warnings": []
                            }],
                            "errors": []
                        }
                    }]}
                }));
            })
            .await;

        let service =
            LanguageService::from_config(&test_config(&server.base_url())).expect("service");
        let envelope = handle_redact_pii_document(
            &service,
            arguments(json!({
                "sourceDocument": "https://store.example/in/a.docx",
                "targetDocument": "https://store.example/out"
            })),
            CancellationToken::new(),
        )
        .await
        .expect("handler succeeds");

        submit.assert_async().await;
        assert!(!envelope.is_error);
        let documents: Value = serde_json::from_str(&envelope.content.text).expect("json");
        assert_eq!(documents[0]["source"]["location"], "https://store.example/in/a.docx");
    }

    #[tokio::test]
    async fn relative_document_location_is_an_invalid_argument() {
        let service =
            LanguageService::from_config(&test_config("http://127.0.0.1:1")).expect("service");
        let err = handle_redact_pii_document(
            &service,
            arguments(json!({
                "sourceDocument": "a.docx",
                "targetDocument": "https://store.example/out"
            })),
            CancellationToken::new(),
        )
        .await
        .expect_err("relative source");
        assert!(matches!(err, ToolError::Job(JobError::InvalidArgument(_))));
    }
}
