//! Handler for the `extract-healthcare-entities` tool, driven as an analyze-text job.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ToolError, default_language, default_model_version, parse_arguments, require_text};
use crate::language::options::{HealthcareDocumentType, parse_option};
use crate::language::types::{HealthcareParameters, TextInput, TextJobTask};
use crate::language::{TextDocument, TextJobRequest};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;

const DEFAULT_FHIR_VERSION: &str = "4.0.1";

fn default_fhir_version() -> String {
    DEFAULT_FHIR_VERSION.to_string()
}

/// Arguments of `extract-healthcare-entities`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractHealthcareEntitiesArgs {
    /// Clinical text to analyse.
    pub message: String,
    /// Document type hint such as `DischargeSummary` or `ProgressNote`. Defaults to `None`.
    #[serde(default, alias = "healthcareDocumentTypeStr")]
    pub healthcare_document_type: Option<String>,
    /// Language code of the text. Defaults to `en`.
    #[serde(default = "default_language")]
    pub language: String,
    /// FHIR version of the returned bundle. Defaults to `4.0.1`.
    #[serde(default = "default_fhir_version")]
    pub fhir_version: String,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

impl ExtractHealthcareEntitiesArgs {
    fn to_task(&self) -> Result<TextJobTask, ToolError> {
        let document_type = match self.healthcare_document_type.as_deref() {
            Some(value) => parse_option::<HealthcareDocumentType>("healthcareDocumentType", value)?,
            None => HealthcareDocumentType::default(),
        };
        require_text("fhirVersion", &self.fhir_version)?;
        Ok(TextJobTask::Healthcare(HealthcareParameters {
            model_version: self.model_version.clone(),
            fhir_version: self.fhir_version.clone(),
            document_type,
        }))
    }
}

pub(crate) async fn handle_extract_healthcare_entities(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: ExtractHealthcareEntitiesArgs = parse_arguments(arguments)?;
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

    fn args(value: Value) -> ExtractHealthcareEntitiesArgs {
        serde_json::from_value(value).expect("arguments")
    }

    #[test]
    fn defaults_to_untyped_document_and_fhir_4() {
        let task = args(json!({ "message": "100mg ibuprofen" }))
            .to_task()
            .expect("task");
        assert_eq!(
            task,
            TextJobTask::Healthcare(HealthcareParameters {
                model_version: "latest".into(),
                fhir_version: "4.0.1".into(),
                document_type: HealthcareDocumentType::Unspecified,
            })
        );
    }

    #[test]
    fn legacy_document_type_name_is_accepted() {
        let task = args(json!({ "message": "text", "healthcareDocumentTypeStr": "imaging" }))
            .to_task()
            .expect("task");
        assert!(matches!(
            task,
            TextJobTask::Healthcare(HealthcareParameters {
                document_type: HealthcareDocumentType::Imaging,
                ..
            })
        ));
    }

    #[test]
    fn unknown_document_type_is_rejected() {
        let err = args(json!({ "message": "text", "healthcareDocumentType": "Prescription" }))
            .to_task()
            .expect_err("unknown type");
        assert!(err.to_string().contains("DischargeSummary"), "{err}");
    }

    #[tokio::test]
    async fn healthcare_job_is_polled_to_completion() {
        let server = MockServer::start_async().await;
        let status_url = format!("{}/language/analyze-text/jobs/hc-1", server.base_url());
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/language/analyze-text/jobs")
                    .json_body_partial(
                        r#"{"tasks":[{"kind":"Healthcare","parameters":{"fhirVersion":"4.0.1","documentType":"DischargeSummary"}}]}"#,
                    );
                then.status(202).header("operation-location", &status_url);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/language/analyze-text/jobs/hc-1");
                then.status(200).json_body(json!({
                    "status": "succeeded",
                    "tasks": { "items": [{
                        "kind": "HealthcareLROResults",
                        "status": "succeeded",
                        "results": {
                            "documents": [{
                                "id": "1",
                                "entities": [{ "text": "ibuprofen", "category": "MedicationName" }],
                                "relations": [],
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
        let envelope = handle_extract_healthcare_entities(
            &service,
            json!({
                "message": "Prescribed 100mg ibuprofen",
                "healthcareDocumentType": "DischargeSummary"
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
        assert_eq!(documents[0]["entities"][0]["category"], "MedicationName");
    }
}
