//! Request and response types for the synchronous language endpoints.

use crate::jobs::types::{DEFAULT_DOCUMENT_ID, PiiTaskParameters, ServiceError, TaskResults};
use crate::language::options::{
    EntityCategory, HealthcareDocumentType, OverlapPolicy, StringIndexType, SummaryLength,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors returned while calling the language service synchronously.
#[derive(Debug, Error)]
pub enum LanguageError {
    /// Endpoint failed to parse.
    #[error("Invalid language endpoint: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a structured error.
    #[error("{}: {}", .error.code, .error.message)]
    Service {
        /// HTTP status of the response.
        status: StatusCode,
        /// Error object from the body.
        error: ServiceError,
    },
    /// The service answered with an unexpected status and no structured error.
    #[error("Unexpected language service response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status of the response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// A feature needs settings that were not provided.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    /// Response body did not match the expected shape.
    #[error("Failed to decode language service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Text document sent to analyze-text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    /// Identifier unique within the request.
    pub id: String,
    /// Text to analyse.
    pub text: String,
    /// Language code of the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Country hint used by language detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_hint: Option<String>,
}

impl TextDocument {
    /// Single document in a known language under the default identifier.
    pub fn with_language(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: DEFAULT_DOCUMENT_ID.to_string(),
            text: text.into(),
            language: Some(language.into()),
            country_hint: None,
        }
    }

    /// Single document for language detection under the default identifier.
    pub fn with_country_hint(text: impl Into<String>, country_hint: Option<String>) -> Self {
        Self {
            id: DEFAULT_DOCUMENT_ID.to_string(),
            text: text.into(),
            language: None,
            country_hint,
        }
    }
}

/// Document list of an analyze-text request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInput {
    /// Documents to analyse.
    pub documents: Vec<TextDocument>,
}

/// Parameters carrying only a model version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameters {
    /// Model version.
    pub model_version: String,
}

/// Overlap resolution wrapper expected by entity recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapPolicySetting {
    /// Selected overlap policy.
    pub policy_kind: OverlapPolicy,
}

/// Parameters of entity recognition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityParameters {
    /// Model version.
    pub model_version: String,
    /// Only return these categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion_list: Option<Vec<EntityCategory>>,
    /// Never return these categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_list: Option<Vec<EntityCategory>>,
    /// Overlap resolution.
    pub overlap_policy: OverlapPolicySetting,
}

/// Parameters of sentiment analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentParameters {
    /// Model version.
    pub model_version: String,
    /// Return aspect-level opinions.
    pub opinion_mining: bool,
}

/// Synchronous analysis kinds with their parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "parameters")]
pub enum TextTask {
    /// Detect and redact personal information.
    PiiEntityRecognition(PiiTaskParameters),
    /// Recognise named entities.
    EntityRecognition(EntityParameters),
    /// Extract key phrases.
    KeyPhraseExtraction(ModelParameters),
    /// Detect the language of the text.
    LanguageDetection(ModelParameters),
    /// Score sentiment and mine opinions.
    SentimentAnalysis(SentimentParameters),
}

/// Body of a synchronous analyze-text call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    /// Task kind and parameters.
    #[serde(flatten)]
    pub task: TextTask,
    /// Documents to analyse.
    pub analysis_input: TextInput,
}

impl AnalyzeTextRequest {
    /// Request over a single document.
    pub fn single(task: TextTask, document: TextDocument) -> Self {
        Self {
            task,
            analysis_input: TextInput {
                documents: vec![document],
            },
        }
    }
}

/// Parsed synchronous analyze-text response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeTextResponse {
    /// Result kind reported by the service.
    #[serde(default)]
    pub kind: Option<String>,
    /// Documents and errors.
    pub results: TaskResults<Value>,
}

/// Parameters of abstractive summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractiveSummaryParameters {
    /// Model version.
    pub model_version: String,
    /// Target summary length.
    pub summary_length: SummaryLength,
}

/// Parameters of extractive summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractiveSummaryParameters {
    /// Model version.
    pub model_version: String,
    /// Maximum number of sentences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_count: Option<u32>,
}

/// Parameters of healthcare entity extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcareParameters {
    /// Model version.
    pub model_version: String,
    /// FHIR version of the returned bundle.
    pub fhir_version: String,
    /// Clinical document type hint.
    pub document_type: HealthcareDocumentType,
}

/// Tasks accepted by analyze-text jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "parameters")]
pub enum TextJobTask {
    /// Generate a new summary.
    AbstractiveSummarization(AbstractiveSummaryParameters),
    /// Select representative sentences.
    ExtractiveSummarization(ExtractiveSummaryParameters),
    /// Extract clinical entities and their relations.
    Healthcare(HealthcareParameters),
}

/// Body of an analyze-text job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextJobRequest {
    /// Documents to analyse.
    pub analysis_input: TextInput,
    /// Tasks applied to every document.
    pub tasks: Vec<TextJobTask>,
}

/// Question sent to a knowledge base project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseQuery {
    /// Question text.
    pub question: String,
    /// Maximum number of answers.
    pub top: u32,
    /// Minimum confidence of returned answers, between 0 and 1.
    pub confidence_score_threshold: f64,
    /// Ranking strategy.
    pub ranker_type: RankerKind,
}

/// Ranking strategy of question answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RankerKind {
    /// Rank on question and answer.
    #[default]
    Default,
    /// Rank on the question only.
    QuestionOnly,
}

/// Parsed knowledge base response.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBaseAnswers {
    /// Answers ordered by confidence.
    #[serde(default)]
    pub answers: Vec<Value>,
}

/// One utterance sent to conversational language understanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationItem {
    /// Identifier of the utterance.
    pub id: String,
    /// Speaker of the utterance.
    pub participant_id: String,
    /// Utterance text.
    pub text: String,
}

/// Input of an analyze-conversations call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInput {
    /// Utterance to analyse.
    pub conversation_item: ConversationItem,
}

/// Deployed project and options of an analyze-conversations call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParameters {
    /// Project name.
    pub project_name: String,
    /// Deployment name.
    pub deployment_name: String,
    /// Offset unit of recognised entities.
    pub string_index_type: StringIndexType,
}

/// Body of an analyze-conversations call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeConversationRequest {
    /// Always `Conversation`.
    pub kind: &'static str,
    /// Utterance to analyse.
    pub analysis_input: ConversationInput,
    /// Target project.
    pub parameters: ConversationParameters,
}

impl AnalyzeConversationRequest {
    /// Request for a single utterance.
    pub fn single(text: impl Into<String>, parameters: ConversationParameters) -> Self {
        Self {
            kind: "Conversation",
            analysis_input: ConversationInput {
                conversation_item: ConversationItem {
                    id: DEFAULT_DOCUMENT_ID.to_string(),
                    participant_id: "participant1".to_string(),
                    text: text.into(),
                },
            },
            parameters,
        }
    }
}

/// Parsed analyze-conversations response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeConversationResponse {
    /// Result kind reported by the service.
    #[serde(default)]
    pub kind: Option<String>,
    /// Query and prediction.
    pub result: ConversationResult,
}

/// Prediction for one utterance.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationResult {
    /// Utterance as received by the service.
    #[serde(default)]
    pub query: Option<String>,
    /// Top intent, ranked intents and entities.
    pub prediction: Value,
}
