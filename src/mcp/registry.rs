use std::{
    collections::{BTreeSet, HashMap},
    future::Future,
    pin::Pin,
};

use rmcp::ErrorData as McpError;
use rmcp::model::{JsonObject, ReadResourceRequestParam, ReadResourceResult, ToolAnnotations};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tokio_util::sync::CancellationToken;

use super::envelope::ResponseEnvelope;
use super::handlers::{
    ToolError, conversation, healthcare, pii, question_answering, summarize, text, translate,
};
use super::schemas::input_schema;
use super::server::LanguageMcpServer;
use crate::service::LanguageService;

pub type ResourceFuture =
    Pin<Box<dyn Future<Output = Result<ReadResourceResult, McpError>> + Send>>;
pub type ToolFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResponseEnvelope, ToolError>> + Send + 'a>>;

pub type ResourceHandler = fn(&LanguageMcpServer, ReadResourceRequestParam) -> ResourceFuture;
pub type ToolHandler =
    for<'a> fn(&'a LanguageService, Option<JsonObject>, CancellationToken) -> ToolFuture<'a>;

/// Every tool the server knows about. The kebab-case form is the wire name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ToolName {
    /// Redact personal information from a text message.
    RedactPiiText,
    /// Redact personal information from a stored document.
    RedactPiiDocument,
    /// Recognise named entities.
    ExtractEntities,
    /// Extract key phrases.
    ExtractKeyPhrases,
    /// Detect the language of a text.
    DetectLanguage,
    /// Score sentiment and mine opinions.
    AnalyzeSentiment,
    /// Extract clinical entities and relations.
    ExtractHealthcareEntities,
    /// Summarize a text.
    SummarizeText,
    /// Answer a question from the configured knowledge base.
    AnswerQuestion,
    /// Detect the intent of an utterance with the configured conversation project.
    DetectIntent,
    /// Translate a text into one or more languages.
    TranslateText,
}

impl ToolName {
    /// Wire name of the tool.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Handler invoked for this tool.
    pub(crate) fn handler(self) -> ToolHandler {
        match self {
            Self::RedactPiiText => tool_redact_pii_text,
            Self::RedactPiiDocument => tool_redact_pii_document,
            Self::ExtractEntities => tool_extract_entities,
            Self::ExtractKeyPhrases => tool_extract_key_phrases,
            Self::DetectLanguage => tool_detect_language,
            Self::AnalyzeSentiment => tool_analyze_sentiment,
            Self::ExtractHealthcareEntities => tool_extract_healthcare_entities,
            Self::SummarizeText => tool_summarize_text,
            Self::AnswerQuestion => tool_answer_question,
            Self::DetectIntent => tool_detect_intent,
            Self::TranslateText => tool_translate_text,
        }
    }

    /// Human readable title.
    pub fn title(self) -> &'static str {
        match self {
            Self::RedactPiiText => "Redact PII in Text",
            Self::RedactPiiDocument => "Redact PII in Document",
            Self::ExtractEntities => "Extract Entities",
            Self::ExtractKeyPhrases => "Extract Key Phrases",
            Self::DetectLanguage => "Detect Language",
            Self::AnalyzeSentiment => "Analyze Sentiment",
            Self::ExtractHealthcareEntities => "Extract Healthcare Entities",
            Self::SummarizeText => "Summarize Text",
            Self::AnswerQuestion => "Answer Question",
            Self::DetectIntent => "Detect Intent",
            Self::TranslateText => "Translate Text",
        }
    }

    /// Description shown to MCP hosts.
    pub fn description(self) -> &'static str {
        match self {
            Self::RedactPiiText => {
                "Detect and redact personal information in a text message. Optionally restrict or exclude PII categories and choose how entities are masked. Returns a JSON array of documents with the redacted text and recognised entities."
            }
            Self::RedactPiiDocument => {
                "Redact personal information in a document stored at sourceDocument and write the redacted copy to the targetDocument container. Runs as a long job; returns a JSON array describing the source and written targets."
            }
            Self::ExtractEntities => {
                "Recognise named entities (people, places, organizations, quantities, ...) in a text message. Returns a JSON array of documents with their entities."
            }
            Self::ExtractKeyPhrases => {
                "Extract the main talking points of a text message. Returns a JSON array of documents with their key phrases."
            }
            Self::DetectLanguage => {
                "Detect the language a text message is written in. Returns a JSON array of documents with the detected language and confidence."
            }
            Self::AnalyzeSentiment => {
                "Score the sentiment of a text message per document and sentence, optionally mining aspect-level opinions. Returns a JSON array of documents."
            }
            Self::ExtractHealthcareEntities => {
                "Extract healthcare entities (medications, conditions, dosages, ...) and their relations from clinical text. Optionally give a document type and FHIR version. Runs as a job; returns a JSON array of documents with their entities."
            }
            Self::SummarizeText => {
                "Summarize a text message, abstractively or by extracting its key sentences. Returns a JSON array of documents containing the summary."
            }
            Self::AnswerQuestion => {
                "Answer a question from the configured knowledge base. Returns the matching answers as a JSON array, best match first."
            }
            Self::DetectIntent => {
                "Detect the top intent and the entities of an utterance with the configured conversational language understanding project. Returns the prediction as JSON."
            }
            Self::TranslateText => {
                "Translate a text message into one or more target languages, detecting the source language unless given. Returns a JSON array of translations."
            }
        }
    }

    /// Behavioural hints for MCP hosts.
    pub fn annotations(self) -> ToolAnnotations {
        let annotations = ToolAnnotations::with_title(self.title())
            .idempotent(true)
            .open_world(true);
        match self {
            Self::RedactPiiDocument => annotations.read_only(false).destructive(false),
            _ => annotations.read_only(true),
        }
    }

    /// JSON schema of the tool arguments.
    pub fn input_schema(self) -> Map<String, Value> {
        match self {
            Self::RedactPiiText => input_schema::<pii::RedactPiiTextArgs>(),
            Self::RedactPiiDocument => input_schema::<pii::RedactPiiDocumentArgs>(),
            Self::ExtractEntities => input_schema::<text::ExtractEntitiesArgs>(),
            Self::ExtractKeyPhrases => input_schema::<text::ExtractKeyPhrasesArgs>(),
            Self::DetectLanguage => input_schema::<text::DetectLanguageArgs>(),
            Self::AnalyzeSentiment => input_schema::<text::AnalyzeSentimentArgs>(),
            Self::ExtractHealthcareEntities => {
                input_schema::<healthcare::ExtractHealthcareEntitiesArgs>()
            }
            Self::SummarizeText => input_schema::<summarize::SummarizeTextArgs>(),
            Self::AnswerQuestion => input_schema::<question_answering::AnswerQuestionArgs>(),
            Self::DetectIntent => input_schema::<conversation::DetectIntentArgs>(),
            Self::TranslateText => input_schema::<translate::TranslateTextArgs>(),
        }
    }
}

/// Parse a tool name given on the command line.
pub fn parse_tool_name(value: &str) -> Result<ToolName, String> {
    value.trim().parse().map_err(|_| {
        let allowed: Vec<&'static str> = ToolName::iter().map(ToolName::as_str).collect();
        format!(
            "unknown tool '{value}'; expected one of: {}",
            allowed.join(", ")
        )
    })
}

/// Registry of enabled tools and resource handlers.
pub struct Registry {
    pub resources: HashMap<&'static str, ResourceHandler>,
    pub tools: BTreeSet<ToolName>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            tools: BTreeSet::new(),
        }
    }

    pub fn register_resource(&mut self, uri: &'static str, handler: ResourceHandler) {
        self.resources.insert(uri, handler);
    }

    pub fn register_tool(&mut self, tool: ToolName) {
        self.tools.insert(tool);
    }

    /// Resolve an enabled tool by wire name.
    pub fn tool(&self, name: &str) -> Option<ToolName> {
        name.parse()
            .ok()
            .filter(|tool: &ToolName| self.tools.contains(tool))
    }
}

fn tool_redact_pii_text(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(pii::handle_redact_pii_text(service, arguments, cancellation))
}

fn tool_redact_pii_document(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(pii::handle_redact_pii_document(
        service,
        arguments,
        cancellation,
    ))
}

fn tool_extract_entities(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(text::handle_extract_entities(service, arguments, cancellation))
}

fn tool_extract_key_phrases(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(text::handle_extract_key_phrases(
        service,
        arguments,
        cancellation,
    ))
}

fn tool_detect_language(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(text::handle_detect_language(service, arguments, cancellation))
}

fn tool_analyze_sentiment(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(text::handle_analyze_sentiment(service, arguments, cancellation))
}

fn tool_extract_healthcare_entities(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(healthcare::handle_extract_healthcare_entities(
        service,
        arguments,
        cancellation,
    ))
}

fn tool_summarize_text(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(summarize::handle_summarize_text(
        service,
        arguments,
        cancellation,
    ))
}

fn tool_answer_question(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(question_answering::handle_answer_question(
        service,
        arguments,
        cancellation,
    ))
}

fn tool_detect_intent(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(conversation::handle_detect_intent(
        service,
        arguments,
        cancellation,
    ))
}

fn tool_translate_text(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> ToolFuture<'_> {
    Box::pin(translate::handle_translate_text(
        service,
        arguments,
        cancellation,
    ))
}
