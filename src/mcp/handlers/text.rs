//! Handlers for the synchronous analyze-text tools.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{
    ToolError, default_language, default_model_version, parse_arguments, require_text,
    until_cancelled,
};
use crate::language::options::{EntityCategory, OverlapPolicy, parse_option, parse_option_list};
use crate::language::types::{
    EntityParameters, ModelParameters, OverlapPolicySetting, SentimentParameters,
};
use crate::language::{AnalyzeTextRequest, TextDocument, TextTask};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;

/// Arguments of `extract-entities`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractEntitiesArgs {
    /// Text to analyse.
    pub message: String,
    /// Only return these entity categories.
    #[serde(default)]
    pub inclusion_list: Option<Vec<String>>,
    /// Never return these entity categories.
    #[serde(default)]
    pub exclusion_list: Option<Vec<String>>,
    /// `matchLongest` (default) or `allowOverlap`.
    #[serde(default)]
    pub overlap_policy: Option<String>,
    /// Language code of the text. Defaults to `en`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

/// Arguments of `extract-key-phrases`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractKeyPhrasesArgs {
    /// Text to analyse.
    pub message: String,
    /// Language code of the text. Defaults to `en`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

/// Arguments of `detect-language`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectLanguageArgs {
    /// Text whose language should be detected.
    pub message: String,
    /// Two letter country code hinting at the origin of the text.
    #[serde(default)]
    pub country_hint: Option<String>,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

/// Arguments of `analyze-sentiment`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSentimentArgs {
    /// Text to analyse.
    pub message: String,
    /// Also return aspect-level opinions. Defaults to `true`.
    #[serde(default = "default_opinion_mining")]
    pub opinion_mining: bool,
    /// Language code of the text. Defaults to `en`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Model version. Defaults to `latest`.
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

fn default_opinion_mining() -> bool {
    true
}

pub(crate) async fn handle_extract_entities(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: ExtractEntitiesArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let overlap = match args.overlap_policy.as_deref() {
        Some(value) => parse_option::<OverlapPolicy>("overlapPolicy", value)?,
        None => OverlapPolicy::default(),
    };
    let task = TextTask::EntityRecognition(EntityParameters {
        model_version: args.model_version,
        inclusion_list: parse_option_list::<EntityCategory>(
            "inclusionList",
            args.inclusion_list.as_deref(),
        )?,
        exclusion_list: parse_option_list::<EntityCategory>(
            "exclusionList",
            args.exclusion_list.as_deref(),
        )?,
        overlap_policy: OverlapPolicySetting {
            policy_kind: overlap,
        },
    });
    analyze(
        service,
        &cancellation,
        task,
        TextDocument::with_language(args.message, args.language),
    )
    .await
}

pub(crate) async fn handle_extract_key_phrases(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: ExtractKeyPhrasesArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let task = TextTask::KeyPhraseExtraction(ModelParameters {
        model_version: args.model_version,
    });
    analyze(
        service,
        &cancellation,
        task,
        TextDocument::with_language(args.message, args.language),
    )
    .await
}

pub(crate) async fn handle_detect_language(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: DetectLanguageArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let country_hint = args
        .country_hint
        .map(|hint| hint.trim().to_string())
        .filter(|hint| !hint.is_empty());
    let task = TextTask::LanguageDetection(ModelParameters {
        model_version: args.model_version,
    });
    analyze(
        service,
        &cancellation,
        task,
        TextDocument::with_country_hint(args.message, country_hint),
    )
    .await
}

pub(crate) async fn handle_analyze_sentiment(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: AnalyzeSentimentArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let task = TextTask::SentimentAnalysis(SentimentParameters {
        model_version: args.model_version,
        opinion_mining: args.opinion_mining,
    });
    analyze(
        service,
        &cancellation,
        task,
        TextDocument::with_language(args.message, args.language),
    )
    .await
}

async fn analyze(
    service: &LanguageService,
    cancellation: &CancellationToken,
    task: TextTask,
    document: TextDocument,
) -> Result<ResponseEnvelope, ToolError> {
    let request = AnalyzeTextRequest::single(task, document);
    let outcome = until_cancelled(cancellation, service.language().analyze_text(&request)).await?;
    Ok(ResponseEnvelope::from_outcome(&outcome)?)
}
