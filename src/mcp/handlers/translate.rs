//! Handler for the `translate-text` tool.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ToolError, parse_arguments, require_text, until_cancelled};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;
use crate::translator::Translation;

/// Arguments of `translate-text`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslateTextArgs {
    /// Text to translate.
    pub message: String,
    /// Language codes to translate into, for example `["fr", "de"]`.
    pub target_languages: Vec<String>,
    /// Language code of the text; detected when omitted.
    #[serde(default)]
    pub source_language: Option<String>,
}

pub(crate) async fn handle_translate_text(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: TranslateTextArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;

    let translations = until_cancelled(
        &cancellation,
        service.translator().translate(
            &args.message,
            &args.target_languages,
            args.source_language.as_deref(),
        ),
    )
    .await?;
    let translations: Vec<Translation> = translations.into_iter().flatten().collect();
    Ok(ResponseEnvelope::json(&translations)?)
}
