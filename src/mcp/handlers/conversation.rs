//! Handler for the `detect-intent` tool.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ToolError, parse_arguments, require_text, until_cancelled};
use crate::language::options::{StringIndexType, parse_option};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;

/// Arguments of `detect-intent`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentArgs {
    /// Utterance to analyse.
    pub message: String,
    /// Offset unit of recognised entities: `Utf16CodeUnit` (default), `UnicodeCodePoint` or
    /// `TextElements_v8`.
    #[serde(default)]
    pub string_index_type: Option<String>,
}

pub(crate) async fn handle_detect_intent(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: DetectIntentArgs = parse_arguments(arguments)?;
    require_text("message", &args.message)?;
    let string_index_type = match args.string_index_type.as_deref() {
        Some(value) => parse_option::<StringIndexType>("stringIndexType", value)?,
        None => StringIndexType::default(),
    };

    let prediction = until_cancelled(
        &cancellation,
        service
            .language()
            .analyze_conversation(&args.message, string_index_type),
    )
    .await?;
    Ok(ResponseEnvelope::json(&prediction)?)
}
