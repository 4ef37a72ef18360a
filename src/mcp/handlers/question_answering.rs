//! Handler for the `answer-question` tool.

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{ToolError, parse_arguments, require_text, until_cancelled};
use crate::language::{KnowledgeBaseQuery, RankerKind};
use crate::mcp::envelope::ResponseEnvelope;
use crate::service::LanguageService;

/// Arguments of `answer-question`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerQuestionArgs {
    /// Question to ask the knowledge base.
    pub message: String,
    /// Maximum number of answers. Defaults to 5.
    #[serde(default = "default_top")]
    pub top: u32,
    /// Minimum confidence between 0 and 1. Defaults to 0.6.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_score_threshold: f64,
    /// Rank on the question only instead of question and answer.
    #[serde(default)]
    pub question_only: bool,
}

fn default_top() -> u32 {
    5
}

fn default_confidence_threshold() -> f64 {
    0.6
}

impl AnswerQuestionArgs {
    fn into_query(self) -> Result<KnowledgeBaseQuery, ToolError> {
        require_text("message", &self.message)?;
        if self.top == 0 {
            return Err(ToolError::InvalidArguments("'top' must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_score_threshold) {
            return Err(ToolError::InvalidArguments(
                "'confidenceScoreThreshold' must be between 0 and 1".into(),
            ));
        }
        Ok(KnowledgeBaseQuery {
            question: self.message,
            top: self.top,
            confidence_score_threshold: self.confidence_score_threshold,
            ranker_type: if self.question_only {
                RankerKind::QuestionOnly
            } else {
                RankerKind::Default
            },
        })
    }
}

pub(crate) async fn handle_answer_question(
    service: &LanguageService,
    arguments: Option<JsonObject>,
    cancellation: CancellationToken,
) -> Result<ResponseEnvelope, ToolError> {
    let args: AnswerQuestionArgs = parse_arguments(arguments)?;
    let query = args.into_query()?;
    let answers =
        until_cancelled(&cancellation, service.language().query_knowledge_base(&query)).await?;
    tracing::debug!(answers = answers.len(), "Knowledge base answered");
    Ok(ResponseEnvelope::json(&answers)?)
}
