//! HTTP client for the synchronous language endpoints.

use crate::config::Config;
use crate::jobs::reconcile::reconcile_tasks;
use crate::jobs::types::{Outcome, ServiceError};
use crate::language::options::StringIndexType;
use crate::language::types::{
    AnalyzeConversationRequest, AnalyzeConversationResponse, AnalyzeTextRequest,
    AnalyzeTextResponse, ConversationParameters, KnowledgeBaseAnswers, KnowledgeBaseQuery,
    LanguageError,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const ANALYZE_TEXT_PATH: &str = "language/:analyze-text";
const QUERY_KNOWLEDGE_BASES_PATH: &str = "language/:query-knowledgebases";
const ANALYZE_CONVERSATIONS_PATH: &str = "language/:analyze-conversations";
/// API version of the question answering runtime.
pub const QUESTION_ANSWERING_API_VERSION: &str = "2021-10-01";
/// API version of the conversational language understanding runtime.
pub const CONVERSATION_API_VERSION: &str = "2023-04-01";

/// Deployed project to query, for question answering or conversation understanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDeployment {
    /// Project name.
    pub project: String,
    /// Deployment name.
    pub deployment: String,
}

/// Connection settings of a [`LanguageClient`].
#[derive(Debug, Clone)]
pub struct LanguageSettings {
    /// Base URL of the language resource.
    pub endpoint: String,
    /// Subscription key.
    pub api_key: String,
    /// `api-version` sent to analyze-text.
    pub api_version: String,
    /// Knowledge base used by question answering, when configured.
    pub question_answering: Option<ProjectDeployment>,
    /// Conversation project used for intent detection, when configured.
    pub conversation: Option<ProjectDeployment>,
}

impl LanguageSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.language_endpoint.clone(),
            api_key: config.language_api_key.clone(),
            api_version: config.language_api_version.clone(),
            question_answering: ProjectDeployment::pair(
                &config.question_answering_project,
                &config.question_answering_deployment,
            ),
            conversation: ProjectDeployment::pair(
                &config.conversation_project,
                &config.conversation_deployment,
            ),
        }
    }
}

impl ProjectDeployment {
    fn pair(project: &Option<String>, deployment: &Option<String>) -> Option<Self> {
        project
            .clone()
            .zip(deployment.clone())
            .map(|(project, deployment)| Self {
                project,
                deployment,
            })
    }
}

/// Lightweight HTTP client for analyze-text and question answering.
pub struct LanguageClient {
    client: Client,
    settings: LanguageSettings,
}

impl LanguageClient {
    /// Build a client, validating the endpoint up front.
    pub fn new(settings: LanguageSettings) -> Result<Self, LanguageError> {
        reqwest::Url::parse(&settings.endpoint)
            .map_err(|err| LanguageError::InvalidUrl(format!("{}: {err}", settings.endpoint)))?;
        let client = Client::builder()
            .user_agent(concat!("language-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        tracing::debug!(
            endpoint = %settings.endpoint,
            question_answering = settings.question_answering.is_some(),
            conversation = settings.conversation.is_some(),
            "Initialized language client"
        );
        Ok(Self { client, settings })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, LanguageError> {
        Self::new(LanguageSettings::from_config(config))
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    /// Run a synchronous analysis and collapse its result into documents or errors.
    pub async fn analyze_text(
        &self,
        request: &AnalyzeTextRequest,
    ) -> Result<Outcome<Value>, LanguageError> {
        let response = self
            .client
            .post(self.url(ANALYZE_TEXT_PATH))
            .query(&[("api-version", self.settings.api_version.as_str())])
            .header(ACCEPT, "application/json")
            .header(SUBSCRIPTION_KEY_HEADER, &self.settings.api_key)
            .json(request)
            .send()
            .await?;

        let payload: AnalyzeTextResponse = self.parse_response(response).await?;
        tracing::debug!(kind = ?payload.kind, "Analyze-text call completed");
        Ok(reconcile_tasks(std::iter::once(&payload.results)))
    }

    /// Ask the configured knowledge base and return its answers.
    pub async fn query_knowledge_base(
        &self,
        query: &KnowledgeBaseQuery,
    ) -> Result<Vec<Value>, LanguageError> {
        let project = self
            .settings
            .question_answering
            .as_ref()
            .ok_or(LanguageError::NotConfigured("Question answering project"))?;

        let response = self
            .client
            .post(self.url(QUERY_KNOWLEDGE_BASES_PATH))
            .query(&[
                ("projectName", project.project.as_str()),
                ("deploymentName", project.deployment.as_str()),
                ("api-version", QUESTION_ANSWERING_API_VERSION),
            ])
            .header(ACCEPT, "application/json")
            .header(SUBSCRIPTION_KEY_HEADER, &self.settings.api_key)
            .json(query)
            .send()
            .await?;

        let payload: KnowledgeBaseAnswers = self.parse_response(response).await?;
        Ok(payload.answers)
    }

    /// Detect the intent and entities of one utterance with the configured conversation project.
    pub async fn analyze_conversation(
        &self,
        text: &str,
        string_index_type: StringIndexType,
    ) -> Result<Value, LanguageError> {
        let project = self
            .settings
            .conversation
            .as_ref()
            .ok_or(LanguageError::NotConfigured("Conversation project"))?;
        let request = AnalyzeConversationRequest::single(
            text,
            ConversationParameters {
                project_name: project.project.clone(),
                deployment_name: project.deployment.clone(),
                string_index_type,
            },
        );

        let response = self
            .client
            .post(self.url(ANALYZE_CONVERSATIONS_PATH))
            .query(&[("api-version", CONVERSATION_API_VERSION)])
            .header(ACCEPT, "application/json")
            .header(SUBSCRIPTION_KEY_HEADER, &self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let payload: AnalyzeConversationResponse = self.parse_response(response).await?;
        tracing::debug!(
            kind = ?payload.kind,
            top_intent = ?payload.result.prediction.get("topIntent"),
            "Analyze-conversations call completed"
        );
        Ok(payload.result.prediction)
    }

    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, LanguageError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        #[derive(Deserialize)]
        struct ErrorEnvelope {
            error: ServiceError,
        }

        let error = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => LanguageError::Service {
                status,
                error: envelope.error,
            },
            Err(_) => LanguageError::UnexpectedStatus { status, body },
        };
        tracing::error!(error = %error, "Language service request failed");
        Err(error)
    }

    fn url(&self, path: &str) -> String {
        let base = self.settings.endpoint.trim_end_matches('/');
        format!("{base}/{path}")
    }
}
