use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// API version used for analyze-text and analyze-documents calls when none is configured.
pub const DEFAULT_API_VERSION: &str = "2024-11-15-preview";
/// Job timeout applied when `LANGUAGE_JOB_TIMEOUT_MINUTES` is unset or not positive.
pub const DEFAULT_JOB_TIMEOUT_MINUTES: u64 = 300;
/// Fixed delay between two status polls of a running job.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
/// Global translator endpoint used when no regional endpoint is configured.
pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the language MCP server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the language resource (e.g. `https://<name>.cognitiveservices.azure.com`).
    pub language_endpoint: String,
    /// Subscription key sent with every language request.
    pub language_api_key: String,
    /// `api-version` query value for analyze-text and analyze-documents calls.
    pub language_api_version: String,
    /// Deadline for one polling session, in minutes.
    pub job_timeout_minutes: u64,
    /// Delay between two polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Question answering project name.
    pub question_answering_project: Option<String>,
    /// Question answering deployment name.
    pub question_answering_deployment: Option<String>,
    /// Conversational language understanding project name.
    pub conversation_project: Option<String>,
    /// Conversational language understanding deployment name.
    pub conversation_deployment: Option<String>,
    /// Base URL of the translator service.
    pub translator_endpoint: String,
    /// Translator subscription key; falls back to the language key when unset.
    pub translator_api_key: Option<String>,
    /// Translator resource region, required for regional and multi-service keys.
    pub translator_region: Option<String>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let job_timeout_minutes = load_env_optional("LANGUAGE_JOB_TIMEOUT_MINUTES")
            .map(|value| {
                value.parse::<i64>().map_err(|_| {
                    ConfigError::InvalidValue("LANGUAGE_JOB_TIMEOUT_MINUTES".to_string())
                })
            })
            .transpose()?
            .filter(|minutes| *minutes > 0)
            .map(|minutes| minutes as u64)
            .unwrap_or(DEFAULT_JOB_TIMEOUT_MINUTES);

        Ok(Self {
            language_endpoint: load_env("LANGUAGE_ENDPOINT")?,
            language_api_key: load_env("LANGUAGE_API_KEY")?,
            language_api_version: load_env_optional("LANGUAGE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            job_timeout_minutes,
            poll_interval_ms: load_env_optional("LANGUAGE_POLL_INTERVAL_MS")
                .map(|value| {
                    value.parse().map_err(|_| {
                        ConfigError::InvalidValue("LANGUAGE_POLL_INTERVAL_MS".into())
                    })
                })
                .transpose()?
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            question_answering_project: load_env_optional("QUESTION_ANSWERING_PROJECT"),
            question_answering_deployment: load_env_optional("QUESTION_ANSWERING_DEPLOYMENT"),
            conversation_project: load_env_optional("CONVERSATION_PROJECT"),
            conversation_deployment: load_env_optional("CONVERSATION_DEPLOYMENT"),
            translator_endpoint: load_env_optional("TRANSLATOR_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_TRANSLATOR_ENDPOINT.to_string()),
            translator_api_key: load_env_optional("TRANSLATOR_API_KEY"),
            translator_region: load_env_optional("TRANSLATOR_REGION"),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Deadline applied to a whole polling session.
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_minutes.saturating_mul(60))
    }

    /// Delay between two status polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        endpoint = %config.language_endpoint,
        api_version = %config.language_api_version,
        job_timeout_minutes = config.job_timeout_minutes,
        poll_interval_ms = config.poll_interval_ms,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
pub(crate) fn test_config(endpoint: &str) -> Config {
    Config {
        language_endpoint: endpoint.to_string(),
        language_api_key: "test-key".into(),
        language_api_version: DEFAULT_API_VERSION.into(),
        job_timeout_minutes: DEFAULT_JOB_TIMEOUT_MINUTES,
        poll_interval_ms: 20,
        question_answering_project: Some("faq".into()),
        question_answering_deployment: Some("production".into()),
        conversation_project: Some("travel".into()),
        conversation_deployment: Some("production".into()),
        translator_endpoint: endpoint.to_string(),
        translator_api_key: None,
        translator_region: Some("westeurope".into()),
        server_port: None,
    }
}
