//! Text translation backed by the translator REST API.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TRANSLATOR_API_VERSION: &str = "3.0";

/// Errors surfaced while translating text.
#[derive(Debug, Error)]
pub enum TranslatorError {
    /// Caller supplied no usable target language.
    #[error("At least one target language is required")]
    NoTargetLanguage,
    /// No subscription key is available for the translator.
    #[error("Translator API key is not configured")]
    MissingApiKey,
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Translator answered with a non-success status.
    #[error("Translator request failed ({status}): {message}")]
    Api {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Error message from the body, or the raw body.
        message: String,
    },
}

/// One translation of the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Translated text.
    pub text: String,
    /// Target language code.
    pub to: String,
}

/// Interface implemented by translation backends.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into every language of `targets`; `source` disables auto detection.
    ///
    /// Returns one list of translations per input text.
    async fn translate(
        &self,
        text: &str,
        targets: &[String],
        source: Option<&str>,
    ) -> Result<Vec<Vec<Translation>>, TranslatorError>;
}

/// Translator REST client.
pub struct TranslatorClient {
    http: Client,
    endpoint: String,
    api_key: String,
    region: Option<String>,
}

impl TranslatorClient {
    /// Build a client against `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        region: Option<String>,
    ) -> Result<Self, TranslatorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TranslatorError::MissingApiKey);
        }
        let http = Client::builder()
            .user_agent(concat!("language-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            region,
        })
    }

    /// Build a client from configuration; the language key is used when no translator key is set.
    pub fn from_config(config: &Config) -> Result<Self, TranslatorError> {
        let api_key = config
            .translator_api_key
            .clone()
            .unwrap_or_else(|| config.language_api_key.clone());
        Self::new(
            config.translator_endpoint.clone(),
            api_key,
            config.translator_region.clone(),
        )
    }
}

#[derive(Serialize)]
struct TranslateInput<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Deserialize)]
struct TranslatedItem {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Translator for TranslatorClient {
    async fn translate(
        &self,
        text: &str,
        targets: &[String],
        source: Option<&str>,
    ) -> Result<Vec<Vec<Translation>>, TranslatorError> {
        let targets: Vec<&str> = targets
            .iter()
            .map(|target| target.trim())
            .filter(|target| !target.is_empty())
            .collect();
        if targets.is_empty() {
            return Err(TranslatorError::NoTargetLanguage);
        }

        let mut query: Vec<(&str, &str)> = vec![("api-version", TRANSLATOR_API_VERSION)];
        query.extend(targets.iter().map(|target| ("to", *target)));
        if let Some(source) = source.map(str::trim).filter(|source| !source.is_empty()) {
            query.push(("from", source));
        }

        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut request = self
            .http
            .post(format!("{}/translate", self.endpoint.trim_end_matches('/')))
            .query(&query)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("X-ClientTraceId", &trace_id)
            .json(&[TranslateInput { text }]);
        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            let error = TranslatorError::Api { status, message };
            tracing::error!(trace_id = %trace_id, error = %error, "Translation failed");
            return Err(error);
        }

        let items: Vec<TranslatedItem> = response.json().await?;
        tracing::debug!(
            trace_id = %trace_id,
            targets = targets.len(),
            "Translation completed"
        );
        Ok(items.into_iter().map(|item| item.translations).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn translate_sends_targets_and_region() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/translate")
                    .query_param("api-version", "3.0")
                    .query_param("to", "fr")
                    .query_param("to", "de")
                    .query_param("from", "en")
                    .header("ocp-apim-subscription-key", "translator-key")
                    .header("ocp-apim-subscription-region", "westeurope")
                    .header_exists("x-clienttraceid")
                    .json_body(json!([{ "Text": "Hello" }]));
                then.status(200).json_body(json!([{
                    "translations": [
                        { "text": "Bonjour", "to": "fr" },
                        { "text": "Hallo", "to": "de" }
                    ]
                }]));
            })
            .await;

        let client = TranslatorClient::new(
            server.base_url(),
            "translator-key",
            Some("westeurope".into()),
        )
        .expect("client");
        let translations = client
            .translate("Hello", &["fr".into(), "de".into()], Some("en"))
            .await
            .expect("translation succeeds");

        mock.assert_async().await;
        assert_eq!(
            translations,
            vec![vec![
                Translation {
                    text: "Bonjour".into(),
                    to: "fr".into()
                },
                Translation {
                    text: "Hallo".into(),
                    to: "de".into()
                },
            ]]
        );
    }

    #[tokio::test]
    async fn api_errors_carry_service_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/translate");
                then.status(400).json_body(json!({
                    "error": { "code": 400036, "message": "The target language is not valid." }
                }));
            })
            .await;

        let client = TranslatorClient::new(server.base_url(), "key", None).expect("client");
        let err = client
            .translate("Hello", &["xx".into()], None)
            .await
            .expect_err("invalid target");
        assert_eq!(
            err.to_string(),
            "Translator request failed (400 Bad Request): The target language is not valid."
        );
    }

    #[tokio::test]
    async fn blank_targets_are_rejected_before_sending() {
        let client = TranslatorClient::new("http://127.0.0.1:1", "key", None).expect("client");
        let err = client
            .translate("Hello", &["  ".into()], None)
            .await
            .expect_err("no target");
        assert!(matches!(err, TranslatorError::NoTargetLanguage));
    }
}
