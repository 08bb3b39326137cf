//! OpenRouterProvider -- concrete [`ChatProvider`] for the primary tier.
//!
//! Sends requests to the OpenRouter chat completions API
//! (`/api/v1/chat/completions`) with Bearer authentication and the
//! attribution headers OpenRouter expects (`HTTP-Referer`, `X-Title`).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use yasmin_core::resolver::ChatProvider;
use yasmin_types::llm::{ChatTurn, CompletionRequest, ProviderError};

/// Fixed request timeout for the primary tier.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// OpenRouter chat provider.
///
/// Implements [`ChatProvider`] for the OpenRouter completions API.
///
/// # API Key Security
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing the Authorization header. The struct intentionally does
/// NOT derive Debug.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    app_url: String,
    app_title: String,
}

#[derive(Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    choices: Vec<OpenRouterChoice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Deserialize)]
struct OpenRouterMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider.
    ///
    /// `app_url` and `app_title` are sent as the `HTTP-Referer` and
    /// `X-Title` attribution headers.
    pub fn new(api_key: SecretString, app_url: String, app_title: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://openrouter.ai".to_string(),
            app_url,
            app_title,
        }
    }

    /// Override the base URL (useful for testing or proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self) -> String {
        format!("{}/api/v1/chat/completions", self.base_url)
    }
}

impl ChatProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = OpenRouterRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            model = %request.model,
            history_len = request.messages.len(),
            "Sending request to OpenRouter"
        );

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OpenRouterResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Deserialization(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            tracing::info!(%usage, "OpenRouter usage");
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyReply);
        }

        Ok(content)
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> OpenRouterProvider {
        OpenRouterProvider::new(
            SecretString::from("test-key-not-real"),
            "http://localhost:5000".to_string(),
            "Yasmin GPT Chat".to_string(),
        )
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(make_provider().name(), "openrouter");
    }

    #[test]
    fn test_url_building() {
        let provider = make_provider().with_base_url("http://localhost:8080".to_string());
        assert_eq!(provider.url(), "http://localhost:8080/api/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest {
            model: "mistralai/mistral-7b-instruct".to_string(),
            messages: vec![ChatTurn::user("مرحبا"), ChatTurn::assistant("أهلاً")],
            temperature: 0.7,
            max_tokens: 512,
        };
        let body = OpenRouterRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "mistralai/mistral-7b-instruct");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "أهلاً بك"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: OpenRouterResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("أهلاً بك")
        );
        assert!(parsed.usage.is_some());
    }

    #[test]
    fn test_response_without_choices_parses_empty() {
        let parsed: OpenRouterResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
