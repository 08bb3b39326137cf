//! GeminiProvider -- concrete [`ChatProvider`] for the backup tier.
//!
//! Sends requests to the Gemini `generateContent` API. Gemini uses a
//! different turn-taking convention than the primary tier: roles are
//! `user`/`model`, the history must start with a user turn, and model
//! turns must not be consecutive. [`to_gemini_contents`] performs that
//! translation and repairs histories that violate it (rather than
//! failing on conversations malformed by earlier partial failures).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use yasmin_core::resolver::ChatProvider;
use yasmin_types::chat::MessageRole;
use yasmin_types::config::BACKUP_MODEL;
use yasmin_types::llm::{ChatTurn, CompletionRequest, ProviderError};

/// Fixed request timeout for the backup tier.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini chat provider.
///
/// Implements [`ChatProvider`] against the native `generateContent`
/// endpoint. The model id is fixed ([`BACKUP_MODEL`]) -- the client's
/// model selection only applies to the primary tier.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Translate primary-tier history into Gemini's turn-taking convention.
///
/// - `user` stays `user`, `assistant` becomes `model`
/// - leading model turns are dropped (Gemini requires user first)
/// - consecutive model turns are collapsed to the first
///
/// Fails with `InvalidRequest` when the history contains no user turn.
fn to_gemini_contents(turns: &[ChatTurn]) -> Result<Vec<GeminiContent>, ProviderError> {
    let mut contents: Vec<GeminiContent> = Vec::new();

    for turn in turns {
        let role = match turn.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };

        if role == "model" && contents.is_empty() {
            tracing::debug!("Dropping leading model turn for Gemini compatibility");
            continue;
        }
        if role == "model" && contents.last().is_some_and(|c| c.role == "model") {
            tracing::debug!("Dropping consecutive model turn for Gemini compatibility");
            continue;
        }

        contents.push(GeminiContent {
            role: role.to_string(),
            parts: vec![GeminiPart {
                text: turn.content.clone(),
            }],
        });
    }

    if contents.is_empty() {
        return Err(ProviderError::InvalidRequest(
            "history contains no user turns".to_string(),
        ));
    }

    Ok(contents)
}

impl GeminiProvider {
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: BACKUP_MODEL.to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = GeminiRequest {
            contents: to_gemini_contents(&request.messages)?,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        tracing::debug!(
            parts = body.contents.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.expose_secret())])
            .header("content-type", "application/json")
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

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Deserialization(e.to_string()))?;

        if parsed.candidates.is_empty() {
            if let Some(reason) = parsed
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
            {
                return Err(ProviderError::InvalidRequest(format!(
                    "reply blocked by safety filter: {reason}"
                )));
            }
            return Err(ProviderError::Deserialization(
                "response missing candidates".to_string(),
            ));
        }

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
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
