//! Chat API transport.
//!
//! `ChatApi` is the seam between the conversation session and the
//! network; `HttpChatApi` implements it against the server's JSON
//! surface. Tests drive the session through scripted fakes instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use yasmin_types::chat::{Conversation, ConversationSummary};
use yasmin_types::error::ClientError;
use yasmin_types::llm::ChatTurn;

/// Generation parameters carried on send and regenerate.
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: yasmin_types::config::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

/// Reply to a chat turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    /// Conversation id -- newly created when the request carried none.
    pub id: Uuid,
    pub content: String,
    pub used_backup: bool,
}

/// Reply to a regeneration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegeneratedReply {
    pub content: String,
    pub used_backup: bool,
}

/// Transport trait for the chat API.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The
/// session is generic over this trait so its state machine can be tested
/// without a server.
pub trait ChatApi: Send + Sync {
    fn send_chat(
        &self,
        history: &[ChatTurn],
        conversation_id: Option<Uuid>,
        params: &ChatParams,
    ) -> impl std::future::Future<Output = Result<ChatReply, ClientError>> + Send;

    fn regenerate(
        &self,
        conversation_id: Uuid,
        params: &ChatParams,
    ) -> impl std::future::Future<Output = Result<RegeneratedReply, ClientError>> + Send;

    fn list_conversations(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, ClientError>> + Send;

    fn get_conversation(
        &self,
        conversation_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Conversation, ClientError>> + Send;

    fn rename_conversation(
        &self,
        conversation_id: Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), ClientError>> + Send;

    fn delete_conversation(
        &self,
        conversation_id: Uuid,
    ) -> impl std::future::Future<Output = Result<(), ClientError>> + Send;
}

/// HTTP implementation of [`ChatApi`].
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    history: &'a [ChatTurn],
    conversation_id: Option<Uuid>,
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct RegenerateRequestBody<'a> {
    conversation_id: Uuid,
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl HttpChatApi {
    /// Create a transport against the given server base URL
    /// (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-2xx response into [`ClientError::Api`] with the
    /// server's `error` message when present.
    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("HTTP {status}"));
        ClientError::Api { status, message }
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

impl ChatApi for HttpChatApi {
    async fn send_chat(
        &self,
        history: &[ChatTurn],
        conversation_id: Option<Uuid>,
        params: &ChatParams,
    ) -> Result<ChatReply, ClientError> {
        let body = ChatRequestBody {
            history,
            conversation_id,
            model: &params.model,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response.json().await.map_err(transport_error)
    }

    async fn regenerate(
        &self,
        conversation_id: Uuid,
        params: &ChatParams,
    ) -> Result<RegeneratedReply, ClientError> {
        let body = RegenerateRequestBody {
            conversation_id,
            model: &params.model,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(self.url("/api/regenerate"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response.json().await.map_err(transport_error)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/conversations"))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response.json().await.map_err(transport_error)
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Conversation, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/conversations/{conversation_id}")))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response.json().await.map_err(transport_error)
    }

    async fn rename_conversation(
        &self,
        conversation_id: Uuid,
        title: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/api/conversations/{conversation_id}/title")))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: Uuid) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/conversations/{conversation_id}")))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(())
    }
}
