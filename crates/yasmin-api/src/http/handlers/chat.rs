//! Chat turn and regeneration HTTP handlers.
//!
//! Endpoints:
//! - POST /api/chat       - Persist a user turn and resolve one reply
//! - POST /api/regenerate - Replace the latest assistant reply

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use yasmin_core::chat::{RegenerateInput, SendTurnInput};
use yasmin_types::config::DEFAULT_MODEL;
use yasmin_types::llm::ChatTurn;

use crate::http::error::AppError;
use crate::state::AppState;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

/// Request body for POST /api/chat.
///
/// `history` includes the new user message as its last entry;
/// `conversation_id` is null for an unsaved new conversation.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Response body for POST /api/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Conversation id, created when the request carried none.
    pub id: Uuid,
    pub content: String,
    pub used_backup: bool,
}

/// POST /api/chat - Handle one user turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let output = state
        .chat_service
        .send_turn(SendTurnInput {
            history: body.history,
            conversation_id: body.conversation_id,
            model: body.model,
            temperature: body.temperature,
            max_tokens: body.max_tokens,
        })
        .await?;

    Ok(Json(ChatResponse {
        id: output.conversation_id,
        content: output.content,
        used_backup: output.source.used_backup(),
    }))
}

/// Request body for POST /api/regenerate.
#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub conversation_id: Uuid,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Response body for POST /api/regenerate.
#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub content: String,
    pub used_backup: bool,
}

/// POST /api/regenerate - Replace the latest assistant reply.
pub async fn regenerate(
    State(state): State<AppState>,
    Json(body): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, AppError> {
    let output = state
        .chat_service
        .regenerate(RegenerateInput {
            conversation_id: body.conversation_id,
            model: body.model,
            temperature: body.temperature,
            max_tokens: body.max_tokens,
        })
        .await?;

    Ok(Json(RegenerateResponse {
        content: output.content,
        used_backup: output.source.used_backup(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_defaults() {
        let body: ChatRequest = serde_json::from_str(
            r#"{"history": [{"role": "user", "content": "مرحبا"}], "conversation_id": null}"#,
        )
        .unwrap();

        assert_eq!(body.model, DEFAULT_MODEL);
        assert_eq!(body.temperature, 0.7);
        assert_eq!(body.max_tokens, 512);
        assert!(body.conversation_id.is_none());
        assert_eq!(body.history.len(), 1);
    }

    #[test]
    fn test_regenerate_request_requires_conversation_id() {
        let result = serde_json::from_str::<RegenerateRequest>(r#"{"model": "m"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_response_shape() {
        let resp = ChatResponse {
            id: Uuid::now_v7(),
            content: "أهلاً".to_string(),
            used_backup: true,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("id").is_some());
        assert_eq!(json["used_backup"], true);
    }
}
