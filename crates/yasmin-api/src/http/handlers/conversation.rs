//! Conversation CRUD HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/conversations            - List summaries, newest first
//! - GET    /api/conversations/{id}       - Full conversation with messages
//! - PUT    /api/conversations/{id}/title - Rename
//! - DELETE /api/conversations/{id}       - Delete (cascades to messages)

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use yasmin_types::chat::{Conversation, ConversationSummary};

use crate::http::error::AppError;
use crate::state::AppState;

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("معرف غير صالح: {s}")))
}

/// GET /api/conversations - List conversations, most recently updated first.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    let summaries = state.chat_service.list_conversations().await?;
    Ok(Json(summaries))
}

/// GET /api/conversations/{id} - Get a conversation with its messages.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, AppError> {
    let id = parse_uuid(&id)?;
    let conversation = state.chat_service.get_conversation(&id).await?;
    Ok(Json(conversation))
}

/// Request body for renaming a conversation.
#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    #[serde(default)]
    pub title: String,
}

/// PUT /api/conversations/{id}/title - Rename a conversation.
pub async fn update_title(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTitleRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_uuid(&id)?;
    state.chat_service.rename_conversation(&id, &body.title).await?;
    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/conversations/{id} - Delete a conversation and its messages.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_uuid(&id)?;
    state.chat_service.delete_conversation(&id).await?;
    Ok(Json(json!({ "success": true })))
}
