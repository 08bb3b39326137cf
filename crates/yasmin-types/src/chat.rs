//! Conversation and message types for Yasmin.
//!
//! These types model the durable chat data: a conversation owns an
//! ordered sequence of messages, totally ordered by `(created_at, id)`
//! with time-sortable UUIDv7 ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Placeholder title for a conversation whose first message yields none.
pub const DEFAULT_TITLE: &str = "محادثة جديدة";

/// Maximum title length accepted by rename.
pub const MAX_TITLE_CHARS: usize = 100;

/// Length of the title prefix derived from the first user message.
pub const TITLE_PREFIX_CHARS: usize = 80;

/// Role of a persisted message.
///
/// A closed two-value enum matching the CHECK constraint in the SQLite
/// schema: `CHECK (role IN ('user', 'assistant'))`. The client's
/// transient `error` display bubble is not a persisted role and lives in
/// `yasmin-client`, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single persisted message within a conversation.
///
/// Immutable once created, except that the most recent assistant message
/// of a conversation may be replaced during regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation with its ordered messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// A conversation without its messages, as listed in the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Derive a conversation title from the first user message.
///
/// Takes the first line, capped at [`TITLE_PREFIX_CHARS`] characters
/// (char-boundary safe). Falls back to [`DEFAULT_TITLE`] when the
/// message is empty or whitespace.
pub fn derive_title(first_message: &str) -> String {
    let first_line = first_message.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    first_line.chars().take(TITLE_PREFIX_CHARS).collect()
}

/// Validate a title supplied by rename.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("عنوان المحادثة مطلوب".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!(
            "العنوان يتجاوز الحد الأقصى ({MAX_TITLE_CHARS} حرفاً)"
        ));
    }
    Ok(())
}
