//! Resolver request/reply types for Yasmin.
//!
//! These types model the data shapes flowing through the response
//! resolver: the capped conversation history sent to a provider, the
//! resolved reply, and provider-level errors.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::chat::MessageRole;

/// A single turn of conversation history sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to a chat provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Which tier of the fallback chain produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Primary,
    Backup,
    Offline,
}

impl ReplySource {
    /// `used_backup` flag as reported on the wire. Offline replies do
    /// not count as backup usage.
    pub fn used_backup(self) -> bool {
        matches!(self, ReplySource::Backup)
    }
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplySource::Primary => write!(f, "primary"),
            ReplySource::Backup => write!(f, "backup"),
            ReplySource::Offline => write!(f, "offline"),
        }
    }
}

/// A reply produced by the resolver, tagged with its source tier.
#[derive(Debug, Clone)]
pub struct ResolvedReply {
    pub content: String,
    pub source: ReplySource,
}

/// Errors from a single chat provider call.
///
/// All variants are absorbed by the resolver's fallback chain; none is
/// ever surfaced to the end user directly.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("provider returned an empty reply")]
    EmptyReply,

    #[error("failed to parse provider response: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_source_used_backup() {
        assert!(!ReplySource::Primary.used_backup());
        assert!(ReplySource::Backup.used_backup());
        assert!(!ReplySource::Offline.used_backup());
    }

    #[test]
    fn test_chat_turn_constructors() {
        let turn = ChatTurn::user("مرحبا");
        assert_eq!(turn.role, MessageRole::User);
        let turn = ChatTurn::assistant("أهلاً");
        assert_eq!(turn.role, MessageRole::Assistant);
    }

    #[test]
    fn test_completion_request_serde() {
        let req = CompletionRequest {
            model: "mistralai/mistral-7b-instruct".to_string(),
            messages: vec![ChatTurn::user("مرحبا")],
            temperature: 0.7,
            max_tokens: 512,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("mistral-7b-instruct"));
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Http {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }
}
