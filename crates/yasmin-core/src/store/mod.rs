//! ConversationRepository trait definition.
//!
//! CRUD plus the regeneration-specific operations over conversations and
//! their messages. Uses native async fn in traits (RPITIT, Rust 2024
//! edition); implementations live in yasmin-infra
//! (e.g., `SqliteConversationRepository`).
//!
//! Every mutating operation bumps the conversation's `updated_at` and is
//! transactional: either the whole mutation is visible or none of it.

use uuid::Uuid;
use yasmin_types::chat::{Conversation, ConversationSummary, Message, MessageRole};
use yasmin_types::error::StoreError;

/// Repository trait for conversation and message persistence.
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation with the given title.
    fn create(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Conversation, StoreError>> + Send;

    /// Append a message, bumping the conversation's `updated_at` in the
    /// same transaction. Fails with NotFound for an unknown conversation.
    fn append(
        &self,
        conversation_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Message, StoreError>> + Send;

    /// List conversation summaries, most recently updated first.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, StoreError>> + Send;

    /// Get a conversation with its ordered messages.
    fn get(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Conversation, StoreError>> + Send;

    /// Rename a conversation. Fails with Validation on an empty or
    /// over-long title, NotFound for an unknown conversation.
    fn rename(
        &self,
        conversation_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a conversation and (by cascade) its messages. Fails with
    /// NotFound when absent -- callers decide whether to report or ignore.
    fn delete(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove the most recent assistant message, scanning from the end.
    ///
    /// Returns the removed message, or `None` when the conversation has
    /// no assistant message. Never touches user messages or earlier
    /// assistant messages. Used only by regeneration.
    fn delete_last_assistant_message(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Message>, StoreError>> + Send;

    /// Atomically swap the most recent assistant message for a new one.
    ///
    /// Deletes the row identified by `old_message_id` (which must be the
    /// conversation's last assistant message) and inserts the new
    /// content in a single transaction, so a failure at any step leaves
    /// the conversation untouched.
    fn replace_last_assistant_message(
        &self,
        conversation_id: &Uuid,
        old_message_id: &Uuid,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Message, StoreError>> + Send;

    /// Number of messages in a conversation.
    fn message_count(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
