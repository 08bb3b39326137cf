//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `yasmin-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, RFC 3339
//! datetimes. Every mutation that touches messages also bumps the
//! conversation's `updated_at` inside the same transaction, so a crash
//! mid-mutation can never leave a dangling timestamp or a half-written
//! turn.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use yasmin_core::store::ConversationRepository;
use yasmin_types::chat::{
    validate_title, Conversation, ConversationSummary, Message, MessageRole,
};
use yasmin_types::error::StoreError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self, messages: Vec<Message>) -> Result<Conversation, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid conversation id: {e}")))?;
        Ok(Conversation {
            id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            messages,
        })
    }

    fn into_summary(self) -> Result<ConversationSummary, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid conversation id: {e}")))?;
        Ok(ConversationSummary {
            id,
            title: self.title,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid message id: {e}")))?;
        let conversation_id = Uuid::parse_str(&self.conversation_id)
            .map_err(|e| StoreError::Query(format!("invalid conversation_id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| StoreError::Query(e))?;

        Ok(Message {
            id,
            conversation_id,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_error(e: sqlx::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// ConversationRepository implementation
// ---------------------------------------------------------------------------

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, title: &str) -> Result<Conversation, StoreError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::now_v7(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        };

        sqlx::query(
            "INSERT INTO conversations (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(conversation)
    }

    async fn append(
        &self,
        conversation_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // FK violation means the conversation is gone
            if e.to_string().contains("FOREIGN KEY") {
                StoreError::NotFound
            } else {
                query_error(e)
            }
        })?;

        let result = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&message.created_at))
            .bind(conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await.map_err(query_error)?;

        Ok(message)
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, created_at, updated_at FROM conversations ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let conv_row = ConversationRow::from_row(row).map_err(query_error)?;
            summaries.push(conv_row.into_summary()?);
        }

        Ok(summaries)
    }

    async fn get(&self, conversation_id: &Uuid) -> Result<Conversation, StoreError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let conv_row = match row {
            Some(row) => ConversationRow::from_row(&row).map_err(query_error)?,
            None => return Err(StoreError::NotFound),
        };

        let message_rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(message_rows.len());
        for row in &message_rows {
            let msg_row = MessageRow::from_row(row).map_err(query_error)?;
            messages.push(msg_row.into_message()?);
        }

        conv_row.into_conversation(messages)
    }

    async fn rename(&self, conversation_id: &Uuid, title: &str) -> Result<(), StoreError> {
        validate_title(title).map_err(StoreError::Validation)?;

        let result = sqlx::query("UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(format_datetime(&Utc::now()))
            .bind(conversation_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, conversation_id: &Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_last_assistant_message(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Message>, StoreError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let exists = sqlx::query("SELECT id FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;
        if exists.is_none() {
            return Err(StoreError::NotFound);
        }

        let row = sqlx::query(
            r#"SELECT * FROM messages
               WHERE conversation_id = ? AND role = 'assistant'
               ORDER BY created_at DESC, id DESC LIMIT 1"#,
        )
        .bind(conversation_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let message = MessageRow::from_row(&row).map_err(query_error)?.into_message()?;

        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(Some(message))
    }

    async fn replace_last_assistant_message(
        &self,
        conversation_id: &Uuid,
        old_message_id: &Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let deleted = sqlx::query(
            "DELETE FROM messages WHERE id = ? AND conversation_id = ? AND role = 'assistant'",
        )
        .bind(old_message_id.to_string())
        .bind(conversation_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: *conversation_id,
            role: MessageRole::Assistant,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&message.created_at))
            .bind(conversation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(message)
    }

    async fn message_count(&self, conversation_id: &Uuid) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let count: i64 = row.try_get("cnt").map_err(query_error)?;
        Ok(count as u64)
    }
}
