//! Chat service orchestrating turn persistence and response resolution.
//!
//! `ChatService` owns the invariant "each user turn produces exactly one
//! persisted assistant turn, or none on total failure". A send commits
//! the user message before resolving, so a failed resolve never loses
//! user input; a regenerate resolves before deleting, so a failed
//! resolve never loses the previous reply.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use yasmin_types::chat::{derive_title, Conversation, ConversationSummary, MessageRole};
use yasmin_types::error::{ChatError, StoreError};
use yasmin_types::llm::{ChatTurn, CompletionRequest, ReplySource};

use crate::resolver::ResponseResolver;
use crate::store::ConversationRepository;

/// Window within which an identical trailing user message is treated as
/// a client retry rather than a new turn.
const DUPLICATE_SEND_WINDOW_SECS: i64 = 10;

/// Input for one chat turn.
#[derive(Debug, Clone)]
pub struct SendTurnInput {
    /// Prior turns including the new user message as the last entry.
    pub history: Vec<ChatTurn>,
    /// Existing conversation, or None for an unsaved new conversation.
    pub conversation_id: Option<Uuid>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Result of a successful chat turn.
#[derive(Debug, Clone)]
pub struct SendTurnOutput {
    pub conversation_id: Uuid,
    pub content: String,
    pub source: ReplySource,
}

/// Input for regenerating the latest assistant reply.
#[derive(Debug, Clone)]
pub struct RegenerateInput {
    pub conversation_id: Uuid,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Result of a successful regeneration.
#[derive(Debug, Clone)]
pub struct RegenerateOutput {
    pub content: String,
    pub source: ReplySource,
}

/// Orchestrates chat turns over a repository and the resolver chain.
///
/// Generic over `ConversationRepository` so yasmin-core never depends on
/// yasmin-infra.
pub struct ChatService<R: ConversationRepository> {
    repo: R,
    resolver: ResponseResolver,
    history_limit: usize,
}

impl<R: ConversationRepository> ChatService<R> {
    /// Create a new chat service.
    pub fn new(repo: R, resolver: ResponseResolver, history_limit: usize) -> Self {
        Self {
            repo,
            resolver,
            history_limit,
        }
    }

    /// Access the repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // --- Turn handling ---

    /// Handle one user turn: persist it, resolve a reply, persist that.
    ///
    /// A missing or stale conversation id creates a new conversation
    /// titled from the user text. The user message is committed before
    /// resolution and is retained even when resolution fails entirely.
    pub async fn send_turn(&self, input: SendTurnInput) -> Result<SendTurnOutput, ChatError> {
        let user_text = input
            .history
            .last()
            .filter(|turn| turn.role == MessageRole::User)
            .map(|turn| turn.content.trim().to_string())
            .unwrap_or_default();

        if user_text.is_empty() {
            return Err(ChatError::Validation("الرسالة فارغة".to_string()));
        }

        // Load the target conversation; a stale id behaves like a new
        // conversation rather than failing the send.
        let conversation = match input.conversation_id {
            Some(id) => match self.repo.get(&id).await {
                Ok(conversation) => conversation,
                Err(StoreError::NotFound) => {
                    warn!(conversation_id = %id, "Unknown conversation id on send, creating new");
                    self.repo.create(&derive_title(&user_text)).await?
                }
                Err(e) => return Err(e.into()),
            },
            None => {
                let conversation = self.repo.create(&derive_title(&user_text)).await?;
                info!(conversation_id = %conversation.id, "Created conversation");
                conversation
            }
        };

        if self.is_duplicate_send(&conversation, &user_text) {
            debug!(conversation_id = %conversation.id, "Skipping duplicate user message append");
        } else {
            self.repo
                .append(&conversation.id, MessageRole::User, &user_text)
                .await?;
        }

        let request = self.completion_request(&input.model, input.history, input.temperature, input.max_tokens);
        let reply = self.resolver.resolve(&request).await;

        // The offline tier makes total failure unreachable in practice,
        // but guard anyway: the user message stays, nothing else is written.
        if reply.content.trim().is_empty() {
            warn!(conversation_id = %conversation.id, "Resolver produced an empty reply");
            return Err(ChatError::Upstream("فشل توليد استجابة".to_string()));
        }

        self.repo
            .append(&conversation.id, MessageRole::Assistant, &reply.content)
            .await?;

        debug!(
            conversation_id = %conversation.id,
            source = %reply.source,
            "Turn completed"
        );

        Ok(SendTurnOutput {
            conversation_id: conversation.id,
            content: reply.content,
            source: reply.source,
        })
    }

    /// Discard the latest assistant reply and produce a new one.
    ///
    /// Resolution happens before any destructive change; the swap of old
    /// for new reply is a single repository transaction. A resolver
    /// failure therefore leaves the conversation byte-for-byte intact.
    pub async fn regenerate(&self, input: RegenerateInput) -> Result<RegenerateOutput, ChatError> {
        let conversation = self
            .repo
            .get(&input.conversation_id)
            .await
            .map_err(not_found_or_persistence)?;

        let Some(last) = conversation.messages.last() else {
            return Err(ChatError::Validation(
                "لا توجد رسائل في المحادثة".to_string(),
            ));
        };
        if last.role != MessageRole::Assistant {
            return Err(ChatError::Validation(
                "الرسالة الأخيرة ليست رد من المساعد لإعادة التوليد".to_string(),
            ));
        }
        let old_message_id = last.id;

        let history: Vec<ChatTurn> = conversation.messages
            [..conversation.messages.len() - 1]
            .iter()
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let request =
            self.completion_request(&input.model, history, input.temperature, input.max_tokens);
        let reply = self.resolver.resolve(&request).await;

        if reply.content.trim().is_empty() {
            warn!(
                conversation_id = %input.conversation_id,
                "Resolver produced an empty reply during regeneration, keeping original"
            );
            return Err(ChatError::Upstream(
                "فشل إعادة توليد الاستجابة".to_string(),
            ));
        }

        self.repo
            .replace_last_assistant_message(&input.conversation_id, &old_message_id, &reply.content)
            .await?;

        info!(
            conversation_id = %input.conversation_id,
            source = %reply.source,
            "Regenerated latest reply"
        );

        Ok(RegenerateOutput {
            content: reply.content,
            source: reply.source,
        })
    }

    // --- Store pass-throughs ---

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.repo.list().await.map_err(ChatError::from)
    }

    pub async fn get_conversation(&self, id: &Uuid) -> Result<Conversation, ChatError> {
        self.repo.get(id).await.map_err(not_found_or_persistence)
    }

    pub async fn rename_conversation(&self, id: &Uuid, title: &str) -> Result<(), ChatError> {
        self.repo.rename(id, title).await.map_err(|e| match e {
            StoreError::NotFound => ChatError::NotFound,
            StoreError::Validation(msg) => ChatError::Validation(msg),
            e => ChatError::Persistence(e),
        })
    }

    pub async fn delete_conversation(&self, id: &Uuid) -> Result<(), ChatError> {
        self.repo.delete(id).await.map_err(not_found_or_persistence)
    }

    // --- Helpers ---

    /// True when the conversation already ends with this exact user
    /// message, appended within the retry window.
    fn is_duplicate_send(&self, conversation: &Conversation, user_text: &str) -> bool {
        let Some(last) = conversation.messages.last() else {
            return false;
        };
        last.role == MessageRole::User
            && last.content == user_text
            && (Utc::now() - last.created_at).num_seconds() < DUPLICATE_SEND_WINDOW_SECS
    }

    /// Build the provider request, capping history to the configured
    /// number of most recent turns.
    fn completion_request(
        &self,
        model: &str,
        history: Vec<ChatTurn>,
        temperature: f64,
        max_tokens: u32,
    ) -> CompletionRequest {
        let skip = history.len().saturating_sub(self.history_limit);
        CompletionRequest {
            model: model.to_string(),
            messages: history.into_iter().skip(skip).collect(),
            temperature,
            max_tokens,
        }
    }
}

fn not_found_or_persistence(e: StoreError) -> ChatError {
    match e {
        StoreError::NotFound => ChatError::NotFound,
        e => ChatError::Persistence(e),
    }
}
