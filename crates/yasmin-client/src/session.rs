//! Conversation session state machine.
//!
//! One owned `ConversationSession` replaces the scattered module-level
//! state of a typical widget (current conversation id, typing flag,
//! message array): all UI callbacks mutate it through named transitions.
//! The core concurrency invariant lives here -- exactly one request may
//! be in flight, and every transition returns the session to `Idle` on
//! both success and failure.

use chrono::Utc;
use uuid::Uuid;

use yasmin_types::chat::{derive_title, ConversationSummary, MessageRole};
use yasmin_types::error::ClientError;
use yasmin_types::llm::ChatTurn;

use crate::api::{ChatApi, ChatParams};
use crate::matcher;

/// Welcome bubble seeded into every new conversation. Display-only,
/// never persisted and never part of the history sent upstream.
pub const WELCOME_MESSAGE: &str =
    "السلام عليكم! أنا ياسمين، مساعدتك الرقمية. كيف يمكنني مساعدتك اليوم؟";

/// Shown instead of calling the network when the browser is offline.
pub const OFFLINE_MESSAGE: &str =
    "أعتذر، لا يوجد اتصال بالإنترنت حاليًا. لا يمكنني معالجة طلبك الآن.";

const SEND_ERROR: &str = "فشل إرسال الرسالة.";
const REGENERATE_ERROR: &str = "فشل إعادة توليد الرد.";
const LOAD_ERROR: &str = "فشل تحميل المحادثة.";
const LIST_ERROR: &str = "فشل تحميل المحادثات.";

/// Turns from the view kept when building the upstream history.
const HISTORY_WINDOW: usize = 10;

/// Whether a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Busy,
}

/// Display role of a message bubble. `Error` is client-only and never
/// persisted or sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRole {
    User,
    Assistant,
    Error,
}

/// One bubble in the conversation view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub role: ViewRole,
    pub content: String,
    /// Whether this bubble participates in the history sent upstream.
    /// False for the welcome bubble, offline notices, and error bubbles.
    pub in_history: bool,
}

impl MessageView {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: ViewRole::User,
            content: content.into(),
            in_history: true,
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ViewRole::Assistant,
            content: content.into(),
            in_history: true,
        }
    }

    /// Assistant-role display bubble excluded from history (welcome
    /// message, offline notice).
    fn transient_assistant(content: impl Into<String>) -> Self {
        Self {
            role: ViewRole::Assistant,
            content: content.into(),
            in_history: false,
        }
    }

    fn error(content: impl Into<String>) -> Self {
        Self {
            role: ViewRole::Error,
            content: content.into(),
            in_history: false,
        }
    }
}

/// How a `send` was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server answered and both turns are persisted.
    Sent,
    /// The predefined matcher answered; no network, nothing persisted.
    Canned,
    /// The offline notice was shown; no network, nothing persisted.
    Offline,
    /// The request failed; an error bubble was appended.
    Failed,
    /// Empty input, nothing happened.
    Ignored,
}

/// How a `regenerate` was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerateOutcome {
    /// The latest reply was replaced.
    Regenerated,
    /// The request failed; the removed reply was restored unchanged.
    Restored,
    /// Nothing to regenerate.
    Ignored,
}

/// The active conversation and its sidebar list, as one owned state
/// machine over a [`ChatApi`] transport.
pub struct ConversationSession<A: ChatApi> {
    api: A,
    state: SessionState,
    conversation_id: Option<Uuid>,
    messages: Vec<MessageView>,
    conversations: Vec<ConversationSummary>,
    online: bool,
    params: ChatParams,
    last_error: Option<String>,
}

impl<A: ChatApi> ConversationSession<A> {
    /// Create a session seeded with the welcome bubble.
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: SessionState::Idle,
            conversation_id: None,
            messages: vec![MessageView::transient_assistant(WELCOME_MESSAGE)],
            conversations: Vec::new(),
            online: true,
            params: ChatParams::default(),
            last_error: None,
        }
    }

    // --- Accessors ---

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation_id(&self) -> Option<Uuid> {
        self.conversation_id
    }

    pub fn messages(&self) -> &[MessageView] {
        &self.messages
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    /// The most recent operation error, for toast-style display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Mirror of the browser connectivity flag.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn set_params(&mut self, params: ChatParams) {
        self.params = params;
    }

    /// Regeneration is offered only when a saved conversation ends with
    /// an assistant reply.
    pub fn can_regenerate(&self) -> bool {
        self.conversation_id.is_some()
            && self
                .messages
                .iter()
                .rev()
                .find(|m| m.in_history)
                .is_some_and(|m| m.role == ViewRole::Assistant)
    }

    // --- Transitions ---

    /// Start a fresh unsaved conversation.
    pub fn new_conversation(&mut self) -> Result<(), ClientError> {
        self.guard_idle()?;
        self.conversation_id = None;
        self.messages = vec![MessageView::transient_assistant(WELCOME_MESSAGE)];
        self.last_error = None;
        Ok(())
    }

    /// Refresh the sidebar list from the server.
    pub async fn refresh_conversations(&mut self) -> Result<(), ClientError> {
        self.guard_idle()?;
        self.state = SessionState::Busy;
        self.last_error = None;

        let result = self.api.list_conversations().await;
        self.state = SessionState::Idle;

        match result {
            Ok(summaries) => {
                self.conversations = summaries;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(LIST_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Load a conversation, replacing the active view entirely.
    pub async fn load(&mut self, conversation_id: Uuid) -> Result<(), ClientError> {
        self.guard_idle()?;
        self.state = SessionState::Busy;
        self.last_error = None;

        let result = self.api.get_conversation(conversation_id).await;
        self.state = SessionState::Idle;

        match result {
            Ok(conversation) => {
                self.conversation_id = Some(conversation.id);
                self.messages = conversation
                    .messages
                    .iter()
                    .map(|m| match m.role {
                        MessageRole::User => MessageView::user(&m.content),
                        MessageRole::Assistant => MessageView::assistant(&m.content),
                    })
                    .collect();
                Ok(())
            }
            Err(e) => {
                self.conversation_id = None;
                self.messages = vec![MessageView::error(LOAD_ERROR)];
                self.last_error = Some(LOAD_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Send a user message.
    ///
    /// The user bubble is appended immediately so the UI never appears
    /// to eat input. The predefined matcher and the offline check both
    /// short-circuit without touching the network; canned and offline
    /// replies are never persisted.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome, ClientError> {
        self.guard_idle()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        self.last_error = None;

        self.messages.push(MessageView::user(text));

        if let Some(reply) = matcher::match_reply(text) {
            tracing::debug!("Predefined matcher answered, skipping network");
            self.messages.push(MessageView::assistant(reply));
            return Ok(SendOutcome::Canned);
        }

        if !self.online {
            self.messages
                .push(MessageView::transient_assistant(OFFLINE_MESSAGE));
            return Ok(SendOutcome::Offline);
        }

        let history = self.history_window();
        let was_unsaved = self.conversation_id.is_none();

        self.state = SessionState::Busy;
        let result = self
            .api
            .send_chat(&history, self.conversation_id, &self.params)
            .await;
        self.state = SessionState::Idle;

        match result {
            Ok(reply) => {
                if was_unsaved {
                    self.adopt_conversation(reply.id);
                }
                self.messages.push(MessageView::assistant(reply.content));
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                let message = match &e {
                    ClientError::Api { message, .. } => message.clone(),
                    _ => SEND_ERROR.to_string(),
                };
                self.messages.push(MessageView::error(message));
                Ok(SendOutcome::Failed)
            }
        }
    }

    /// Replace the latest assistant reply.
    ///
    /// The reply bubble is removed optimistically; on failure it is
    /// re-inserted unchanged, mirroring the server's rollback guarantee.
    pub async fn regenerate(&mut self) -> Result<RegenerateOutcome, ClientError> {
        self.guard_idle()?;
        let Some(conversation_id) = self.conversation_id else {
            return Ok(RegenerateOutcome::Ignored);
        };
        if !self.can_regenerate() {
            return Ok(RegenerateOutcome::Ignored);
        }
        self.last_error = None;

        // The last history-eligible bubble is the assistant reply.
        let removed_index = self
            .messages
            .iter()
            .rposition(|m| m.in_history)
            .filter(|&i| self.messages[i].role == ViewRole::Assistant);
        let Some(removed_index) = removed_index else {
            return Ok(RegenerateOutcome::Ignored);
        };
        let removed = self.messages.remove(removed_index);

        self.state = SessionState::Busy;
        let result = self.api.regenerate(conversation_id, &self.params).await;
        self.state = SessionState::Idle;

        match result {
            Ok(reply) => {
                self.messages.push(MessageView::assistant(reply.content));
                Ok(RegenerateOutcome::Regenerated)
            }
            Err(_) => {
                self.messages.insert(removed_index, removed);
                self.last_error = Some(REGENERATE_ERROR.to_string());
                Ok(RegenerateOutcome::Restored)
            }
        }
    }

    /// Rename a conversation and update the sidebar entry.
    pub async fn rename_conversation(
        &mut self,
        conversation_id: Uuid,
        title: &str,
    ) -> Result<(), ClientError> {
        self.guard_idle()?;
        self.state = SessionState::Busy;
        self.last_error = None;

        let result = self.api.rename_conversation(conversation_id, title).await;
        self.state = SessionState::Idle;

        match result {
            Ok(()) => {
                if let Some(entry) = self
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == conversation_id)
                {
                    entry.title = title.to_string();
                    entry.updated_at = Utc::now();
                }
                Ok(())
            }
            Err(e) => {
                self.last_error = Some("فشل تحديث عنوان المحادثة.".to_string());
                Err(e)
            }
        }
    }

    /// Delete a conversation; when it is the active one, reset the view
    /// to a fresh unsaved conversation.
    pub async fn delete_conversation(&mut self, conversation_id: Uuid) -> Result<(), ClientError> {
        self.guard_idle()?;
        self.state = SessionState::Busy;
        self.last_error = None;

        let result = self.api.delete_conversation(conversation_id).await;
        self.state = SessionState::Idle;

        match result {
            Ok(()) => {
                self.conversations.retain(|c| c.id != conversation_id);
                if self.conversation_id == Some(conversation_id) {
                    self.conversation_id = None;
                    self.messages = vec![MessageView::transient_assistant(WELCOME_MESSAGE)];
                }
                Ok(())
            }
            Err(e) => {
                self.last_error = Some("فشل حذف المحادثة.".to_string());
                Err(e)
            }
        }
    }

    // --- Helpers ---

    fn guard_idle(&self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Idle => Ok(()),
            SessionState::Busy => Err(ClientError::SessionBusy),
        }
    }

    /// History-eligible bubbles, capped to the most recent window.
    fn history_window(&self) -> Vec<ChatTurn> {
        let turns: Vec<ChatTurn> = self
            .messages
            .iter()
            .filter(|m| m.in_history)
            .map(|m| ChatTurn {
                role: match m.role {
                    ViewRole::User => MessageRole::User,
                    // Error bubbles are never in_history
                    _ => MessageRole::Assistant,
                },
                content: m.content.clone(),
            })
            .collect();
        let skip = turns.len().saturating_sub(HISTORY_WINDOW);
        turns.into_iter().skip(skip).collect()
    }

    /// Adopt a newly created conversation: record the id and insert a
    /// sidebar entry at the top, titled from the first user message.
    fn adopt_conversation(&mut self, id: Uuid) {
        self.conversation_id = Some(id);
        let title = self
            .messages
            .iter()
            .find(|m| m.role == ViewRole::User && m.in_history)
            .map(|m| derive_title(&m.content))
            .unwrap_or_else(|| yasmin_types::chat::DEFAULT_TITLE.to_string());
        self.conversations.insert(
            0,
            ConversationSummary {
                id,
                title,
                updated_at: Utc::now(),
            },
        );
    }

    #[cfg(test)]
    fn force_busy(&mut self) {
        self.state = SessionState::Busy;
    }
}
