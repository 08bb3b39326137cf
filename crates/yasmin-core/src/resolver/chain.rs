//! Two-tier provider fallback chain with an offline terminal tier.
//!
//! Requests are tried against the primary provider, then the backup
//! provider, in strict order, stopping at the first success. Tier
//! failures are logged with their cause and absorbed; the offline table
//! answers when both providers fail, so resolution as a whole never
//! fails.

use yasmin_types::llm::{CompletionRequest, ReplySource, ResolvedReply};

use super::box_provider::BoxChatProvider;
use super::offline::OfflineReplies;

/// Routes chat requests through primary -> backup -> offline.
///
/// An unconfigured credential simply removes that tier from the chain;
/// the offline tier is always present. The resolver performs no
/// persistence and holds no per-request state.
pub struct ResponseResolver {
    primary: Option<BoxChatProvider>,
    backup: Option<BoxChatProvider>,
    offline: OfflineReplies,
}

impl ResponseResolver {
    /// Create a resolver from the configured provider tiers.
    pub fn new(primary: Option<BoxChatProvider>, backup: Option<BoxChatProvider>) -> Self {
        Self {
            primary,
            backup,
            offline: OfflineReplies::new(),
        }
    }

    /// True when at least one network tier is configured.
    pub fn has_network_tier(&self) -> bool {
        self.primary.is_some() || self.backup.is_some()
    }

    /// Resolve one reply for the given history.
    ///
    /// Tries each configured provider in order; the first 2xx response
    /// with a non-empty reply wins. HTTP errors, timeouts, connection
    /// failures, and empty replies are recorded at `warn` level and the
    /// chain proceeds. The offline tier answers from the latest user
    /// message and cannot fail.
    pub async fn resolve(&self, request: &CompletionRequest) -> ResolvedReply {
        if let Some(primary) = &self.primary {
            match primary.complete(request).await {
                Ok(content) => {
                    tracing::debug!(provider = primary.name(), "Primary provider answered");
                    return ResolvedReply {
                        content,
                        source: ReplySource::Primary,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        provider = primary.name(),
                        error = %err,
                        "Primary provider failed, trying backup"
                    );
                }
            }
        }

        if let Some(backup) = &self.backup {
            match backup.complete(request).await {
                Ok(content) => {
                    tracing::info!(provider = backup.name(), "Backup provider answered");
                    return ResolvedReply {
                        content,
                        source: ReplySource::Backup,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        provider = backup.name(),
                        error = %err,
                        "Backup provider failed, falling back to offline replies"
                    );
                }
            }
        }

        let latest_user_message = request
            .messages
            .iter()
            .rev()
            .find(|turn| turn.role == yasmin_types::chat::MessageRole::User)
            .map(|turn| turn.content.as_str())
            .unwrap_or("");

        ResolvedReply {
            content: self.offline.reply_for(latest_user_message).to_string(),
            source: ReplySource::Offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::provider::ChatProvider;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use yasmin_types::llm::{ChatTurn, ProviderError};

    // --- Mock providers ---

    struct MockProvider {
        name: String,
        reply: Result<String, MockError>,
        calls: Arc<AtomicU32>,
    }

    #[derive(Clone)]
    enum MockError {
        Http(u16),
        Timeout,
        Empty,
    }

    impl MockProvider {
        fn ok(name: &str, reply: &str) -> Self {
            Self {
                name: name.to_string(),
                reply: Ok(reply.to_string()),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(name: &str, error: MockError) -> Self {
            Self {
                name: name.to_string(),
                reply: Err(error),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn call_counter(&self) -> Arc<AtomicU32> {
            self.calls.clone()
        }
    }

    impl ChatProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> impl Future<Output = Result<String, ProviderError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            async move {
                match reply {
                    Ok(text) => Ok(text),
                    Err(MockError::Http(status)) => Err(ProviderError::Http {
                        status,
                        body: "upstream error".to_string(),
                    }),
                    Err(MockError::Timeout) => Err(ProviderError::Timeout),
                    Err(MockError::Empty) => Err(ProviderError::EmptyReply),
                }
            }
        }
    }

    fn request_with(user_text: &str) -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            messages: vec![ChatTurn::user(user_text)],
            temperature: 0.7,
            max_tokens: 512,
        }
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_primary_succeeds() {
        let resolver = ResponseResolver::new(
            Some(BoxChatProvider::new(MockProvider::ok("primary", "أهلاً"))),
            Some(BoxChatProvider::new(MockProvider::ok("backup", "wrong"))),
        );

        let reply = resolver.resolve(&request_with("مرحبا")).await;
        assert_eq!(reply.content, "أهلاً");
        assert_eq!(reply.source, ReplySource::Primary);
    }

    #[tokio::test]
    async fn test_fallback_to_backup_never_offline() {
        let resolver = ResponseResolver::new(
            Some(BoxChatProvider::new(MockProvider::failing(
                "primary",
                MockError::Http(500),
            ))),
            Some(BoxChatProvider::new(MockProvider::ok(
                "backup",
                "رد من النموذج الاحتياطي",
            ))),
        );

        let reply = resolver.resolve(&request_with("مرحبا")).await;
        assert_eq!(reply.content, "رد من النموذج الاحتياطي");
        assert_eq!(reply.source, ReplySource::Backup);
    }

    #[tokio::test]
    async fn test_both_fail_falls_to_offline_table() {
        let resolver = ResponseResolver::new(
            Some(BoxChatProvider::new(MockProvider::failing(
                "primary",
                MockError::Timeout,
            ))),
            Some(BoxChatProvider::new(MockProvider::failing(
                "backup",
                MockError::Http(503),
            ))),
        );

        let reply = resolver.resolve(&request_with("السلام عليكم")).await;
        assert_eq!(reply.source, ReplySource::Offline);
        assert!(reply.content.contains("وعليكم السلام"));
    }

    #[tokio::test]
    async fn test_both_fail_unknown_phrase_gets_apology() {
        let resolver = ResponseResolver::new(
            Some(BoxChatProvider::new(MockProvider::failing(
                "primary",
                MockError::Empty,
            ))),
            None,
        );

        let reply = resolver.resolve(&request_with("سؤال معقد جداً")).await;
        assert_eq!(reply.source, ReplySource::Offline);
        assert!(!reply.content.is_empty());
    }

    #[tokio::test]
    async fn test_no_credentials_resolves_offline() {
        let resolver = ResponseResolver::new(None, None);
        assert!(!resolver.has_network_tier());

        let reply = resolver.resolve(&request_with("مرحبا")).await;
        assert_eq!(reply.source, ReplySource::Offline);
    }

    #[tokio::test]
    async fn test_backup_not_called_when_primary_succeeds() {
        let backup = MockProvider::ok("backup", "unused");
        let backup_calls = backup.call_counter();

        let resolver = ResponseResolver::new(
            Some(BoxChatProvider::new(MockProvider::ok("primary", "رد"))),
            Some(BoxChatProvider::new(backup)),
        );

        resolver.resolve(&request_with("مرحبا")).await;
        assert_eq!(backup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_offline_uses_latest_user_turn() {
        let resolver = ResponseResolver::new(None, None);

        let request = CompletionRequest {
            model: "test-model".to_string(),
            messages: vec![
                ChatTurn::user("مرحبا"),
                ChatTurn::assistant("أهلاً بك"),
                ChatTurn::user("شكرا"),
            ],
            temperature: 0.7,
            max_tokens: 512,
        };

        let reply = resolver.resolve(&request).await;
        assert!(reply.content.contains("على الرحب والسعة"));
    }
}
