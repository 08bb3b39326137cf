//! ChatProvider trait definition.
//!
//! This is the abstraction the resolver chain routes through. Uses
//! native async fn in traits (RPITIT, Rust 2024 edition); the
//! `BoxChatProvider` wrapper restores object safety where tiers are
//! selected at runtime.
//!
//! Implementations live in yasmin-infra (e.g., `OpenRouterProvider`).

use yasmin_types::llm::{CompletionRequest, ProviderError};

/// Trait for upstream chat providers.
///
/// A provider takes the full (capped) history and returns exactly one
/// reply string. An empty or whitespace-only reply must be reported as
/// [`ProviderError::EmptyReply`], never as success.
pub trait ChatProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openrouter", "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the reply text.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<String, ProviderError>> + Send;
}
