//! BoxChatProvider -- object-safe dynamic dispatch wrapper for ChatProvider.
//!
//! 1. Define an object-safe `ChatProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ChatProviderDyn` for all `T: ChatProvider`
//! 3. `BoxChatProvider` wraps `Box<dyn ChatProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use yasmin_types::llm::{CompletionRequest, ProviderError};

use super::provider::ChatProvider;

/// Object-safe version of [`ChatProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch
/// (`dyn ChatProviderDyn`). A blanket implementation is provided for all
/// types implementing `ChatProvider`.
pub trait ChatProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>>;
}

/// Blanket implementation: any `ChatProvider` automatically implements `ChatProviderDyn`.
impl<T: ChatProvider> ChatProviderDyn for T {
    fn name(&self) -> &str {
        ChatProvider::name(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased chat provider for runtime tier configuration.
///
/// Since `ChatProvider` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxChatProvider` provides equivalent methods that delegate
/// to the inner `ChatProviderDyn` trait object.
pub struct BoxChatProvider {
    inner: Box<dyn ChatProviderDyn + Send + Sync>,
}

impl BoxChatProvider {
    /// Wrap a concrete `ChatProvider` in a type-erased box.
    pub fn new<T: ChatProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a completion request and receive the reply text.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.inner.complete_boxed(request).await
    }
}
