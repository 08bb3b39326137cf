//! Concrete `ChatProvider` implementations and resolver wiring.

pub mod gemini;
pub mod openrouter;

use secrecy::SecretString;

use yasmin_core::resolver::{BoxChatProvider, ResponseResolver};

use self::gemini::GeminiProvider;
use self::openrouter::OpenRouterProvider;

/// Wire the resolver chain from the configured credentials.
///
/// A missing credential removes that tier; the offline tier is always
/// present, so this never fails.
pub fn build_resolver(
    primary_api_key: Option<SecretString>,
    backup_api_key: Option<SecretString>,
    app_url: &str,
    app_title: &str,
) -> ResponseResolver {
    let primary = primary_api_key.map(|key| {
        BoxChatProvider::new(OpenRouterProvider::new(key, app_url.to_string(), app_title.to_string()))
    });
    if primary.is_none() {
        tracing::warn!("No primary provider credential configured");
    }

    let backup = backup_api_key.map(|key| BoxChatProvider::new(GeminiProvider::new(key)));
    if backup.is_none() {
        tracing::warn!("No backup provider credential configured");
    }

    ResponseResolver::new(primary, backup)
}
