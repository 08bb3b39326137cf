//! Server configuration for Yasmin.
//!
//! Assembled from CLI flags and environment variables in `yasmin-api`;
//! consumed by `yasmin-infra` when wiring pools and providers. The
//! database URL is the only hard requirement -- a missing provider
//! credential just degrades the resolver to fewer fallback tiers.

use secrecy::SecretString;

/// Default model requested when the client does not name one.
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";

/// Fixed model id used by the backup provider tier.
pub const BACKUP_MODEL: &str = "gemini-2.0-flash";

/// Default cap on history turns forwarded upstream.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Runtime configuration for the Yasmin server.
pub struct ServerConfig {
    /// SQLite connection string. Startup is fatal without it.
    pub database_url: String,
    /// Primary provider credential (OpenRouter). Optional.
    pub primary_api_key: Option<SecretString>,
    /// Backup provider credential (Gemini). Optional.
    pub backup_api_key: Option<SecretString>,
    /// Public base URL, sent as the attribution referer to the primary provider.
    pub app_url: String,
    /// Display title, sent as the attribution title to the primary provider.
    pub app_title: String,
    /// Maximum history turns forwarded to a provider per request.
    pub history_limit: usize,
}

impl ServerConfig {
    /// True when at least one provider credential is configured.
    pub fn has_any_provider(&self) -> bool {
        self.primary_api_key.is_some() || self.backup_api_key.is_some()
    }
}
