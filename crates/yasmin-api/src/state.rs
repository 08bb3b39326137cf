//! Application state wiring the store and resolver into the chat service.
//!
//! `AppState` pins the generic `ChatService` to the concrete SQLite
//! repository and the configured provider chain.

use std::sync::Arc;

use yasmin_core::chat::ChatService;
use yasmin_infra::llm::build_resolver;
use yasmin_infra::sqlite::{DatabasePool, SqliteConversationRepository};
use yasmin_types::config::ServerConfig;

/// Concrete service type pinned to the infra implementations.
pub type ConcreteChatService = ChatService<SqliteConversationRepository>;

/// Shared application state held by every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
}

impl AppState {
    /// Initialize the application state: connect to the database, run
    /// migrations, wire the provider chain.
    ///
    /// A missing database is fatal; missing provider credentials only
    /// degrade the resolver to fewer tiers.
    pub async fn init(config: ServerConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&config.database_url).await?;
        let repo = SqliteConversationRepository::new(db_pool);

        let resolver = build_resolver(
            config.primary_api_key,
            config.backup_api_key,
            &config.app_url,
            &config.app_title,
        );

        let chat_service = ChatService::new(repo, resolver, config.history_limit);

        Ok(Self {
            chat_service: Arc::new(chat_service),
        })
    }
}
