//! SQLite persistence for Yasmin.

pub mod conversation;
pub mod pool;

pub use conversation::SqliteConversationRepository;
pub use pool::DatabasePool;
