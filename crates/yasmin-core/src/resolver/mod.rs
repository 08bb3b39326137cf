//! Response resolution: provider trait, fallback chain, offline replies.

pub mod box_provider;
pub mod chain;
pub mod offline;
pub mod provider;

pub use box_provider::BoxChatProvider;
pub use chain::ResponseResolver;
pub use offline::OfflineReplies;
pub use provider::ChatProvider;
