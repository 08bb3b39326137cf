use thiserror::Error;

/// Errors from conversation store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation not found")]
    NotFound,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("database connection error")]
    Connection,
}

/// Errors surfaced by the chat service to the API layer.
///
/// Provider failures inside the resolver are absorbed by the fallback
/// chain and never appear here; `Upstream` only fires on the guard path
/// where every resolver tier somehow produced nothing.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("conversation not found")]
    NotFound,

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

/// Errors on the client side of the chat API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("a request is already in flight")]
    SessionBusy,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
}
