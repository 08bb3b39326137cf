//! Business logic for Yasmin: the response resolver fallback chain, the
//! conversation repository trait, and the chat service orchestrating
//! send/regenerate turns.
//!
//! This crate never depends on infrastructure -- repositories and
//! providers are traits implemented in `yasmin-infra`.

pub mod chat;
pub mod resolver;
pub mod store;
