//! Shared domain types for Yasmin.
//!
//! This crate contains the core domain types used across the Yasmin chat
//! widget: conversations, messages, resolver request/reply shapes, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
