//! Client-side conversation engine for the Yasmin chat widget.
//!
//! - `session`: the conversation session state machine (one in-flight
//!   request, optimistic bubbles, regeneration mirror-rollback).
//! - `matcher`: the predefined-response matcher that short-circuits
//!   common phrases before any network call.
//! - `speech`: the speech bridge wrapping speech-to-text and
//!   text-to-speech engines behind a capability model.
//! - `api`: the chat API transport trait and its HTTP implementation.

pub mod api;
pub mod matcher;
pub mod session;
pub mod speech;
