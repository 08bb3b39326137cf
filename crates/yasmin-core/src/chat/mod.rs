//! Chat turn orchestration.

pub mod service;

pub use service::{ChatService, RegenerateInput, RegenerateOutput, SendTurnInput, SendTurnOutput};
