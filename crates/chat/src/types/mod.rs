//! Shared types for the chat subsystem.

pub mod errors;
pub mod events;

pub use errors::{ChatError, ChatResult};
pub use events::StreamEvent;
