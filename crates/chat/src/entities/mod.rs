//! Domain entities for the chat subsystem.

pub mod message;

pub use message::{ChatMessage, CreateMessageRequest};
