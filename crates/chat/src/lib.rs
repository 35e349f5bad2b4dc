//! # Pulseboard Chat Crate
//!
//! Core chat functionality for Pulseboard: message entities and persistence,
//! the per-conversation fan-out registry, and the stream sessions that bridge
//! newly created messages to open server-sent-event connections.
//!
//! ## Architecture
//!
//! - **Entities**: domain models (`ChatMessage`, `CreateMessageRequest`)
//! - **Repositories**: data access layer over SQLite
//! - **Registry**: process-wide map of conversations to live subscribers
//! - **Session**: per-connection backlog bootstrap plus live updates
//! - **Services**: business logic tying persistence and fan-out together

pub mod entities;
pub mod registry;
pub mod repositories;
pub mod services;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use entities::{ChatMessage, CreateMessageRequest};
pub use registry::{Subscription, TopicRegistry};
pub use repositories::MessageRepository;
pub use services::MessageService;
pub use session::StreamSession;
pub use types::{ChatError, ChatResult, StreamEvent};
