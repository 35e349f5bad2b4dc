//! Business logic layer for the chat subsystem.

pub mod message_service;

pub use message_service::MessageService;
