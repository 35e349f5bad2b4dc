//! Event types pushed over live message streams.

use serde::{Deserialize, Serialize};

use crate::entities::ChatMessage;

/// One frame on a live stream.
///
/// `Init` carries the backlog snapshot a client replaces its view with;
/// `Message` appends a single newly created message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Backlog snapshot sent once when a stream opens
    Init { messages: Vec<ChatMessage> },

    /// A message was created
    Message { message: ChatMessage },
}

impl StreamEvent {
    /// Get event type name for logging/metrics
    pub fn event_type_name(&self) -> &'static str {
        match self {
            StreamEvent::Init { .. } => "init",
            StreamEvent::Message { .. } => "message",
        }
    }
}
