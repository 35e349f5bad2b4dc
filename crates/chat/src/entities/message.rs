use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Upper bound for message content length, in characters.
const MAX_CONTENT_LENGTH: usize = 10_000;

/// Upper bound for avatar initials, in characters.
const MAX_AVATAR_LENGTH: usize = 12;

/// A persisted chat message within one conversation.
///
/// Messages are immutable once written; ordering is by `created_at`
/// ascending with ties broken by insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Publicly visible identifier
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// Display name of the sender
    pub author: String,
    /// Short initials rendered in the sender's avatar bubble
    pub avatar_initials: Option<String>,
    /// Message content
    pub content: String,
    /// Creation timestamp (RFC 3339, UTC)
    pub created_at: String,
}

/// Request to create a new message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    /// Conversation to post into
    pub conversation_id: String,
    /// Display name of the sender
    pub author: String,
    /// Optional avatar initials
    #[serde(default)]
    pub avatar_initials: Option<String>,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a new message instance from a validated request.
    pub fn new(request: &CreateMessageRequest) -> Self {
        Self {
            id: cuid2::create_id(),
            conversation_id: request.conversation_id.clone(),
            author: request.author.clone(),
            avatar_initials: request.avatar_initials.clone(),
            content: request.content.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

impl CreateMessageRequest {
    /// Trim all fields and drop an avatar that is only whitespace.
    pub fn normalized(self) -> Self {
        Self {
            conversation_id: self.conversation_id.trim().to_string(),
            author: self.author.trim().to_string(),
            avatar_initials: self
                .avatar_initials
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            content: self.content.trim().to_string(),
        }
    }

    /// Validate the create request
    pub fn validate(&self) -> Result<(), String> {
        if self.conversation_id.trim().is_empty() {
            return Err("conversationId must not be empty".to_string());
        }

        if self.author.trim().is_empty() {
            return Err("author must not be empty".to_string());
        }

        if self.content.trim().is_empty() {
            return Err("content must not be empty".to_string());
        }

        if self.content.len() > MAX_CONTENT_LENGTH {
            return Err("content too long (max 10,000 characters)".to_string());
        }

        if let Some(ref initials) = self.avatar_initials {
            if initials.len() > MAX_AVATAR_LENGTH {
                return Err("avatarInitials too long (max 12 characters)".to_string());
            }
        }

        Ok(())
    }
}
