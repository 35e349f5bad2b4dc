//! Message service: authoritative persistence plus best-effort fan-out.

use sqlx::SqlitePool;

use crate::entities::{ChatMessage, CreateMessageRequest};
use crate::registry::TopicRegistry;
use crate::repositories::MessageRepository;
use crate::session::StreamSession;
use crate::types::{ChatError, ChatResult, StreamEvent};

/// Service for message operations
#[derive(Clone)]
pub struct MessageService {
    repository: MessageRepository,
    registry: TopicRegistry,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(pool: SqlitePool, registry: TopicRegistry) -> Self {
        Self {
            repository: MessageRepository::new(pool),
            registry,
        }
    }

    /// Fan-out registry this service publishes into.
    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Persist a new message, then fan it out to the conversation's live
    /// subscribers.
    ///
    /// Fan-out happens strictly after the insert succeeded, and its outcome
    /// never affects the result: the caller gets the created message whether
    /// zero or many subscribers were reachable.
    pub async fn create_message(&self, request: CreateMessageRequest) -> ChatResult<ChatMessage> {
        let request = request.normalized();
        request.validate().map_err(ChatError::validation)?;

        let message = self.repository.create(&request).await?;

        self.registry.publish(
            &message.conversation_id,
            &StreamEvent::Message {
                message: message.clone(),
            },
        );

        Ok(message)
    }

    /// Full ascending history of a conversation.
    pub async fn list_messages(&self, conversation_id: &str) -> ChatResult<Vec<ChatMessage>> {
        self.repository.list(conversation_id).await
    }

    /// The most recent `limit` messages of a conversation, oldest first.
    pub async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> ChatResult<Vec<ChatMessage>> {
        self.repository.recent(conversation_id, limit).await
    }

    /// Open a live stream session for a conversation.
    pub async fn open_stream(
        &self,
        conversation_id: &str,
        backlog_limit: u32,
    ) -> ChatResult<StreamSession> {
        StreamSession::open(
            &self.repository,
            &self.registry,
            conversation_id,
            backlog_limit,
        )
        .await
    }
}
