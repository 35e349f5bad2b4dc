//! Repository for message data access operations.

use sqlx::SqlitePool;

use crate::entities::{ChatMessage, CreateMessageRequest};
use crate::types::ChatResult;

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new message and return the stored row.
    pub async fn create(&self, request: &CreateMessageRequest) -> ChatResult<ChatMessage> {
        let message = ChatMessage::new(request);

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, author, avatar_initials, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.author)
        .bind(&message.avatar_initials)
        .bind(&message.content)
        .bind(&message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    /// The most recent `limit` messages of a conversation, oldest first.
    /// Equal timestamps fall back to insertion order.
    pub async fn recent(&self, conversation_id: &str, limit: u32) -> ChatResult<Vec<ChatMessage>> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, conversation_id, author, avatar_initials, content, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(conversation_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Full history of a conversation, oldest first.
    pub async fn list(&self, conversation_id: &str) -> ChatResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, conversation_id, author, avatar_initials, content, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
