use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use pulseboard_chat::{ChatMessage, CreateMessageRequest};

use crate::{util::require_conversation_id, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
}

// List all messages of a conversation
#[utoipa::path(
    get,
    path = "/messages",
    tag = "Messages",
    params(
        ("conversationId" = String, Query, description = "Conversation identifier")
    ),
    responses(
        (status = 200, description = "Messages of the conversation, oldest first"),
        (status = 400, description = "Missing conversation id", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to fetch messages", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let conversation_id = require_conversation_id(query.conversation_id)?;

    let messages = state.messages().list_messages(&conversation_id).await?;

    Ok(Json(messages))
}

// Create a new message and fan it out to live streams
#[utoipa::path(
    post,
    path = "/messages",
    tag = "Messages",
    responses(
        (status = 200, description = "Message created"),
        (status = 400, description = "Invalid message payload", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to create message", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_message(
    State(state): State<AppState>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<Json<ChatMessage>, ApiError> {
    let message = state.messages().create_message(request).await?;

    tracing::debug!(
        conversation_id = %message.conversation_id,
        message_id = %message.id,
        "message created"
    );

    Ok(Json(message))
}
