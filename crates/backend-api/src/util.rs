use crate::ApiError;

/// Extract the conversation id every message endpoint requires.
///
/// A missing or blank id is rejected before any registry or database work.
pub fn require_conversation_id(raw: Option<String>) -> Result<String, ApiError> {
    let value = raw
        .map(|value| value.trim().to_string())
        .unwrap_or_default();

    if value.is_empty() {
        return Err(ApiError::bad_request("conversationId required"));
    }

    Ok(value)
}
