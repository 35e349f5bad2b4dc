use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::StreamExt;

use crate::{routes::messages::MessagesQuery, util::require_conversation_id, ApiError, AppState};

// Open a live message stream for a conversation.
//
// The response is a server-sent event stream: one `init` frame carrying the
// recent backlog, then a `message` frame per newly created message until the
// client goes away. Closing the connection releases the subscriber.
#[utoipa::path(
    get,
    path = "/messages/stream",
    tag = "Messages",
    params(
        ("conversationId" = String, Query, description = "Conversation identifier")
    ),
    responses(
        (status = 200, description = "Event stream of init and message events"),
        (status = 400, description = "Missing conversation id", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to open the stream", body = crate::error::ErrorResponse)
    )
)]
pub async fn message_stream(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = require_conversation_id(query.conversation_id)?;
    let settings = state.stream().clone();

    let session = state
        .messages()
        .open_stream(&conversation_id, settings.backlog_limit)
        .await?;

    tracing::debug!(%conversation_id, "stream session opened");

    let frames = session
        .into_frames()
        .map(|frame| Ok::<_, Infallible>(Event::default().data(frame.as_ref())));

    let sse =
        Sse::new(frames).keep_alive(KeepAlive::new().interval(settings.keep_alive).text("ping"));

    // Ask buffering reverse proxies to pass frames through untouched.
    Ok(([("x-accel-buffering", "no")], sse))
}
