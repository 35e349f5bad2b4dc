//! Per-connection stream session: backlog bootstrap plus live updates.

use std::sync::Arc;

use futures_util::Stream;
use tracing::error;

use crate::registry::{Subscription, TopicRegistry};
use crate::repositories::MessageRepository;
use crate::types::{ChatResult, StreamEvent};

/// State for one open streaming connection.
///
/// A session is built per connection and discarded when the connection ends:
/// opening it snapshots the backlog and registers a subscriber, and dropping
/// the frame stream unregisters that subscriber again. A message published
/// between the backlog fetch and the registration can be missed by this one
/// session; clients recover through the bootstrap of their next connection.
pub struct StreamSession {
    bootstrap: StreamEvent,
    subscription: Subscription,
}

impl StreamSession {
    /// Open a session: fetch the most recent `backlog_limit` messages, then
    /// subscribe to live updates for `conversation_id`.
    pub async fn open(
        repository: &MessageRepository,
        registry: &TopicRegistry,
        conversation_id: &str,
        backlog_limit: u32,
    ) -> ChatResult<Self> {
        let messages = repository.recent(conversation_id, backlog_limit).await?;
        let subscription = registry.subscribe(conversation_id);

        Ok(Self {
            bootstrap: StreamEvent::Init { messages },
            subscription,
        })
    }

    pub fn conversation_id(&self) -> &str {
        self.subscription.conversation_id()
    }

    /// Backlog snapshot captured when the session was opened.
    pub fn bootstrap(&self) -> &StreamEvent {
        &self.bootstrap
    }

    /// Consume the session into its outgoing frame sequence: the serialized
    /// bootstrap event first, then every live payload until the connection or
    /// the channel goes away. Dropping the stream releases the subscriber.
    pub fn into_frames(self) -> impl Stream<Item = Arc<str>> {
        let Self {
            bootstrap,
            mut subscription,
        } = self;

        async_stream::stream! {
            match serde_json::to_string(&bootstrap) {
                Ok(json) => yield Arc::<str>::from(json),
                Err(err) => {
                    error!(error = ?err, "failed to encode bootstrap frame");
                }
            }

            while let Some(frame) = subscription.recv().await {
                yield frame;
            }
        }
    }
}
