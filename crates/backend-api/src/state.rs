use std::time::Duration;

use pulseboard_chat::{MessageService, TopicRegistry};
use sqlx::SqlitePool;

/// Stream tuning shared by the streaming handlers.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Backlog size a newly opened stream receives up front.
    pub backlog_limit: u32,
    /// Interval between keep-alive comment frames.
    pub keep_alive: Duration,
    /// Buffered events per conversation before slow subscribers skip frames.
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            backlog_limit: 50,
            keep_alive: Duration::from_secs(25),
            channel_capacity: 256,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    messages: MessageService,
    stream: StreamSettings,
}

impl AppState {
    /// Build the shared state: one fan-out registry for the whole process,
    /// owned here and handed to every handler by reference.
    pub fn new(db_pool: SqlitePool, stream: StreamSettings) -> Self {
        let registry = TopicRegistry::new(stream.channel_capacity);
        let messages = MessageService::new(db_pool.clone(), registry);
        Self {
            db_pool,
            messages,
            stream,
        }
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    pub fn messages(&self) -> &MessageService {
        &self.messages
    }

    pub fn registry(&self) -> &TopicRegistry {
        self.messages.registry()
    }

    pub fn stream(&self) -> &StreamSettings {
        &self.stream
    }
}
