//! Integration tests for message persistence, fan-out, and stream sessions.

use std::str::FromStr;
use std::time::Duration;

use futures_util::StreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::time::timeout;

use pulseboard_chat::{
    ChatError, CreateMessageRequest, MessageRepository, MessageService, StreamEvent, TopicRegistry,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

struct TestContext {
    _temp_dir: TempDir,
    pool: SqlitePool,
    registry: TopicRegistry,
}

impl TestContext {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("chat.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
            .expect("sqlite url should parse")
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("pool should connect");

        MIGRATOR.run(&pool).await.expect("migrations should run");

        Self {
            _temp_dir: temp_dir,
            pool,
            registry: TopicRegistry::default(),
        }
    }

    fn repository(&self) -> MessageRepository {
        MessageRepository::new(self.pool.clone())
    }

    fn service(&self) -> MessageService {
        MessageService::new(self.pool.clone(), self.registry.clone())
    }

    async fn insert_message(&self, id: &str, conversation_id: &str, content: &str, created_at: &str) {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, author, avatar_initials, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(conversation_id)
        .bind("Sara K.")
        .bind(Some("SK"))
        .bind(content)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .expect("message row should insert");
    }
}

fn request(conversation_id: &str, content: &str) -> CreateMessageRequest {
    CreateMessageRequest {
        conversation_id: conversation_id.to_string(),
        author: "Sara K.".to_string(),
        avatar_initials: Some("SK".to_string()),
        content: content.to_string(),
    }
}

fn parse(frame: &str) -> StreamEvent {
    serde_json::from_str(frame).expect("frame should be a valid stream event")
}

mod repository_tests {
    use super::*;

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let ctx = TestContext::new().await;
        let repository = ctx.repository();

        let created = repository
            .create(&request("proj-1", "hello"))
            .await
            .expect("message should persist");

        let listed = repository.list("proj-1").await.expect("list should succeed");
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn recent_returns_newest_messages_ascending() {
        let ctx = TestContext::new().await;
        let repository = ctx.repository();

        for minute in 0..55u32 {
            ctx.insert_message(
                &format!("m{minute:02}"),
                "proj-1",
                &format!("message {minute}"),
                &format!("2026-08-06T10:{minute:02}:00+00:00"),
            )
            .await;
        }

        let recent = repository
            .recent("proj-1", 50)
            .await
            .expect("recent should succeed");

        assert_eq!(recent.len(), 50);
        // The five oldest fall off; the rest come back oldest first.
        assert_eq!(recent.first().map(|m| m.id.as_str()), Some("m05"));
        assert_eq!(recent.last().map(|m| m.id.as_str()), Some("m54"));
        let mut sorted = recent.clone();
        sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        assert_eq!(recent, sorted);
    }

    #[tokio::test]
    async fn recent_breaks_timestamp_ties_by_insertion_order() {
        let ctx = TestContext::new().await;
        let repository = ctx.repository();
        let stamp = "2026-08-06T10:00:00+00:00";

        for id in ["a", "b", "c"] {
            ctx.insert_message(id, "proj-1", id, stamp).await;
        }

        let recent = repository
            .recent("proj-1", 10)
            .await
            .expect("recent should succeed");
        let ids: Vec<&str> = recent.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn unknown_conversation_yields_empty_results() {
        let ctx = TestContext::new().await;
        let repository = ctx.repository();

        assert!(repository
            .recent("proj-none", 50)
            .await
            .expect("recent should succeed")
            .is_empty());
        assert!(repository
            .list("proj-none")
            .await
            .expect("list should succeed")
            .is_empty());
    }
}

mod service_tests {
    use super::*;

    #[tokio::test]
    async fn create_message_rejects_blank_conversation_id() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        let result = service.create_message(request("   ", "hello")).await;
        assert!(matches!(result, Err(ChatError::Validation { .. })));
    }

    #[tokio::test]
    async fn create_message_fans_out_to_live_subscribers() {
        let ctx = TestContext::new().await;
        let service = ctx.service();
        let mut first = ctx.registry.subscribe("proj-1");
        let mut second = ctx.registry.subscribe("proj-1");
        let mut other = ctx.registry.subscribe("proj-2");

        let created = service
            .create_message(request("proj-1", "hi"))
            .await
            .expect("create should succeed");

        for subscription in [&mut first, &mut second] {
            let frame = timeout(RECV_TIMEOUT, subscription.recv())
                .await
                .expect("frame should arrive in time")
                .expect("subscriber should receive a frame");
            match parse(&frame) {
                StreamEvent::Message { message } => {
                    assert_eq!(message.id, created.id);
                    assert_eq!(message.content, "hi");
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }

        assert!(
            timeout(Duration::from_millis(50), other.recv()).await.is_err(),
            "proj-2 subscriber must not receive proj-1 traffic"
        );
    }

    #[tokio::test]
    async fn create_message_succeeds_with_zero_subscribers() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        let created = service
            .create_message(request("proj-1", "nobody listening"))
            .await
            .expect("create should succeed without subscribers");

        let listed = service
            .list_messages("proj-1")
            .await
            .expect("list should succeed");
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn fan_out_continues_after_a_subscriber_disconnects() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        let mut survivor = ctx.registry.subscribe("proj-1");
        let dropped = ctx.registry.subscribe("proj-1");
        drop(dropped);

        service
            .create_message(request("proj-1", "still flowing"))
            .await
            .expect("create should succeed");

        assert_eq!(ctx.registry.subscriber_count("proj-1"), 1);
        let frame = timeout(RECV_TIMEOUT, survivor.recv())
            .await
            .expect("frame should arrive in time")
            .expect("survivor should receive");
        assert!(frame.contains("still flowing"));
    }
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_matches_plain_backlog_fetch() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        for minute in 0..3u32 {
            ctx.insert_message(
                &format!("m{minute}"),
                "proj-1",
                &format!("message {minute}"),
                &format!("2026-08-06T10:0{minute}:00+00:00"),
            )
            .await;
        }

        let expected = service
            .recent_messages("proj-1", 50)
            .await
            .expect("backlog fetch should succeed");

        let session = service
            .open_stream("proj-1", 50)
            .await
            .expect("session should open");
        match session.bootstrap() {
            StreamEvent::Init { messages } => assert_eq!(messages, &expected),
            other => panic!("unexpected bootstrap event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stream_emits_bootstrap_then_live_messages() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        ctx.insert_message("m0", "proj-1", "earlier", "2026-08-06T10:00:00+00:00")
            .await;

        let session = service
            .open_stream("proj-1", 50)
            .await
            .expect("session should open");
        let mut frames = Box::pin(session.into_frames());

        let first = timeout(RECV_TIMEOUT, frames.next())
            .await
            .expect("bootstrap frame should arrive")
            .expect("stream should yield the bootstrap frame");
        match parse(&first) {
            StreamEvent::Init { messages } => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].content, "earlier");
            }
            other => panic!("unexpected first frame: {other:?}"),
        }

        service
            .create_message(request("proj-1", "brand new"))
            .await
            .expect("create should succeed");

        let second = timeout(RECV_TIMEOUT, frames.next())
            .await
            .expect("live frame should arrive")
            .expect("stream should yield the live frame");
        match parse(&second) {
            StreamEvent::Message { message } => assert_eq!(message.content, "brand new"),
            other => panic!("unexpected second frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_conversation_bootstrap_is_an_empty_init() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        let session = service
            .open_stream("proj-unknown", 50)
            .await
            .expect("session should open for unknown conversations");
        match session.bootstrap() {
            StreamEvent::Init { messages } => assert!(messages.is_empty()),
            other => panic!("unexpected bootstrap event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_stream_unregisters_the_subscriber() {
        let ctx = TestContext::new().await;
        let service = ctx.service();

        let session = service
            .open_stream("proj-1", 50)
            .await
            .expect("session should open");
        assert_eq!(ctx.registry.subscriber_count("proj-1"), 1);

        let frames = Box::pin(session.into_frames());
        drop(frames);

        assert_eq!(ctx.registry.subscriber_count("proj-1"), 0);
        // A later publish is a no-op rather than an error.
        service
            .create_message(request("proj-1", "after disconnect"))
            .await
            .expect("create should still succeed");
    }
}
