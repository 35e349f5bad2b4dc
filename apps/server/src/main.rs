use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pulseboard_backend_api::{build_router, AppState, StreamSettings};
use pulseboard_chat::{CreateMessageRequest, MessageService, TopicRegistry};
use pulseboard_config::{load as load_config, AppConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::{fs, net::TcpListener, signal};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod migrations {
    pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
}

#[derive(Parser)]
#[command(name = "pulseboard-server")]
#[command(about = "Pulseboard chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Seed a few demo conversations with messages
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Pulseboard backend");

    let config = load_config().context("failed to load configuration")?;
    let db_pool = prepare_database(&config).await?;

    let stream = StreamSettings {
        backlog_limit: config.stream.backlog_limit,
        keep_alive: Duration::from_secs(config.stream.keep_alive_seconds),
        channel_capacity: config.stream.channel_capacity as usize,
    };
    let state = AppState::new(db_pool, stream);

    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn prepare_database(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    // Make sure the directory for a file-backed database exists before
    // sqlite tries to create the file inside it.
    if let Some(sqlite_path) = config.database.url.strip_prefix("sqlite://") {
        if sqlite_path != ":memory:" {
            let path = Path::new(sqlite_path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await.with_context(|| {
                        format!("failed to create sqlite directory {}", parent.display())
                    })?;
                }
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&config.database.url)
        .with_context(|| format!("invalid database url {}", config.database.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database {}", config.database.url))?;

    migrations::MIGRATOR
        .run(&db_pool)
        .await
        .context("database migrations failed")?;

    Ok(db_pool)
}

async fn seed_data() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    let db_pool = prepare_database(&config).await?;
    let service = MessageService::new(db_pool, TopicRegistry::default());

    let seeds = [
        (
            "proj-website-redesign",
            "Sara K.",
            "SK",
            "Design review went well! Client approved the new brand direction.",
        ),
        (
            "proj-website-redesign",
            "Jay P.",
            "JP",
            "CMS integration is taking longer than expected. Need an extra day.",
        ),
        (
            "proj-website-redesign",
            "Marcus L.",
            "ML",
            "Let's sync tomorrow morning to review blockers before the deadline crunch.",
        ),
        (
            "proj-mobile-app-v2",
            "Dev T.",
            "DT",
            "Push notification POC is working on both platforms.",
        ),
        (
            "proj-mobile-app-v2",
            "Priya M.",
            "PM",
            "Should we include offline mode in the beta or push to v2.1?",
        ),
        (
            "proj-data-pipeline",
            "Alex R.",
            "AR",
            "Kafka is running smooth in staging. Moving to prod setup tomorrow.",
        ),
    ];

    for (conversation_id, author, avatar, content) in seeds {
        let message = service
            .create_message(CreateMessageRequest {
                conversation_id: conversation_id.to_string(),
                author: author.to_string(),
                avatar_initials: Some(avatar.to_string()),
                content: content.to_string(),
            })
            .await
            .context("failed to seed message")?;
        info!(
            conversation_id = %message.conversation_id,
            message_id = %message.id,
            "seeded message"
        );
    }

    info!("seed complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = ?err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
