use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "pulseboard.toml",
    "config/pulseboard.toml",
    "crates/config/pulseboard.toml",
    "../pulseboard.toml",
    "../config/pulseboard.toml",
    "../crates/config/pulseboard.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pulseboard.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Tunables for the live message stream.
///
/// ```
/// use pulseboard_config::StreamConfig;
///
/// let stream = StreamConfig::default();
/// assert_eq!(stream.backlog_limit, 50);
/// assert_eq!(stream.keep_alive_seconds, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// How many recent messages a newly opened stream receives up front.
    #[serde(default = "StreamConfig::default_backlog_limit")]
    pub backlog_limit: u32,
    /// Interval between keep-alive comment frames on idle streams.
    #[serde(default = "StreamConfig::default_keep_alive")]
    pub keep_alive_seconds: u64,
    /// Buffered events per conversation before slow subscribers skip frames.
    #[serde(default = "StreamConfig::default_channel_capacity")]
    pub channel_capacity: u32,
}

impl StreamConfig {
    const fn default_backlog_limit() -> u32 {
        50
    }

    const fn default_keep_alive() -> u64 {
        25
    }

    const fn default_channel_capacity() -> u32 {
        256
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            backlog_limit: Self::default_backlog_limit(),
            keep_alive_seconds: Self::default_keep_alive(),
            channel_capacity: Self::default_channel_capacity(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use pulseboard_config::load;
///
/// std::env::remove_var("PULSEBOARD_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default(
            "stream.backlog_limit",
            i64::from(defaults.stream.backlog_limit),
        )
        .unwrap()
        .set_default(
            "stream.keep_alive_seconds",
            i64::try_from(defaults.stream.keep_alive_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default(
            "stream.channel_capacity",
            i64::from(defaults.stream.channel_capacity),
        )
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("PULSEBOARD").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("PULSEBOARD_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via PULSEBOARD_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
