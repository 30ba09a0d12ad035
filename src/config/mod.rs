use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits for the SQLite write lock before giving up.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

/// Tunables for the statistics rollups.
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulingConfig {
    #[serde(default = "default_understaffed_window_days")]
    pub understaffed_window_days: i64,
    #[serde(default = "default_understaffed_limit")]
    pub understaffed_limit: i64,
    #[serde(default = "default_top_events_limit")]
    pub top_events_limit: i64,
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_understaffed_window_days() -> i64 {
    30
}

fn default_understaffed_limit() -> i64 {
    5
}

fn default_top_events_limit() -> i64 {
    5
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            understaffed_window_days: default_understaffed_window_days(),
            understaffed_limit: default_understaffed_limit(),
            top_events_limit: default_top_events_limit(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite://campfire.db")?
            .set_default("database.max_connections", 10)?
            .set_default("database.busy_timeout_secs", 5)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with CAMPFIRE__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("CAMPFIRE").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://campfire.db".to_string(),
                max_connections: 10,
                busy_timeout_secs: default_busy_timeout_secs(),
            },
            scheduling: SchedulingConfig::default(),
        }
    }
}
