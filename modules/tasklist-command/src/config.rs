use anyhow::Result;

use tasklist_events::config::{env_or, parse_env, redact, url_env};
use tasklist_events::{DatabaseConfig, DEFAULT_PARTITIONS};

/// Command service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Relational write store.
    pub write_database_url: String,
    /// Broker topic log. May be the same database as the write store.
    pub broker_database_url: String,
    pub database: DatabaseConfig,

    pub host: String,
    pub port: u16,

    /// Partition count for the task topic if this service creates it.
    pub topic_partitions: u32,
}

impl CommandConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            write_database_url: url_env("WRITE_DATABASE_URL", "DATABASE_URL")?,
            broker_database_url: url_env("BROKER_DATABASE_URL", "DATABASE_URL")?,
            database: DatabaseConfig::from_env()?,
            host: env_or("COMMAND_HOST", "0.0.0.0"),
            port: parse_env("COMMAND_PORT", 8081)?,
            topic_partitions: parse_env("TOPIC_PARTITIONS", DEFAULT_PARTITIONS)?,
        };

        config.log();
        Ok(config)
    }

    fn log(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  WRITE_DATABASE_URL: {}", redact(&self.write_database_url));
        tracing::info!("  BROKER_DATABASE_URL: {}", redact(&self.broker_database_url));
        tracing::info!("  COMMAND_ADDR: {}:{}", self.host, self.port);
        tracing::info!("  TOPIC_PARTITIONS: {}", self.topic_partitions);
    }
}
