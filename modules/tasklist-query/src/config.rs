use std::time::Duration;

use anyhow::Result;

use tasklist_events::config::{env_or, parse_env, redact, url_env};
use tasklist_events::{DatabaseConfig, DEFAULT_PARTITIONS};

use crate::subscriber::SubscriberConfig;

/// Query service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Document read store.
    pub read_database_url: String,
    /// Broker topic log the projector consumes from.
    pub broker_database_url: String,
    pub database: DatabaseConfig,

    pub host: String,
    pub port: u16,

    /// Partition count for the task topic if this service creates it.
    pub topic_partitions: u32,
    pub subscriber: SubscriberConfig,
}

impl QueryConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = SubscriberConfig::default();
        let subscriber = SubscriberConfig {
            batch_size: parse_env("SUBSCRIBER_BATCH_SIZE", defaults.batch_size)?.max(1),
            idle_wait: Duration::from_millis(parse_env(
                "SUBSCRIBER_IDLE_MS",
                defaults.idle_wait.as_millis() as u64,
            )?),
            retry_backoff: Duration::from_millis(parse_env(
                "SUBSCRIBER_RETRY_MS",
                defaults.retry_backoff.as_millis() as u64,
            )?),
            ..defaults
        };

        let config = Self {
            read_database_url: url_env("READ_DATABASE_URL", "DATABASE_URL")?,
            broker_database_url: url_env("BROKER_DATABASE_URL", "DATABASE_URL")?,
            database: DatabaseConfig::from_env()?,
            host: env_or("QUERY_HOST", "0.0.0.0"),
            port: parse_env("QUERY_PORT", 8082)?,
            topic_partitions: parse_env("TOPIC_PARTITIONS", DEFAULT_PARTITIONS)?,
            subscriber,
        };

        config.log();
        Ok(config)
    }

    fn log(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  READ_DATABASE_URL: {}", redact(&self.read_database_url));
        tracing::info!("  BROKER_DATABASE_URL: {}", redact(&self.broker_database_url));
        tracing::info!("  QUERY_ADDR: {}:{}", self.host, self.port);
        tracing::info!(
            "  SUBSCRIBER: batch={} idle={:?} retry={:?}",
            self.subscriber.batch_size,
            self.subscriber.idle_wait,
            self.subscriber.retry_backoff
        );
    }
}
