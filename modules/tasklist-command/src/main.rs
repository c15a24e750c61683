use std::sync::Arc;

use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tasklist_command::routes::{self, AppState};
use tasklist_command::{BrokerPublisher, CommandConfig, PgTaskStore, TaskMutator};
use tasklist_events::{PgBroker, TASK_EVENTS_TOPIC};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting command-service");

    let config = CommandConfig::from_env()?;

    let write_pool = config.database.connect(&config.write_database_url).await?;
    sqlx::migrate!("../../migrations").run(&write_pool).await?;

    let broker_pool = if config.broker_database_url == config.write_database_url {
        write_pool.clone()
    } else {
        let pool = config.database.connect(&config.broker_database_url).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        pool
    };
    info!("Migrations complete");

    let broker = PgBroker::new(broker_pool, config.topic_partitions);
    let partitions = broker.ensure_topic(TASK_EVENTS_TOPIC).await?;
    info!(topic = TASK_EVENTS_TOPIC, partitions, "Topic ready");

    let mutator = TaskMutator::new(
        Arc::new(PgTaskStore::new(write_pool)),
        Arc::new(BrokerPublisher::new(broker)),
    );
    let state = Arc::new(AppState { mutator });

    let app = routes::router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.host, config.port);
    info!("Command service listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
