use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tasklist_events::PgBroker;
use tasklist_query::routes::{self, AppState};
use tasklist_query::{PgReadStore, QueryConfig, Subscriber, TaskProjector, TaskReader};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting query-service");

    let config = QueryConfig::from_env()?;

    let read_pool = config.database.connect(&config.read_database_url).await?;
    sqlx::migrate!("../../migrations").run(&read_pool).await?;

    let broker_pool = if config.broker_database_url == config.read_database_url {
        read_pool.clone()
    } else {
        let pool = config.database.connect(&config.broker_database_url).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        pool
    };
    info!("Migrations complete");

    let broker = PgBroker::new(broker_pool, config.topic_partitions);
    let partitions = broker.ensure_topic(&config.subscriber.topic).await?;
    info!(topic = %config.subscriber.topic, partitions, "Topic ready");

    let store = Arc::new(PgReadStore::new(read_pool));
    let subscriber = Arc::new(Subscriber::new(
        Arc::new(broker),
        TaskProjector::new(store.clone()),
        config.subscriber.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let subscription = tokio::spawn(subscriber.run(shutdown_rx));

    let state = Arc::new(AppState {
        reader: TaskReader::new(store),
    });

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
    info!("Query service listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send(true).ok();
    match subscription.await {
        Ok(Err(e)) => warn!(error = %e, "Subscriber exited with error"),
        Err(e) => warn!(error = %e, "Subscriber task failed"),
        Ok(Ok(())) => {}
    }

    Ok(())
}
