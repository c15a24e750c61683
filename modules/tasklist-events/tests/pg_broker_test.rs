//! Integration tests for PgBroker.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use serde_json::json;
use sqlx::PgPool;
use tasklist_events::{partition_for, Consumer, PgBroker, Producer};

const GROUP: &str = "task-group";

/// Get a test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;

    Some(pool)
}

/// Each test gets its own topic so tests can share one database.
fn unique_topic(name: &str) -> String {
    format!("{name}-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
async fn send_then_fetch_in_offset_order() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let broker = PgBroker::new(pool, 4);
    let topic = unique_topic("send-fetch");

    for n in 0..3 {
        broker.send(&topic, "11", json!({"n": n})).await.unwrap();
    }

    let partition = partition_for("11", 4);
    let delivered = broker.fetch(&topic, partition, 0, 10).await.unwrap();

    let offsets: Vec<i64> = delivered.iter().map(|d| d.offset).collect();
    assert_eq!(offsets, vec![0, 1, 2]);
    assert_eq!(delivered[2].payload, json!({"n": 2}));
    assert!(broker.fetch(&topic, partition, 3, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_partition_count_wins_over_local_default() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let topic = unique_topic("partitions");

    let first = PgBroker::new(pool.clone(), 3);
    assert_eq!(first.ensure_topic(&topic).await.unwrap(), 3);

    let second = PgBroker::new(pool, 8);
    assert_eq!(second.partitions(&topic).await.unwrap(), 3);
}

#[tokio::test]
async fn committed_offset_survives_a_new_broker_handle() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let topic = unique_topic("offsets");

    let broker = PgBroker::new(pool.clone(), 1);
    broker.ensure_topic(&topic).await.unwrap();
    assert_eq!(broker.committed(GROUP, &topic, 0).await.unwrap(), 0);
    broker.commit(GROUP, &topic, 0, 4).await.unwrap();

    let restarted = PgBroker::new(pool, 1);
    assert_eq!(restarted.committed(GROUP, &topic, 0).await.unwrap(), 4);
}

#[tokio::test]
async fn concurrent_sends_produce_gap_free_offsets() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let broker = PgBroker::new(pool, 1);
    let topic = unique_topic("concurrent");
    broker.ensure_topic(&topic).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..20 {
        let broker = broker.clone();
        let topic = topic.clone();
        handles.push(tokio::spawn(async move {
            broker.send(&topic, &n.to_string(), json!({"n": n})).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let offsets: Vec<i64> = broker
        .fetch(&topic, 0, 0, 100)
        .await
        .unwrap()
        .iter()
        .map(|d| d.offset)
        .collect();
    assert_eq!(offsets, (0..20).collect::<Vec<i64>>());
}
