//! Integration tests for PgReadStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use sqlx::PgPool;
use tasklist_query::{PgReadStore, TaskReadStore, TaskView};

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;
    Some(pool)
}

/// Ids far from anything the write side would hand out in a test database.
fn test_id(offset: i64) -> i64 {
    9_000_000_000 + nonce() * 10 + offset
}

fn nonce() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| (d.as_micros() % 100_000_000) as i64)
        .unwrap_or_default()
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgReadStore::new(pool);
    let id = test_id(1);
    let view = TaskView {
        id,
        description: "buy milk".into(),
        completed: false,
    };

    store.upsert(view.clone()).await.unwrap();
    store.upsert(view.clone()).await.unwrap();

    let rows: Vec<TaskView> = store
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|v| v.id == id)
        .collect();
    assert_eq!(rows, vec![view]);
}

#[tokio::test]
async fn upsert_replaces_fields() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgReadStore::new(pool);
    let id = test_id(2);

    store
        .upsert(TaskView { id, description: "a".into(), completed: false })
        .await
        .unwrap();
    store
        .upsert(TaskView { id, description: "b".into(), completed: true })
        .await
        .unwrap();

    let view = store.find_all().await.unwrap().into_iter().find(|v| v.id == id);
    assert_eq!(view, Some(TaskView { id, description: "b".into(), completed: true }));
}

#[tokio::test]
async fn delete_of_absent_id_is_a_noop() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgReadStore::new(pool);
    let id = test_id(3);

    store.delete_by_id(id).await.unwrap();
    store.delete_by_id(id).await.unwrap();

    assert!(store.find_all().await.unwrap().iter().all(|v| v.id != id));
}
