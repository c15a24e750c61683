//! Integration tests for PgTaskStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use sqlx::PgPool;
use tasklist_command::{PgTaskStore, TaskDraft, TaskWriteStore};

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;
    Some(pool)
}

#[tokio::test]
async fn insert_assigns_id_and_roundtrips() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgTaskStore::new(pool);

    let saved = store.save(TaskDraft::new("buy milk")).await.unwrap().unwrap();
    assert!(saved.id > 0);
    assert!(!saved.completed);

    let found = store.find_by_id(saved.id).await.unwrap();
    assert_eq!(found, Some(saved));
}

#[tokio::test]
async fn save_with_id_overwrites_fields() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgTaskStore::new(pool);

    let saved = store.save(TaskDraft::new("a")).await.unwrap().unwrap();
    let mut draft = saved.clone().into_draft();
    draft.description = "b".into();
    draft.completed = true;

    let updated = store.save(draft).await.unwrap().unwrap();
    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.description, "b");
    assert!(updated.completed);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgTaskStore::new(pool);

    let saved = store.save(TaskDraft::new("gone soon")).await.unwrap().unwrap();
    store.delete_by_id(saved.id).await.unwrap();
    store.delete_by_id(saved.id).await.unwrap();

    assert!(store.find_by_id(saved.id).await.unwrap().is_none());
}

#[tokio::test]
async fn save_of_removed_row_returns_none() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgTaskStore::new(pool);

    let saved = store.save(TaskDraft::new("racing")).await.unwrap().unwrap();
    store.delete_by_id(saved.id).await.unwrap();

    assert_eq!(store.save(saved.into_draft()).await.unwrap(), None);
}
