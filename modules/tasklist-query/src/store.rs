//! Read store seam and its implementations.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use tasklist_events::TaskId;

use crate::view::TaskView;

/// The document read store. Mutated only by the projector.
///
/// Implemented by PgReadStore (postgres) and MemoryReadStore (tests).
#[async_trait]
pub trait TaskReadStore: Send + Sync {
    /// Insert or replace the view with `view.id`.
    async fn upsert(&self, view: TaskView) -> Result<()>;

    /// Remove a view. Removing an absent view is not an error.
    async fn delete_by_id(&self, id: TaskId) -> Result<()>;

    /// Every view, ordered by id.
    async fn find_all(&self) -> Result<Vec<TaskView>>;
}

// ---------------------------------------------------------------------------
// PgReadStore (production, postgres)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgReadStore {
    pool: PgPool,
}

impl PgReadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskReadStore for PgReadStore {
    async fn upsert(&self, view: TaskView) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO task_views (id, description, completed)
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET description = EXCLUDED.description,
                          completed = EXCLUDED.completed,
                          projected_at = now()
            "#,
        )
        .bind(view.id)
        .bind(&view.description)
        .bind(view.completed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<()> {
        sqlx::query("DELETE FROM task_views WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TaskView>> {
        let rows = sqlx::query_as::<_, TaskView>(
            "SELECT id, description, completed FROM task_views ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// MemoryReadStore (tests, no database required)
// ---------------------------------------------------------------------------

/// A write the store accepted, in the order it was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadWrite {
    Upserted(TaskView),
    Deleted(TaskId),
}

/// In-memory read store. Records every accepted write so tests can check
/// the order the projector applied events in.
pub struct MemoryReadStore {
    state: Mutex<MemoryViews>,
}

#[derive(Default)]
struct MemoryViews {
    rows: BTreeMap<TaskId, TaskView>,
    history: Vec<ReadWrite>,
    failing_writes: usize,
}

impl MemoryReadStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryViews::default()),
        }
    }

    /// Fail the next `n` upserts or deletes.
    pub async fn fail_next_writes(&self, n: usize) {
        self.state.lock().await.failing_writes = n;
    }

    /// Accepted writes, oldest first (for test assertions).
    pub async fn history(&self) -> Vec<ReadWrite> {
        self.state.lock().await.history.clone()
    }

    pub async fn get(&self, id: TaskId) -> Option<TaskView> {
        self.state.lock().await.rows.get(&id).cloned()
    }
}

impl Default for MemoryReadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryViews {
    fn check_write(&mut self) -> Result<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            bail!("read store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl TaskReadStore for MemoryReadStore {
    async fn upsert(&self, view: TaskView) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check_write()?;
        state.history.push(ReadWrite::Upserted(view.clone()));
        state.rows.insert(view.id, view);
        Ok(())
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check_write()?;
        state.history.push(ReadWrite::Deleted(id));
        state.rows.remove(&id);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TaskView>> {
        Ok(self.state.lock().await.rows.values().cloned().collect())
    }
}
