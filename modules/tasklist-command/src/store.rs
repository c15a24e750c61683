//! Write store seam and its implementations.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use tasklist_events::TaskId;

use crate::record::{TaskDraft, TaskRecord};

/// The relational write store. Each call is atomic on its own.
///
/// Implemented by PgTaskStore (postgres) and MemoryTaskStore (tests).
#[async_trait]
pub trait TaskWriteStore: Send + Sync {
    /// Insert a draft without an id, or overwrite the row with the draft's id.
    /// Returns the record as committed, or `None` if the draft's id no longer
    /// names a row.
    async fn save(&self, draft: TaskDraft) -> Result<Option<TaskRecord>>;

    async fn find_by_id(&self, id: TaskId) -> Result<Option<TaskRecord>>;

    /// Remove a task. Removing an absent task is not an error.
    async fn delete_by_id(&self, id: TaskId) -> Result<()>;
}

// ---------------------------------------------------------------------------
// PgTaskStore (production, postgres)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskWriteStore for PgTaskStore {
    async fn save(&self, draft: TaskDraft) -> Result<Option<TaskRecord>> {
        let record = match draft.id {
            None => Some(
                sqlx::query_as::<_, TaskRecord>(
                    r#"
                    INSERT INTO tasks (description, completed)
                    VALUES ($1, $2)
                    RETURNING id, description, completed
                    "#,
                )
                .bind(&draft.description)
                .bind(draft.completed)
                .fetch_one(&self.pool)
                .await?,
            ),
            Some(id) => sqlx::query_as::<_, TaskRecord>(
                r#"
                UPDATE tasks SET description = $2, completed = $3
                WHERE id = $1
                RETURNING id, description, completed
                "#,
            )
            .bind(id)
            .bind(&draft.description)
            .bind(draft.completed)
            .fetch_optional(&self.pool)
            .await?,
        };

        Ok(record)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<TaskRecord>> {
        let row = sqlx::query_as::<_, TaskRecord>(
            "SELECT id, description, completed FROM tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryTaskStore (tests, no database required)
// ---------------------------------------------------------------------------

/// In-memory write store. Ids start at 1 and are never reused.
pub struct MemoryTaskStore {
    state: Mutex<MemoryTasks>,
}

struct MemoryTasks {
    next_id: TaskId,
    rows: BTreeMap<TaskId, TaskRecord>,
    failing_writes: usize,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryTasks {
                next_id: 1,
                rows: BTreeMap::new(),
                failing_writes: 0,
            }),
        }
    }

    /// Fail the next `n` saves or deletes, as a store that lost its connection would.
    pub async fn fail_next_writes(&self, n: usize) {
        self.state.lock().await.failing_writes = n;
    }

    /// All rows in id order (for test assertions).
    pub async fn records(&self) -> Vec<TaskRecord> {
        self.state.lock().await.rows.values().cloned().collect()
    }

    pub async fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.state.lock().await.rows.get(&id).cloned()
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTasks {
    fn check_write(&mut self) -> Result<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            bail!("write store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl TaskWriteStore for MemoryTaskStore {
    async fn save(&self, draft: TaskDraft) -> Result<Option<TaskRecord>> {
        let mut state = self.state.lock().await;
        state.check_write()?;

        let id = match draft.id {
            Some(id) if state.rows.contains_key(&id) => id,
            Some(_) => return Ok(None),
            None => {
                let id = state.next_id;
                state.next_id += 1;
                id
            }
        };

        let record = TaskRecord {
            id,
            description: draft.description,
            completed: draft.completed,
        };
        state.rows.insert(id, record.clone());
        Ok(Some(record))
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<TaskRecord>> {
        Ok(self.state.lock().await.rows.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.check_write()?;
        state.rows.remove(&id);
        Ok(())
    }
}
