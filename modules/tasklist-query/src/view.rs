use tasklist_events::TaskId;

/// A task as the read side serves it. `id` is copied from the write side.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskView {
    pub id: TaskId,
    pub description: String,
    pub completed: bool,
}
