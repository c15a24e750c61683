use std::sync::Arc;

use anyhow::Result;

use crate::store::TaskReadStore;
use crate::view::TaskView;

/// Query surface over the materialized view.
///
/// Results are eventually consistent: a mutation that has returned may not be
/// visible here yet.
#[derive(Clone)]
pub struct TaskReader {
    store: Arc<dyn TaskReadStore>,
}

impl TaskReader {
    pub fn new(store: Arc<dyn TaskReadStore>) -> Self {
        Self { store }
    }

    /// The current snapshot, ordered by task id.
    pub async fn list_all(&self) -> Result<Vec<TaskView>> {
        self.store.find_all().await
    }
}
