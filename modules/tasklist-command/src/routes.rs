//! HTTP command routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tasklist_events::TaskId;

use crate::error::CommandError;
use crate::mutator::TaskMutator;
use crate::record::TaskRecord;

pub struct AppState {
    pub mutator: TaskMutator,
}

// --- Bodies ---
//
// The browser client speaks `task`/`done`. A client echoes a response back
// with `done` flipped to toggle a task, so requests accept the same shape.

#[derive(Debug, Serialize)]
pub struct TaskBody {
    pub id: TaskId,
    pub task: String,
    pub done: bool,
}

impl From<TaskRecord> for TaskBody {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            task: record.description,
            done: record.completed,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    #[serde(alias = "description")]
    pub task: String,
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(alias = "description")]
    pub task: String,
    #[serde(alias = "completed", default)]
    pub done: bool,
}

// --- Router ---

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/todos", post(create_task))
        .route("/api/todos/{id}", put(update_task).delete(delete_task))
        .with_state(state)
}

// --- Handlers ---

async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTaskRequest>,
) -> Response {
    match state.mutator.create(body.task).await {
        Ok(record) => Json(TaskBody::from(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TaskId>,
    Json(body): Json<UpdateTaskRequest>,
) -> Response {
    match state.mutator.update(id, body.task, body.done).await {
        Ok(record) => Json(TaskBody::from(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_task(State(state): State<Arc<AppState>>, Path(id): Path<TaskId>) -> Response {
    match state.mutator.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommandError::NotFound(_) => StatusCode::NOT_FOUND,
            CommandError::NotPersisted(_) => {
                warn!(error = ?self, "Command failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
