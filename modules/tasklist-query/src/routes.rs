//! HTTP query routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::warn;

use tasklist_events::TaskId;

use crate::reader::TaskReader;
use crate::view::TaskView;

pub struct AppState {
    pub reader: TaskReader,
}

/// A task as the browser client reads it.
#[derive(Debug, Serialize)]
pub struct TaskBody {
    pub id: TaskId,
    pub task: String,
    pub done: bool,
}

impl From<TaskView> for TaskBody {
    fn from(view: TaskView) -> Self {
        Self {
            id: view.id,
            task: view.description,
            done: view.completed,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/todos", get(list_tasks))
        .with_state(state)
}

async fn list_tasks(State(state): State<Arc<AppState>>) -> Response {
    match state.reader.list_all().await {
        Ok(views) => {
            let body: Vec<TaskBody> = views.into_iter().map(TaskBody::from).collect();
            Json(body).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load task views");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "failed to load tasks" })),
            )
                .into_response()
        }
    }
}
