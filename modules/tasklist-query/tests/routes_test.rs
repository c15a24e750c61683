//! HTTP query routes over an in-memory read store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tasklist_query::routes::{self, AppState};
use tasklist_query::{MemoryReadStore, TaskReadStore, TaskReader, TaskView};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn list_returns_views_in_id_order() {
    let store = Arc::new(MemoryReadStore::new());
    for (id, description) in [(2, "walk dog"), (1, "buy milk")] {
        store
            .upsert(TaskView {
                id,
                description: description.into(),
                completed: id == 2,
            })
            .await
            .unwrap();
    }
    let app = routes::router(Arc::new(AppState {
        reader: TaskReader::new(store),
    }));

    let response = app.oneshot(get("/api/todos")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"id": 1, "task": "buy milk", "done": false},
            {"id": 2, "task": "walk dog", "done": true},
        ])
    );
}

#[tokio::test]
async fn list_of_empty_view_is_empty_array() {
    let app = routes::router(Arc::new(AppState {
        reader: TaskReader::new(Arc::new(MemoryReadStore::new())),
    }));

    let response = app.oneshot(get("/api/todos")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"[]");
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = routes::router(Arc::new(AppState {
        reader: TaskReader::new(Arc::new(MemoryReadStore::new())),
    }));

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
