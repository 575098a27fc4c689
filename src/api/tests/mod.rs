//! HTTP tests driving the real router with `tower::ServiceExt::oneshot`.

mod exports;

use crate::api::{AppState, create_router};
use crate::config::Config;
use crate::db::Database;
use crate::registry::InMemoryJobRegistry;
use crate::types::{ExportId, JobStatus};
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Build a router over a fresh seeded database.
///
/// Swagger UI stays off so the spec route goes through the plain
/// handler.
async fn test_app(rows: u64) -> (Router, AppState, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let config = Config {
        database_url: format!("sqlite:{}", dir.path().join("api.db").display()),
        swagger_ui: false,
        ..Config::default()
    };
    let db = Database::new(&config).await.expect("open database");
    if rows > 0 {
        db.seed_records(rows).await.expect("seed records");
    }

    let state = AppState::new(
        Arc::new(InMemoryJobRegistry::new()),
        Arc::new(db),
        Arc::new(config),
    );
    (create_router(state.clone()), state, dir)
}

/// Send one request through a clone of the router
async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router call")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("parse body")
}

/// The download handler runs the pipeline concurrently with the
/// response, so the final status update can land just after the last
/// body byte. Poll briefly instead of asserting immediately.
async fn wait_for_status(state: &AppState, id: &ExportId, expected: JobStatus) {
    for _ in 0..100 {
        if state.registry.get(id).await.map(|job| job.status) == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached {expected:?}");
}
