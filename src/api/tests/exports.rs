use super::{body_bytes, body_json, get, post_json, send, test_app, wait_for_status};
use crate::types::{ExportId, JobStatus};
use axum::http::StatusCode;
use serde_json::json;
use std::io::Read;

fn csv_id_request() -> serde_json::Value {
    json!({
        "format": "csv",
        "columns": [{"source": "id", "target": "id"}]
    })
}

/// POST the request and return the new export id
async fn create(app: &axum::Router, request: &serde_json::Value) -> ExportId {
    let response = send(app, post_json("/exports", request)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    ExportId::from(body["exportId"].as_str().expect("exportId").to_string())
}

#[tokio::test]
async fn create_export_returns_a_pending_job() {
    let (app, state, _dir) = test_app(0).await;

    let id = create(&app, &csv_id_request()).await;

    let job = state.registry.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.columns.len(), 1);
}

#[tokio::test]
async fn create_export_rejects_empty_columns() {
    let (app, _state, _dir) = test_app(0).await;

    let response = send(
        &app,
        post_json("/exports", &json!({"format": "csv", "columns": []})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"]["field"], "columns");
}

#[tokio::test]
async fn create_export_rejects_blank_mapping_names() {
    let (app, _state, _dir) = test_app(0).await;

    let response = send(
        &app,
        post_json(
            "/exports",
            &json!({"format": "csv", "columns": [{"source": "", "target": "id"}]}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["field"], "columns[0].source");
}

#[tokio::test]
async fn create_export_rejects_unknown_format() {
    let (app, _state, _dir) = test_app(0).await;

    let response = send(
        &app,
        post_json(
            "/exports",
            &json!({"format": "yaml", "columns": [{"source": "id", "target": "id"}]}),
        ),
    )
    .await;

    // Deserialization failure surfaces as a client error
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_export_returns_the_job_record() {
    let (app, _state, _dir) = test_app(0).await;

    let id = create(&app, &csv_id_request()).await;
    let response = send(&app, get(&format!("/exports/{id}"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["exportId"], id.as_str());
    assert_eq!(body["status"], "pending");
    assert_eq!(body["format"], "csv");
    assert_eq!(body["columns"][0]["source"], "id");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn get_export_unknown_id_is_404() {
    let (app, _state, _dir) = test_app(0).await;

    let response = send(&app, get("/exports/no-such-job")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn download_streams_csv_with_headers() {
    let (app, state, _dir) = test_app(2).await;

    let id = create(&app, &csv_id_request()).await;
    let response = send(&app, get(&format!("/exports/{id}/download"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(
        response.headers()["content-disposition"],
        format!("attachment; filename=\"export-{id}.csv\"")
    );
    assert!(!response.headers().contains_key("content-encoding"));

    let body = body_bytes(response).await;
    assert_eq!(body, b"id\n1\n2\n");

    wait_for_status(&state, &id, JobStatus::Completed).await;
}

#[tokio::test]
async fn download_unknown_id_is_404() {
    let (app, _state, _dir) = test_app(0).await;

    let response = send(&app, get("/exports/no-such-job/download")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_with_unknown_column_is_a_structured_500() {
    let (app, state, _dir) = test_app(2).await;

    // Creation does not validate against the table catalog; the source
    // fails when the selection is issued
    let id = create(
        &app,
        &json!({
            "format": "csv",
            "columns": [{"source": "password", "target": "password"}]
        }),
    )
    .await;

    let response = send(&app, get(&format!("/exports/{id}/download"))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unknown_column");
    assert_eq!(body["error"]["details"]["column"], "password");

    wait_for_status(&state, &id, JobStatus::Failed).await;
}

#[tokio::test]
async fn download_gzip_sets_content_encoding() {
    let (app, state, _dir) = test_app(3).await;

    let id = create(
        &app,
        &json!({
            "format": "csv",
            "columns": [{"source": "id", "target": "id"}],
            "compression": "gzip"
        }),
    )
    .await;

    let response = send(&app, get(&format!("/exports/{id}/download"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-encoding"], "gzip");

    let body = body_bytes(response).await;
    let mut decoder = flate2::read::GzDecoder::new(body.as_slice());
    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded).unwrap();
    assert_eq!(decoded, "id\n1\n2\n3\n");

    wait_for_status(&state, &id, JobStatus::Completed).await;
}

#[tokio::test]
async fn download_parquet_is_never_gzip_encoded() {
    let (app, state, _dir) = test_app(2).await;

    let id = create(
        &app,
        &json!({
            "format": "parquet",
            "columns": [
                {"source": "id", "target": "id"},
                {"source": "name", "target": "name"}
            ],
            "compression": "gzip"
        }),
    )
    .await;

    let response = send(&app, get(&format!("/exports/{id}/download"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert!(!response.headers().contains_key("content-encoding"));
    assert!(
        response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .ends_with(".parquet\"")
    );

    let body = body_bytes(response).await;
    assert_eq!(&body[..4], b"PAR1");

    wait_for_status(&state, &id, JobStatus::Completed).await;
}

#[tokio::test]
async fn download_json_of_empty_table_is_empty_array() {
    let (app, _state, _dir) = test_app(0).await;

    let id = create(
        &app,
        &json!({
            "format": "json",
            "columns": [{"source": "id", "target": "id"}]
        }),
    )
    .await;

    let response = send(&app, get(&format!("/exports/{id}/download"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn benchmark_reports_every_format() {
    let (app, _state, _dir) = test_app(10).await;

    let response = send(&app, get("/exports/benchmark")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["datasetRowCount"], 10);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    let formats: Vec<&str> = results
        .iter()
        .map(|r| r["format"].as_str().unwrap())
        .collect();
    assert_eq!(formats, ["csv", "json", "xml", "parquet"]);
    for result in results {
        assert!(result["fileSizeBytes"].as_u64().unwrap() > 0);
        assert!(result["durationSeconds"].as_f64().unwrap() >= 0.0);
        assert!(result["peakMemoryMB"].as_f64().is_some());
    }
}
