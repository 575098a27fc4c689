//! Export job handlers: create, inspect, download, benchmark.

use crate::api::AppState;
use crate::benchmark;
use crate::error::{Error, Result};
use crate::pipeline::{ChannelSink, ExportPipeline, ResponseMeta};
use crate::types::{
    BenchmarkReport, CreateExportRequest, CreateExportResponse, ExportId, ExportJob,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Byte chunks buffered between a pipeline and its response body
const BODY_CHANNEL_CAPACITY: usize = 16;

/// POST /exports - Create an export job
#[utoipa::path(
    post,
    path = "/exports",
    tag = "exports",
    request_body = CreateExportRequest,
    responses(
        (status = 201, description = "Export job created", body = CreateExportResponse),
        (status = 400, description = "Malformed request", body = crate::error::ApiError)
    )
)]
pub async fn create_export(
    State(state): State<AppState>,
    Json(request): Json<CreateExportRequest>,
) -> Result<impl IntoResponse> {
    validate_create_request(&request)?;

    let job = state.registry.create(request).await;
    tracing::info!(export_id = %job.export_id, format = %job.format, "Export job accepted");

    Ok((
        StatusCode::CREATED,
        Json(CreateExportResponse {
            export_id: job.export_id,
            status: job.status,
        }),
    ))
}

/// Field-level checks beyond what deserialization enforces
fn validate_create_request(request: &CreateExportRequest) -> Result<()> {
    if request.columns.is_empty() {
        return Err(Error::validation_field(
            "columns",
            "must contain at least one column mapping",
        ));
    }
    for (index, mapping) in request.columns.iter().enumerate() {
        if mapping.source.is_empty() {
            return Err(Error::validation_field(
                format!("columns[{index}].source"),
                "must not be empty",
            ));
        }
        if mapping.target.is_empty() {
            return Err(Error::validation_field(
                format!("columns[{index}].target"),
                "must not be empty",
            ));
        }
    }
    Ok(())
}

/// GET /exports/{export_id} - Get an export job record
#[utoipa::path(
    get,
    path = "/exports/{export_id}",
    tag = "exports",
    params(
        ("export_id" = String, Path, description = "Export job identifier")
    ),
    responses(
        (status = 200, description = "The export job", body = ExportJob),
        (status = 404, description = "Unknown export id", body = crate::error::ApiError)
    )
)]
pub async fn get_export(
    State(state): State<AppState>,
    Path(export_id): Path<String>,
) -> Result<Json<ExportJob>> {
    let id = ExportId::from(export_id);
    state
        .registry
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound(id.to_string()))
}

/// GET /exports/{export_id}/download - Stream the encoded export
///
/// The pipeline runs concurrently with the response; the first output
/// chunk is awaited before any header goes out, so a failure that
/// occurs before the first byte still produces a structured error
/// response. A failure after that point truncates the stream.
#[utoipa::path(
    get,
    path = "/exports/{export_id}/download",
    tag = "exports",
    params(
        ("export_id" = String, Path, description = "Export job identifier")
    ),
    responses(
        (status = 200, description = "The encoded export body"),
        (status = 404, description = "Unknown export id", body = crate::error::ApiError),
        (status = 500, description = "Export failed before streaming began", body = crate::error::ApiError)
    )
)]
pub async fn download_export(
    State(state): State<AppState>,
    Path(export_id): Path<String>,
) -> Result<Response> {
    let id = ExportId::from(export_id);
    let job = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    let meta = ResponseMeta::for_job(&job);
    let (mut sink, mut rx) = ChannelSink::new(BODY_CHANNEL_CAPACITY);
    let pipeline = ExportPipeline::new(state.registry.clone(), state.database.pool().clone());

    tokio::spawn(async move {
        // Errors are recorded on the job and forwarded through the sink
        let _ = pipeline.run(&job, &mut sink).await;
    });

    match rx.recv().await {
        Some(Ok(first)) => {
            let body = Body::from_stream(
                tokio_stream::once(Ok(first)).chain(ReceiverStream::new(rx)),
            );
            streaming_response(&meta, body)
        }
        Some(Err(e)) => Err(Error::Streaming(e)),
        // The pipeline ended without a single byte or error; every
        // format emits framing, so respond with an empty document body
        None => streaming_response(&meta, Body::empty()),
    }
}

fn streaming_response(meta: &ResponseMeta, body: Body) -> Result<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, meta.content_type)
        .header(header::CONTENT_DISPOSITION, meta.content_disposition.clone());

    if let Some(encoding) = meta.content_encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    builder
        .body(body)
        .map_err(|e| Error::ApiServerError(e.to_string()))
}

/// GET /exports/benchmark - Run the benchmark harness
#[utoipa::path(
    get,
    path = "/exports/benchmark",
    tag = "exports",
    responses(
        (status = 200, description = "Benchmark measurements for every format", body = BenchmarkReport),
        (status = 500, description = "A benchmark run failed", body = crate::error::ApiError)
    )
)]
pub async fn run_export_benchmark(
    State(state): State<AppState>,
) -> Result<Json<BenchmarkReport>> {
    let report = benchmark::run_benchmark(state.registry.clone(), &state.database).await?;
    Ok(Json(report))
}
