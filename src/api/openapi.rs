//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the export-stream
//! REST API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the export-stream REST API
///
/// The spec can be accessed via:
/// - `/api-docs/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "export-stream REST API",
        version = "0.1.0",
        description = "Streaming relational export service: create export jobs, download their encoded output, and benchmark the pipeline",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Export jobs
        crate::api::routes::create_export,
        crate::api::routes::get_export,
        crate::api::routes::download_export,
        crate::api::routes::run_export_benchmark,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::ExportId,
        crate::types::ExportFormat,
        crate::types::Compression,
        crate::types::JobStatus,
        crate::types::ColumnMapping,
        crate::types::CreateExportRequest,
        crate::types::CreateExportResponse,
        crate::types::ExportJob,
        crate::types::BenchmarkResult,
        crate::types::BenchmarkReport,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "exports", description = "Export jobs - Create jobs, inspect their status, stream their output, and run benchmarks"),
        (name = "system", description = "System endpoints - Health checks and the OpenAPI document"),
    )
)]
pub struct ApiDoc;
