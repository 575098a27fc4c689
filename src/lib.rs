//! # export-stream
//!
//! Streaming relational export service: pulls large result sets from a
//! database and streams them to clients as CSV, JSON, XML, or Parquet,
//! optionally gzip-compressed, with bounded memory regardless of
//! result-set size.
//!
//! ## Design Philosophy
//!
//! - **Pull-based end to end** - the sink's readiness drives row
//!   production; nothing buffers the full result set
//! - **One connection per export** - each pipeline owns one pooled
//!   connection for its whole stream and releases it exactly once
//! - **Forward-only jobs** - pending → processing → {completed | failed},
//!   never backward; a failed job is resubmitted, not retried
//! - **Library-first** - the binary is a thin wrapper over the crate
//!
//! ## Quick Start
//!
//! ```no_run
//! use export_stream::{AppState, Config, Database, InMemoryJobRegistry, start_api_server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let database = Arc::new(Database::new(&config).await?);
//!     let registry = Arc::new(InMemoryJobRegistry::new());
//!
//!     let state = AppState::new(registry, database, config);
//!     start_api_server(state).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Benchmark harness
pub mod benchmark;
/// Configuration types
pub mod config;
/// Database layer: pool, migrations, the records table
pub mod db;
/// Error types
pub mod error;
/// Streaming export pipeline
pub mod pipeline;
/// Export job registry
pub mod registry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use api::{AppState, start_api_server};
pub use config::Config;
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, Error, ErrorDetail, Result, StreamingError, ToHttpStatus,
};
pub use pipeline::{ExportPipeline, ExportSink, ResponseMeta};
pub use registry::{InMemoryJobRegistry, JobStore};
pub use types::{
    BenchmarkReport, BenchmarkResult, ColumnMapping, Compression, CreateExportRequest,
    CreateExportResponse, ExportFormat, ExportId, ExportJob, FieldValue, JobStatus, Row,
};
