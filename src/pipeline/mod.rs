//! The streaming export pipeline.
//!
//! Row Source → Column Projector → Format Encoder → optional gzip →
//! Sink, driven end to end by [`ExportPipeline`]. Every stage is
//! pull-based: the sink's readiness to accept bytes is the sole driver
//! of row production, so result-set size never affects memory use.

use crate::error::{Error, Result, StreamingError};
use crate::registry::JobStore;
use crate::types::{ExportJob, JobStatus};
use bytes::Bytes;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

pub mod compression;
pub mod encoder;
pub mod projector;
pub mod sink;
pub mod source;

pub use compression::CompressionStage;
pub use encoder::{FormatEncoder, ParquetTypeMap, encoder_for};
pub use projector::project;
pub use sink::{ChannelSink, CountingSink, ExportSink};
pub use source::{ROW_CHANNEL_CAPACITY, RowSource};

/// Response metadata the download handler derives from a job before any
/// byte is produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseMeta {
    /// MIME type for the Content-Type header
    pub content_type: &'static str,

    /// Full Content-Disposition header value
    pub content_disposition: String,

    /// `Some("gzip")` when the body is gzip-framed
    pub content_encoding: Option<&'static str>,
}

impl ResponseMeta {
    /// Derive the response metadata for a job
    pub fn for_job(job: &ExportJob) -> Self {
        let gzip_active = job
            .compression
            .is_some_and(|c| c.applies_to(job.format));

        Self {
            content_type: job.format.content_type(),
            content_disposition: format!(
                "attachment; filename=\"export-{}.{}\"",
                job.export_id,
                job.format.extension()
            ),
            content_encoding: gzip_active.then_some("gzip"),
        }
    }
}

/// Wires the pipeline stages together and drives a job to a terminal
/// status.
pub struct ExportPipeline {
    registry: Arc<dyn JobStore>,
    pool: SqlitePool,
}

impl ExportPipeline {
    /// Create a pipeline over the given registry and connection pool
    pub fn new(registry: Arc<dyn JobStore>, pool: SqlitePool) -> Self {
        Self { registry, pool }
    }

    /// Run one export to completion.
    ///
    /// Marks the job `processing` up front and `completed` or `failed`
    /// at the end. On failure the error is also handed to the sink so a
    /// consumer that has not yet received bytes can produce a structured
    /// response; a mid-stream consumer observes a truncated document.
    /// The job is never retried here — a failed job is terminal.
    pub async fn run(&self, job: &ExportJob, sink: &mut dyn ExportSink) -> Result<()> {
        self.registry
            .update_status(&job.export_id, JobStatus::Processing)
            .await?;

        match self.stream(job, sink).await {
            Ok(()) => {
                sink.complete().await.map_err(Error::Streaming)?;
                self.registry
                    .update_status(&job.export_id, JobStatus::Completed)
                    .await?;
                tracing::info!(export_id = %job.export_id, format = %job.format, "Export completed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    export_id = %job.export_id,
                    format = %job.format,
                    error = %e,
                    "Export failed"
                );
                sink.fail(e.clone()).await;
                if let Err(update_err) = self
                    .registry
                    .update_status(&job.export_id, JobStatus::Failed)
                    .await
                {
                    tracing::warn!(
                        export_id = %job.export_id,
                        error = %update_err,
                        "Failed to record job failure"
                    );
                }
                Err(Error::Streaming(e))
            }
        }
    }

    /// Drive rows from the source through the stages into the sink
    async fn stream(
        &self,
        job: &ExportJob,
        sink: &mut dyn ExportSink,
    ) -> std::result::Result<(), StreamingError> {
        let sources: Vec<String> = job.columns.iter().map(|m| m.source.clone()).collect();

        let mut source = RowSource::open(self.pool.clone(), &sources)?;
        let mut encoder = encoder_for(job.format, &job.columns)?;
        let mut compression = CompressionStage::for_job(job.compression, job.format);

        let result = async {
            while let Some(row) = source.next().await {
                let row = row?;
                let fields = project(&row, &job.columns);
                let encoded = encoder.encode_row(&fields)?;
                if !encoded.is_empty() {
                    let compressed = compression.process(encoded)?;
                    if !compressed.is_empty() {
                        sink.write(Bytes::from(compressed)).await?;
                    }
                }
            }

            let mut tail = compression.process(encoder.finalize()?)?;
            tail.extend(compression.finish()?);
            if !tail.is_empty() {
                sink.write(Bytes::from(tail)).await?;
            }

            Ok(())
        }
        .await;

        // Exactly-once connection release on every outcome; close() is
        // idempotent so the Drop backstop stays a no-op.
        source.close();

        result
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
