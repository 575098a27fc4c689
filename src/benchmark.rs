//! Benchmark harness: one pipeline run per format against the full
//! `records` table.
//!
//! Runs are strictly sequential so they never contend for connections
//! or skew each other's measurements. Output goes to a counting discard
//! sink; peak resident memory is sampled on a fixed interval while each
//! run is in flight.

use crate::db::Database;
use crate::error::Result;
use crate::pipeline::{CountingSink, ExportPipeline};
use crate::registry::JobStore;
use crate::types::{
    BenchmarkReport, BenchmarkResult, ColumnMapping, CreateExportRequest, ExportFormat,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Interval between resident-memory samples
const MEMORY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The canonical column set every benchmark run exports
pub fn benchmark_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::new("id", "id"),
        ColumnMapping::new("created_at", "createdAt"),
        ColumnMapping::new("name", "name"),
        ColumnMapping::new("value", "value"),
        ColumnMapping::new("metadata", "metadata"),
    ]
}

/// Run the pipeline once per supported format and collect measurements.
///
/// The reported row count is measured from the table at run time, so
/// the report always matches what was actually streamed.
pub async fn run_benchmark(registry: Arc<dyn JobStore>, db: &Database) -> Result<BenchmarkReport> {
    let dataset_row_count = db.count_records().await?;
    tracing::info!(rows = dataset_row_count, "Starting benchmark run");

    let pipeline = ExportPipeline::new(Arc::clone(&registry), db.pool().clone());

    let mut results = Vec::with_capacity(ExportFormat::ALL.len());
    for format in ExportFormat::ALL {
        let result = run_one(&registry, &pipeline, format).await?;
        tracing::info!(
            format = %result.format,
            duration_seconds = result.duration_seconds,
            file_size_bytes = result.file_size_bytes,
            peak_memory_mb = result.peak_memory_mb,
            "Benchmark format finished"
        );
        results.push(result);
    }

    Ok(BenchmarkReport {
        dataset_row_count,
        results,
    })
}

/// One uncompressed export of the canonical columns, measured
async fn run_one(
    registry: &Arc<dyn JobStore>,
    pipeline: &ExportPipeline,
    format: ExportFormat,
) -> Result<BenchmarkResult> {
    let job = registry
        .create(CreateExportRequest {
            format,
            columns: benchmark_columns(),
            compression: None,
        })
        .await;

    let peak_rss_kb = Arc::new(AtomicU64::new(current_rss_kb()));
    let sampler = tokio::spawn({
        let peak_rss_kb = Arc::clone(&peak_rss_kb);
        async move {
            let mut interval = tokio::time::interval(MEMORY_POLL_INTERVAL);
            loop {
                interval.tick().await;
                peak_rss_kb.fetch_max(current_rss_kb(), Ordering::Relaxed);
            }
        }
    });

    let mut sink = CountingSink::new();
    let started = Instant::now();
    let run_result = pipeline.run(&job, &mut sink).await;
    let duration = started.elapsed();

    sampler.abort();
    run_result?;

    Ok(BenchmarkResult {
        format,
        duration_seconds: duration.as_secs_f64(),
        file_size_bytes: sink.bytes_written(),
        peak_memory_mb: round2(peak_rss_kb.load(Ordering::Relaxed) as f64 / 1024.0),
    })
}

/// Round to two decimal places for the report
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Current resident set size in kB, from `/proc/self/status`.
///
/// Only meaningful on Linux; other platforms report zero.
fn current_rss_kb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmRSS:")
                    && let Some(kb) = rest.split_whitespace().next()
                    && let Ok(kb) = kb.parse()
                {
                    return kb;
                }
            }
        }
        0
    }
    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}
