//! Job registry: exclusive owner of [`ExportJob`] records.
//!
//! The pipeline and the API only go through the [`JobStore`] contract, so
//! the storage mechanism can change without touching the core. The shipped
//! implementation is in-process; job records do not survive a restart.

use crate::error::{Error, Result};
use crate::types::{CreateExportRequest, ExportId, ExportJob, JobStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Contract the rest of the system uses to track export jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new pending job from a validated request
    async fn create(&self, request: CreateExportRequest) -> ExportJob;

    /// Look up a job by id
    async fn get(&self, id: &ExportId) -> Option<ExportJob>;

    /// Advance a job's status.
    ///
    /// Transitions only move forward along
    /// pending → processing → {completed | failed}; a backward or
    /// terminal-to-terminal transition is a no-op. Returns the job's
    /// status after the call, or [`Error::NotFound`] for an unknown id.
    async fn update_status(&self, id: &ExportId, status: JobStatus) -> Result<JobStatus>;
}

/// In-memory [`JobStore`] backed by a concurrent map
#[derive(Default)]
pub struct InMemoryJobRegistry {
    jobs: RwLock<HashMap<ExportId, ExportJob>>,
}

impl InMemoryJobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobRegistry {
    async fn create(&self, request: CreateExportRequest) -> ExportJob {
        let job = ExportJob {
            export_id: ExportId::generate(),
            status: JobStatus::Pending,
            format: request.format,
            columns: request.columns,
            compression: request.compression,
            created_at: Utc::now(),
        };

        let mut jobs = self.jobs.write().await;
        jobs.insert(job.export_id.clone(), job.clone());

        tracing::debug!(
            export_id = %job.export_id,
            format = %job.format,
            "Export job created"
        );

        job
    }

    async fn get(&self, id: &ExportId) -> Option<ExportJob> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn update_status(&self, id: &ExportId, status: JobStatus) -> Result<JobStatus> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        // Forward-only: equal or lower rank means the transition would
        // revisit a prior (or sibling terminal) state.
        if status.rank() > job.status.rank() {
            tracing::debug!(
                export_id = %id,
                from = ?job.status,
                to = ?status,
                "Export job status updated"
            );
            job.status = status;
        } else if status != job.status {
            tracing::debug!(
                export_id = %id,
                current = ?job.status,
                rejected = ?status,
                "Ignoring backward status transition"
            );
        }

        Ok(job.status)
    }
}
