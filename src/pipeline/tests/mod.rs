//! Pipeline tests against real temp-file databases.


use crate::config::Config;
use crate::db::Database;
use crate::registry::{InMemoryJobRegistry, JobStore};
use crate::types::{ColumnMapping, Compression, CreateExportRequest, ExportFormat, ExportJob};
use std::sync::Arc;
use tempfile::TempDir;

/// Open a seeded database in a temp directory with a small pool so
/// leaked connections show up as failures.
async fn seeded_db(rows: u64) -> (Database, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let config = Config {
        database_url: format!("sqlite:{}", dir.path().join("test.db").display()),
        pool_size: 1,
        acquire_timeout_secs: 5,
        ..Config::default()
    };
    let db = Database::new(&config).await.expect("open database");
    if rows > 0 {
        db.seed_records(rows).await.expect("seed records");
    }
    (db, dir)
}

/// Create a job in a fresh registry
async fn make_job(
    registry: &Arc<InMemoryJobRegistry>,
    format: ExportFormat,
    columns: Vec<ColumnMapping>,
    compression: Option<Compression>,
) -> ExportJob {
    registry
        .create(CreateExportRequest {
            format,
            columns,
            compression,
        })
        .await
}
