//! The `records` table: column catalog, seeding, and counts.
//!
//! `records` is the one logical table exports are issued against. The
//! catalog below is the authority on which source columns a mapping may
//! name and how each decodes into a [`crate::types::FieldValue`].

use crate::error::{DatabaseError, Error, Result};
use chrono::{Duration, TimeZone, Utc};

use super::Database;

/// Declared type of a `records` column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit signed integer
    Integer,
    /// Double-precision float
    Float,
    /// Plain text
    Text,
    /// UTC timestamp stored as RFC 3339 text
    Timestamp,
    /// Nested JSON document stored as text, nullable
    Json,
}

/// The declared columns of the `records` table, in schema order
pub const RECORD_COLUMNS: [(&str, ColumnType); 5] = [
    ("id", ColumnType::Integer),
    ("created_at", ColumnType::Timestamp),
    ("name", ColumnType::Text),
    ("value", ColumnType::Float),
    ("metadata", ColumnType::Json),
];

/// Look up the declared type of a `records` column by name
pub fn column_type(name: &str) -> Option<ColumnType> {
    RECORD_COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, ty)| *ty)
}

impl Database {
    /// Number of rows currently in the `records` table
    pub async fn count_records(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count records: {}",
                    e
                )))
            })?;
        Ok(count as u64)
    }

    /// Fill the `records` table with deterministic synthetic rows.
    ///
    /// Used for local runs, tests, and benchmark datasets. Every third
    /// row gets a NULL metadata column so exports exercise the null
    /// rendering paths.
    pub async fn seed_records(&self, count: u64) -> Result<()> {
        tracing::info!(rows = count, "Seeding records table");

        let base = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| {
                Error::Database(DatabaseError::QueryFailed(
                    "Invalid seed base timestamp".to_string(),
                ))
            })?;

        let mut tx = self.pool().begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin seed transaction: {}",
                e
            )))
        })?;

        for i in 1..=count {
            let created_at = base + Duration::seconds(i as i64);
            let name = format!("record-{:08}", i);
            let value = (i as f64) * 0.25;
            let metadata = if i % 3 == 0 {
                None
            } else {
                Some(
                    serde_json::json!({
                        "index": i,
                        "tags": ["synthetic", if i % 2 == 0 { "even" } else { "odd" }],
                    })
                    .to_string(),
                )
            };

            sqlx::query(
                "INSERT INTO records (created_at, name, value, metadata) VALUES (?, ?, ?, ?)",
            )
            .bind(created_at)
            .bind(&name)
            .bind(value)
            .bind(&metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert seed row {}: {}",
                    i, e
                )))
            })?;
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit seed transaction: {}",
                e
            )))
        })?;

        tracing::info!(rows = count, "Records table seeded");
        Ok(())
    }
}
