//! Row source: a cursor over the `records` table with pull-based
//! backpressure.
//!
//! A feeder task owns one pooled connection for the lifetime of the
//! stream and bridges sqlx's fetch cursor into a bounded channel. The
//! channel capacity is the pipeline's entire row lookahead; the consumer
//! pulling from [`RowSource::next`] is the sole driver of row
//! production.

use crate::db::{ColumnType, column_type};
use crate::error::StreamingError;
use crate::types::{FieldValue, Row};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row as _, types::Json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Rows buffered between the feeder task and the consumer
pub const ROW_CHANNEL_CAPACITY: usize = 256;

/// A forward-only cursor over the requested columns of `records`.
///
/// Restartable only by recreation. The underlying connection is released
/// exactly once: [`RowSource::close`] is idempotent, and dropping the
/// source is a backstop with the same effect.
#[derive(Debug)]
pub struct RowSource {
    rx: Option<mpsc::Receiver<Result<Row, StreamingError>>>,
    feeder: Option<JoinHandle<()>>,
}

impl RowSource {
    /// Validate the requested source columns against the catalog and
    /// start streaming them.
    ///
    /// A column that is not declared on `records` fails here with
    /// [`StreamingError::UnknownColumn`], before any connection is
    /// acquired.
    pub fn open(pool: SqlitePool, columns: &[String]) -> Result<Self, StreamingError> {
        let mut typed = Vec::with_capacity(columns.len());
        for name in columns {
            let ty = column_type(name).ok_or_else(|| StreamingError::UnknownColumn {
                column: name.clone(),
            })?;
            typed.push((name.clone(), ty));
        }

        // Column names are catalog-validated above, so quoting them
        // directly is safe; values never appear in the statement.
        let select = format!(
            "SELECT {} FROM records ORDER BY id",
            columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let (tx, rx) = mpsc::channel(ROW_CHANNEL_CAPACITY);
        let feeder = tokio::spawn(feed_rows(pool, select, typed, tx));

        Ok(Self {
            rx: Some(rx),
            feeder: Some(feeder),
        })
    }

    /// Pull the next row. `None` marks the end of the result set; a
    /// closed source yields `None` immediately.
    pub async fn next(&mut self) -> Option<Result<Row, StreamingError>> {
        match &mut self.rx {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Stop the stream and release the connection. Idempotent.
    pub fn close(&mut self) {
        // Dropping the receiver makes the feeder's next send fail, which
        // ends the task and returns its connection to the pool; aborting
        // covers a feeder parked on a slow cursor fetch.
        drop(self.rx.take());
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

impl Drop for RowSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Feeder task: owns the pooled connection and pushes decoded rows into
/// the bounded channel until the result set ends, an error occurs, or
/// the consumer goes away.
async fn feed_rows(
    pool: SqlitePool,
    select: String,
    columns: Vec<(String, ColumnType)>,
    tx: mpsc::Sender<Result<Row, StreamingError>>,
) {
    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            let _ = tx
                .send(Err(StreamingError::Source(format!(
                    "failed to acquire connection: {}",
                    e
                ))))
                .await;
            return;
        }
    };

    let mut rows = sqlx::query(&select).fetch(&mut *conn);

    while let Some(result) = rows.next().await {
        let item = match result {
            Ok(row) => decode_row(&row, &columns),
            Err(e) => Err(StreamingError::Source(format!("row fetch failed: {}", e))),
        };
        let is_err = item.is_err();

        if tx.send(item).await.is_err() {
            // Consumer cancelled; stop fetching
            return;
        }
        if is_err {
            return;
        }
    }
}

/// Decode one SQLite row into a [`Row`] using the catalog-declared
/// column types.
fn decode_row(
    row: &SqliteRow,
    columns: &[(String, ColumnType)],
) -> Result<Row, StreamingError> {
    let mut fields = Vec::with_capacity(columns.len());

    for (index, (name, ty)) in columns.iter().enumerate() {
        let value = match ty {
            ColumnType::Integer => row
                .try_get::<Option<i64>, _>(index)
                .map(|v| v.map_or(FieldValue::Null, FieldValue::Int)),
            ColumnType::Float => row
                .try_get::<Option<f64>, _>(index)
                .map(|v| v.map_or(FieldValue::Null, FieldValue::Float)),
            ColumnType::Text => row
                .try_get::<Option<String>, _>(index)
                .map(|v| v.map_or(FieldValue::Null, FieldValue::Text)),
            ColumnType::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(index)
                .map(|v| v.map_or(FieldValue::Null, FieldValue::Timestamp)),
            ColumnType::Json => row
                .try_get::<Option<Json<serde_json::Value>>, _>(index)
                .map(|v| v.map_or(FieldValue::Null, |json| FieldValue::Json(json.0))),
        }
        .map_err(|e| {
            StreamingError::Source(format!("failed to decode column {}: {}", name, e))
        })?;

        fields.push((name.clone(), value));
    }

    Ok(Row::new(fields))
}
