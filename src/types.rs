//! Core types for export-stream

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for an export job
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ExportId(pub String);

impl ExportId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExportId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ExportId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ExportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output encoding for an export
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Delimited tabular text with a header line
    Csv,
    /// A single JSON array of row objects, streamed incrementally
    Json,
    /// An XML document with one element per row
    Xml,
    /// Columnar binary (Apache Parquet)
    Parquet,
}

impl ExportFormat {
    /// All supported formats, in benchmark execution order
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Xml,
        ExportFormat::Parquet,
    ];

    /// MIME type sent in the download response
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Xml => "application/xml",
            ExportFormat::Parquet => "application/octet-stream",
        }
    }

    /// File extension used in the attachment filename
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
            ExportFormat::Parquet => "parquet",
        }
    }

    /// Wire name of the format (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        self.extension()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional compression applied to the encoded byte stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// RFC 1952 gzip framing
    Gzip,
}

impl Compression {
    /// Whether this compression applies to the given format.
    ///
    /// Parquet output is self-contained (row groups carry their own
    /// compression) and is never wrapped in an outer gzip frame, even
    /// when the job requests it.
    pub fn applies_to(&self, format: ExportFormat) -> bool {
        match self {
            Compression::Gzip => format != ExportFormat::Parquet,
        }
    }
}

/// State of an export job, advancing forward only
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet streaming
    Pending,
    /// A download request is actively streaming
    Processing,
    /// Stream finished and all bytes reached the sink
    Completed,
    /// Stream aborted by a source, encoding, or sink failure
    Failed,
}

impl JobStatus {
    /// Position in the pending → processing → terminal progression,
    /// used to reject backward transitions
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed => 2,
            JobStatus::Failed => 2,
        }
    }

    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Maps a source column on the underlying table to an output field name.
///
/// The order of mappings in a job fixes the output field order for the
/// row-oriented formats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnMapping {
    /// Column name on the underlying table
    pub source: String,

    /// Field name in the encoded output
    pub target: String,
}

impl ColumnMapping {
    /// Convenience constructor
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Request body for creating an export job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateExportRequest {
    /// Output encoding
    pub format: ExportFormat,

    /// Ordered, non-empty list of column mappings
    pub columns: Vec<ColumnMapping>,

    /// Optional compression ("gzip")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
}

/// An export job tracked by the registry
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    /// Unique job identifier
    pub export_id: ExportId,

    /// Current state
    pub status: JobStatus,

    /// Output encoding
    pub format: ExportFormat,

    /// Ordered column mappings
    pub columns: Vec<ColumnMapping>,

    /// Optional compression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,

    /// When the job was created
    pub created_at: DateTime<Utc>,
}

/// A single value pulled from the data source.
///
/// Rows carry one of these per selected column. Text formats render
/// scalars with [`FieldValue::canonical_text`]; the structured and markup
/// encoders apply their own policies for the `Json` variant.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// SQL NULL or absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Text
    Text(String),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Nested structure (parsed JSON document)
    Json(serde_json::Value),
}

impl FieldValue {
    /// Render the value as plain text for cell-oriented output.
    ///
    /// Null renders empty, timestamps as RFC 3339 with millisecond
    /// precision, nested structures as their canonical JSON text.
    pub fn canonical_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            FieldValue::Json(v) => v.to_string(),
        }
    }

    /// Convert to a JSON value for the structured encoder.
    ///
    /// Nested structures embed as-is rather than being stringified.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Int(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, Into::into)
            }
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Timestamp(ts) => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Whether the value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One row pulled from the data source: ordered `(source name, value)`
/// pairs matching the job's requested source columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Values in the order the source columns were requested
    pub fields: Vec<(String, FieldValue)>,
}

impl Row {
    /// Build a row from `(name, value)` pairs
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    /// Look up a field by source name
    pub fn get(&self, source: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, value)| value)
    }
}

/// Response body for a created export job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExportResponse {
    /// Identifier to use for the download request
    pub export_id: ExportId,

    /// Always "pending" on creation
    pub status: JobStatus,
}

/// Measurements for one benchmark run
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    /// Format exercised by the run
    pub format: ExportFormat,

    /// Wall-clock duration of the full pipeline run
    pub duration_seconds: f64,

    /// Total bytes the sink accepted
    pub file_size_bytes: u64,

    /// Peak resident memory observed during the run, rounded to 2 dp
    #[serde(rename = "peakMemoryMB")]
    pub peak_memory_mb: f64,
}

/// Response body for the benchmark endpoint
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    /// Number of rows in the benchmark table at run time
    pub dataset_row_count: u64,

    /// One entry per supported format, in execution order
    pub results: Vec<BenchmarkResult>,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // --- ExportFormat wire names and response metadata ---

    #[test]
    fn format_serializes_to_lowercase_wire_names() {
        let cases = [
            (ExportFormat::Csv, "\"csv\""),
            (ExportFormat::Json, "\"json\""),
            (ExportFormat::Xml, "\"xml\""),
            (ExportFormat::Parquet, "\"parquet\""),
        ];

        for (format, expected) in cases {
            assert_eq!(serde_json::to_string(&format).unwrap(), expected);
            let parsed: ExportFormat = serde_json::from_str(expected).unwrap();
            assert_eq!(parsed, format);
        }
    }

    #[test]
    fn format_content_types_match_download_headers() {
        assert_eq!(ExportFormat::Csv.content_type(), "text/csv");
        assert_eq!(ExportFormat::Json.content_type(), "application/json");
        assert_eq!(ExportFormat::Xml.content_type(), "application/xml");
        assert_eq!(
            ExportFormat::Parquet.content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn format_extension_equals_wire_name() {
        for format in ExportFormat::ALL {
            assert_eq!(
                format.extension(),
                format.as_str(),
                "attachment filenames reuse the wire name as the extension"
            );
        }
    }

    #[test]
    fn unknown_format_fails_deserialization() {
        let result = serde_json::from_str::<ExportFormat>("\"yaml\"");
        assert!(result.is_err(), "unsupported formats must be rejected");
    }

    // --- Compression policy ---

    #[test]
    fn gzip_applies_to_all_text_formats() {
        assert!(Compression::Gzip.applies_to(ExportFormat::Csv));
        assert!(Compression::Gzip.applies_to(ExportFormat::Json));
        assert!(Compression::Gzip.applies_to(ExportFormat::Xml));
    }

    #[test]
    fn gzip_never_applies_to_parquet() {
        assert!(
            !Compression::Gzip.applies_to(ExportFormat::Parquet),
            "parquet output must not be wrapped in gzip framing even when requested"
        );
    }

    // --- JobStatus progression ---

    #[test]
    fn status_ranks_are_monotonic_along_the_lifecycle() {
        assert!(JobStatus::Pending.rank() < JobStatus::Processing.rank());
        assert!(JobStatus::Processing.rank() < JobStatus::Completed.rank());
        assert!(JobStatus::Processing.rank() < JobStatus::Failed.rank());
    }

    #[test]
    fn completed_and_failed_share_terminal_rank() {
        assert_eq!(
            JobStatus::Completed.rank(),
            JobStatus::Failed.rank(),
            "the two terminal states are siblings, neither follows the other"
        );
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    // --- FieldValue rendering ---

    #[test]
    fn canonical_text_renders_null_as_empty() {
        assert_eq!(FieldValue::Null.canonical_text(), "");
    }

    #[test]
    fn canonical_text_renders_scalars_plainly() {
        assert_eq!(FieldValue::Int(42).canonical_text(), "42");
        assert_eq!(FieldValue::Float(42.5).canonical_text(), "42.5");
        assert_eq!(FieldValue::Float(42.0).canonical_text(), "42");
        assert_eq!(FieldValue::Bool(true).canonical_text(), "true");
        assert_eq!(
            FieldValue::Text("hello".to_string()).canonical_text(),
            "hello"
        );
    }

    #[test]
    fn canonical_text_renders_timestamps_as_rfc3339_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            FieldValue::Timestamp(ts).canonical_text(),
            "2024-01-15T10:30:00.000Z"
        );
    }

    #[test]
    fn canonical_text_renders_nested_structures_as_compact_json() {
        let value = FieldValue::Json(serde_json::json!({"tags": ["a", "b"], "n": 1}));
        assert_eq!(value.canonical_text(), r#"{"tags":["a","b"],"n":1}"#);
    }

    #[test]
    fn to_json_embeds_nested_structures_without_stringifying() {
        let nested = serde_json::json!({"k": [1, 2]});
        let value = FieldValue::Json(nested.clone());
        assert_eq!(value.to_json(), nested);
    }

    #[test]
    fn to_json_renders_timestamp_as_string() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FieldValue::Timestamp(ts).to_json(),
            serde_json::json!("2024-06-01T00:00:00.000Z")
        );
    }

    #[test]
    fn to_json_maps_nan_to_null() {
        assert_eq!(
            FieldValue::Float(f64::NAN).to_json(),
            serde_json::Value::Null,
            "NaN has no JSON representation and must degrade to null"
        );
    }

    // --- Request/job wire shapes ---

    #[test]
    fn create_request_parses_minimal_body() {
        let body = r#"{"format":"csv","columns":[{"source":"id","target":"id"}]}"#;
        let request: CreateExportRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.format, ExportFormat::Csv);
        assert_eq!(request.columns.len(), 1);
        assert!(request.compression.is_none());
    }

    #[test]
    fn create_request_parses_gzip_compression() {
        let body =
            r#"{"format":"json","columns":[{"source":"id","target":"id"}],"compression":"gzip"}"#;
        let request: CreateExportRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.compression, Some(Compression::Gzip));
    }

    #[test]
    fn create_request_rejects_unknown_compression() {
        let body =
            r#"{"format":"json","columns":[{"source":"id","target":"id"}],"compression":"zstd"}"#;
        assert!(serde_json::from_str::<CreateExportRequest>(body).is_err());
    }

    #[test]
    fn export_job_serializes_camel_case_fields() {
        let job = ExportJob {
            export_id: ExportId::from("abc"),
            status: JobStatus::Pending,
            format: ExportFormat::Csv,
            columns: vec![ColumnMapping::new("id", "id")],
            compression: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["exportId"], "abc");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00Z");
        assert!(
            json.get("compression").is_none(),
            "absent compression must be omitted, not null"
        );
    }

    #[test]
    fn row_lookup_by_source_name() {
        let row = Row::new(vec![
            ("id".to_string(), FieldValue::Int(7)),
            ("name".to_string(), FieldValue::Text("x".to_string())),
        ]);
        assert_eq!(row.get("id"), Some(&FieldValue::Int(7)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn export_id_generates_unique_values() {
        let a = ExportId::generate();
        let b = ExportId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36, "hyphenated UUID text form");
    }
}
