//! Parquet encoder: columnar output via Arrow builders and row groups.

use crate::error::StreamingError;
use crate::types::{ColumnMapping, ExportFormat, FieldValue};
use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::{Arc, Mutex};

use super::{EncoderState, FormatEncoder, finalized_error};

/// Rows buffered per flushed row group
const ROW_GROUP_ROWS: usize = 1024;

/// Maps source column names to Arrow data types for the parquet schema.
///
/// The default reproduces the established compatibility heuristic:
/// source `id` maps to `Int64`, source `value` to `Float64`, and every
/// other column to `Utf8`. Callers can override individual columns.
#[derive(Clone, Debug, Default)]
pub struct ParquetTypeMap {
    overrides: Vec<(String, DataType)>,
}

impl ParquetTypeMap {
    /// Declare an explicit type for one source column
    pub fn with_override(mut self, source: impl Into<String>, data_type: DataType) -> Self {
        self.overrides.push((source.into(), data_type));
        self
    }

    /// Resolve the Arrow type for a source column
    pub fn data_type(&self, source: &str) -> DataType {
        if let Some((_, ty)) = self.overrides.iter().find(|(name, _)| name == source) {
            return ty.clone();
        }
        match source {
            "id" => DataType::Int64,
            "value" => DataType::Float64,
            _ => DataType::Utf8,
        }
    }
}

/// Byte buffer shared between the Arrow writer and the encoder, so row
/// groups can be drained to the sink as the writer flushes them.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn drain(&self) -> Result<Vec<u8>, StreamingError> {
        let mut inner = self.0.lock().map_err(|_| StreamingError::Encoding {
            format: ExportFormat::Parquet,
            message: "output buffer poisoned".to_string(),
        })?;
        Ok(std::mem::take(&mut *inner))
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("output buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// One per-column Arrow builder, typed by the schema
enum ColumnBuilder {
    Int64(Int64Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
}

impl ColumnBuilder {
    fn for_type(data_type: &DataType) -> Result<Self, StreamingError> {
        match data_type {
            DataType::Int64 => Ok(ColumnBuilder::Int64(Int64Builder::new())),
            DataType::Float64 => Ok(ColumnBuilder::Float64(Float64Builder::new())),
            DataType::Utf8 => Ok(ColumnBuilder::Utf8(StringBuilder::new())),
            other => Err(StreamingError::Encoding {
                format: ExportFormat::Parquet,
                message: format!("unsupported column type {other}"),
            }),
        }
    }

    fn append(&mut self, target: &str, value: &FieldValue) -> Result<(), StreamingError> {
        match self {
            ColumnBuilder::Int64(builder) => match value {
                FieldValue::Null => builder.append_null(),
                FieldValue::Int(i) => builder.append_value(*i),
                other => return Err(type_mismatch(target, "integer", other)),
            },
            ColumnBuilder::Float64(builder) => match value {
                FieldValue::Null => builder.append_null(),
                FieldValue::Float(f) => builder.append_value(*f),
                FieldValue::Int(i) => builder.append_value(*i as f64),
                other => return Err(type_mismatch(target, "float", other)),
            },
            // Everything has a text rendering; nested structures land
            // as canonical JSON text
            ColumnBuilder::Utf8(builder) => match value {
                FieldValue::Null => builder.append_null(),
                other => builder.append_value(other.canonical_text()),
            },
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Int64(builder) => Arc::new(builder.finish()),
            ColumnBuilder::Float64(builder) => Arc::new(builder.finish()),
            ColumnBuilder::Utf8(builder) => Arc::new(builder.finish()),
        }
    }
}

fn type_mismatch(target: &str, expected: &str, got: &FieldValue) -> StreamingError {
    StreamingError::Encoding {
        format: ExportFormat::Parquet,
        message: format!("column {target} expects {expected}, got {got:?}"),
    }
}

/// Encodes rows into a parquet file, flushing fixed-size row groups.
///
/// The Arrow schema is fixed once per job from the column mappings and
/// a [`ParquetTypeMap`]; all columns are nullable. Output bytes become
/// available as row groups flush, and finalize writes the footer so the
/// file is self-describing.
pub struct ParquetEncoder {
    schema: Arc<Schema>,
    targets: Vec<String>,
    builders: Vec<ColumnBuilder>,
    pending_rows: usize,
    writer: Option<ArrowWriter<SharedBuffer>>,
    buffer: SharedBuffer,
    state: EncoderState,
}

impl ParquetEncoder {
    /// Derive the schema from the mappings and open the writer
    pub fn new(
        mappings: &[ColumnMapping],
        type_map: ParquetTypeMap,
    ) -> Result<Self, StreamingError> {
        let fields: Vec<Field> = mappings
            .iter()
            .map(|m| Field::new(m.target.clone(), type_map.data_type(&m.source), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let builders = schema
            .fields()
            .iter()
            .map(|field| ColumnBuilder::for_type(field.data_type()))
            .collect::<Result<Vec<_>, _>>()?;

        let buffer = SharedBuffer::default();
        let properties = WriterProperties::builder().build();
        let writer = ArrowWriter::try_new(buffer.clone(), Arc::clone(&schema), Some(properties))
            .map_err(parquet_error)?;

        Ok(Self {
            schema,
            targets: mappings.iter().map(|m| m.target.clone()).collect(),
            builders,
            pending_rows: 0,
            writer: Some(writer),
            buffer,
            state: EncoderState::NotStarted,
        })
    }

    /// Flush the buffered rows as one row group
    fn flush_row_group(&mut self) -> Result<(), StreamingError> {
        if self.pending_rows == 0 {
            return Ok(());
        }

        let arrays: Vec<ArrayRef> = self
            .builders
            .iter_mut()
            .map(ColumnBuilder::finish)
            .collect();
        let batch =
            RecordBatch::try_new(Arc::clone(&self.schema), arrays).map_err(|e| {
                StreamingError::Encoding {
                    format: ExportFormat::Parquet,
                    message: e.to_string(),
                }
            })?;

        let writer = self.writer.as_mut().ok_or_else(|| {
            finalized_error(ExportFormat::Parquet)
        })?;
        writer.write(&batch).map_err(parquet_error)?;
        writer.flush().map_err(parquet_error)?;
        self.pending_rows = 0;

        Ok(())
    }
}

impl FormatEncoder for ParquetEncoder {
    fn encode_row(&mut self, fields: &[(String, FieldValue)]) -> Result<Vec<u8>, StreamingError> {
        if self.state == EncoderState::Finalized {
            return Err(finalized_error(ExportFormat::Parquet));
        }
        if fields.len() != self.builders.len() {
            return Err(StreamingError::Encoding {
                format: ExportFormat::Parquet,
                message: format!(
                    "row has {} fields, schema has {}",
                    fields.len(),
                    self.builders.len()
                ),
            });
        }

        for (index, (_, value)) in fields.iter().enumerate() {
            let target = &self.targets[index];
            self.builders[index].append(target, value)?;
        }
        self.pending_rows += 1;
        self.state = EncoderState::Streaming;

        if self.pending_rows >= ROW_GROUP_ROWS {
            self.flush_row_group()?;
        }

        self.buffer.drain()
    }

    fn finalize(&mut self) -> Result<Vec<u8>, StreamingError> {
        if self.state == EncoderState::Finalized {
            return Err(finalized_error(ExportFormat::Parquet));
        }

        self.flush_row_group()?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| finalized_error(ExportFormat::Parquet))?;
        writer.close().map_err(parquet_error)?;

        self.state = EncoderState::Finalized;
        self.buffer.drain()
    }
}

fn parquet_error(e: parquet::errors::ParquetError) -> StreamingError {
    StreamingError::Encoding {
        format: ExportFormat::Parquet,
        message: e.to_string(),
    }
}
