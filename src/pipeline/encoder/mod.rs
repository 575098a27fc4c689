//! Format encoders: turn projected rows into format-framed bytes.
//!
//! Every encoder is a small state machine
//! (`NotStarted → Streaming → Finalized`) so that framing that must
//! surround the rows (CSV header, JSON brackets, XML document envelope,
//! the parquet footer) is emitted exactly once and a zero-row export
//! still produces a well-formed document.

use crate::error::StreamingError;
use crate::types::{ColumnMapping, ExportFormat, FieldValue};

mod csv;
mod json;
mod parquet;
mod xml;

pub use csv::CsvEncoder;
pub use json::JsonEncoder;
pub use parquet::{ParquetEncoder, ParquetTypeMap};
pub use xml::XmlEncoder;

/// Lifecycle position of an encoder instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum EncoderState {
    /// No row has been encoded yet
    #[default]
    NotStarted,
    /// At least one row has been encoded
    Streaming,
    /// `finalize` has run; the encoder accepts nothing further
    Finalized,
}

/// Streaming encoder for one export format.
///
/// `encode_row` may return an empty vec when the format buffers
/// internally (parquet accumulates a row group before flushing).
pub trait FormatEncoder: Send {
    /// Encode one projected row, returning any output bytes now ready
    fn encode_row(&mut self, fields: &[(String, FieldValue)]) -> Result<Vec<u8>, StreamingError>;

    /// Emit closing framing (and any buffered data). The encoder is
    /// spent afterwards.
    fn finalize(&mut self) -> Result<Vec<u8>, StreamingError>;
}

/// Construct the encoder for a job's format and column mappings
pub fn encoder_for(
    format: ExportFormat,
    mappings: &[ColumnMapping],
) -> Result<Box<dyn FormatEncoder>, StreamingError> {
    Ok(match format {
        ExportFormat::Csv => Box::new(CsvEncoder::new(mappings)),
        ExportFormat::Json => Box::new(JsonEncoder::new()),
        ExportFormat::Xml => Box::new(XmlEncoder::new()),
        ExportFormat::Parquet => Box::new(ParquetEncoder::new(
            mappings,
            ParquetTypeMap::default(),
        )?),
    })
}

/// Error for use after `finalize`, shared by the encoders
pub(crate) fn finalized_error(format: ExportFormat) -> StreamingError {
    StreamingError::Encoding {
        format,
        message: "encoder already finalized".to_string(),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_an_encoder_for_every_format() {
        let mappings = vec![ColumnMapping::new("id", "id")];
        for format in ExportFormat::ALL {
            assert!(encoder_for(format, &mappings).is_ok(), "{format}");
        }
    }

    #[test]
    fn encoders_reject_rows_after_finalize() {
        let mappings = vec![ColumnMapping::new("id", "id")];
        for format in ExportFormat::ALL {
            let mut encoder = encoder_for(format, &mappings).unwrap();
            encoder.finalize().unwrap();
            let err = encoder
                .encode_row(&[("id".to_string(), FieldValue::Int(1))])
                .unwrap_err();
            assert!(matches!(err, StreamingError::Encoding { .. }), "{format}");
        }
    }

    #[test]
    fn encoders_reject_double_finalize() {
        let mappings = vec![ColumnMapping::new("id", "id")];
        for format in ExportFormat::ALL {
            let mut encoder = encoder_for(format, &mappings).unwrap();
            encoder.finalize().unwrap();
            assert!(encoder.finalize().is_err(), "{format}");
        }
    }
}
