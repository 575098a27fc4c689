//! CSV encoder: header line plus one delimited line per row.

use crate::error::StreamingError;
use crate::types::{ColumnMapping, ExportFormat, FieldValue};

use super::{EncoderState, FormatEncoder, finalized_error};

/// Encodes rows as delimited text with a leading header line.
///
/// The header is the ordered target names and is always emitted, even
/// for a zero-row export. Quoting follows the standard rules (fields
/// containing the delimiter, a quote, or a line break are quoted with
/// internal quotes doubled). Nested structures land in the cell as
/// canonical JSON text.
pub struct CsvEncoder {
    targets: Vec<String>,
    state: EncoderState,
}

impl CsvEncoder {
    /// Create an encoder whose header is the mapping targets in order
    pub fn new(mappings: &[ColumnMapping]) -> Self {
        Self {
            targets: mappings.iter().map(|m| m.target.clone()).collect(),
            state: EncoderState::NotStarted,
        }
    }

    fn write_records(&self, records: &[Vec<String>]) -> Result<Vec<u8>, StreamingError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.write_record(record).map_err(csv_error)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv_error(csv::Error::from(e.into_error())))
    }
}

impl FormatEncoder for CsvEncoder {
    fn encode_row(&mut self, fields: &[(String, FieldValue)]) -> Result<Vec<u8>, StreamingError> {
        if self.state == EncoderState::Finalized {
            return Err(finalized_error(ExportFormat::Csv));
        }

        let cells: Vec<String> = fields
            .iter()
            .map(|(_, value)| value.canonical_text())
            .collect();

        let records: Vec<Vec<String>> = if self.state == EncoderState::NotStarted {
            vec![self.targets.clone(), cells]
        } else {
            vec![cells]
        };

        self.state = EncoderState::Streaming;
        self.write_records(&records)
    }

    fn finalize(&mut self) -> Result<Vec<u8>, StreamingError> {
        match self.state {
            EncoderState::Finalized => Err(finalized_error(ExportFormat::Csv)),
            EncoderState::Streaming => {
                self.state = EncoderState::Finalized;
                Ok(Vec::new())
            }
            EncoderState::NotStarted => {
                // Zero rows still get the header line
                self.state = EncoderState::Finalized;
                self.write_records(&[self.targets.clone()])
            }
        }
    }
}

fn csv_error(e: csv::Error) -> StreamingError {
    StreamingError::Encoding {
        format: ExportFormat::Csv,
        message: e.to_string(),
    }
}
