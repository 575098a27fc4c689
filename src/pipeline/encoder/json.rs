//! JSON encoder: one streamed array of row objects.

use crate::error::StreamingError;
use crate::types::{ExportFormat, FieldValue};

use super::{EncoderState, FormatEncoder, finalized_error};

/// Encodes rows as a single JSON array, emitted incrementally.
///
/// `[` goes out before the first row, each later row is preceded by a
/// comma, and finalize closes with `]`. A zero-row export is exactly
/// `[]`. Object member order equals the mapping order, and nested
/// structures embed structurally rather than as strings.
#[derive(Default)]
pub struct JsonEncoder {
    state: EncoderState,
}

impl JsonEncoder {
    /// Create an encoder at the start of its array
    pub fn new() -> Self {
        Self {
            state: EncoderState::NotStarted,
        }
    }
}

impl FormatEncoder for JsonEncoder {
    fn encode_row(&mut self, fields: &[(String, FieldValue)]) -> Result<Vec<u8>, StreamingError> {
        if self.state == EncoderState::Finalized {
            return Err(finalized_error(ExportFormat::Json));
        }

        // serde_json's preserve_order map keeps insertion order, which
        // is the mapping order by construction
        let mut object = serde_json::Map::with_capacity(fields.len());
        for (target, value) in fields {
            object.insert(target.clone(), value.to_json());
        }

        let mut out = Vec::new();
        out.push(if self.state == EncoderState::NotStarted {
            b'['
        } else {
            b','
        });
        serde_json::to_writer(&mut out, &object).map_err(|e| StreamingError::Encoding {
            format: ExportFormat::Json,
            message: e.to_string(),
        })?;

        self.state = EncoderState::Streaming;
        Ok(out)
    }

    fn finalize(&mut self) -> Result<Vec<u8>, StreamingError> {
        match self.state {
            EncoderState::Finalized => Err(finalized_error(ExportFormat::Json)),
            EncoderState::Streaming => {
                self.state = EncoderState::Finalized;
                Ok(b"]".to_vec())
            }
            EncoderState::NotStarted => {
                self.state = EncoderState::Finalized;
                Ok(b"[]".to_vec())
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn encode_all(rows: &[Vec<(String, FieldValue)>]) -> String {
        let mut encoder = JsonEncoder::new();
        let mut out = Vec::new();
        for row in rows {
            out.extend(encoder.encode_row(row).unwrap());
        }
        out.extend(encoder.finalize().unwrap());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn zero_rows_yield_exactly_empty_brackets() {
        assert_eq!(encode_all(&[]), "[]");
    }

    #[test]
    fn single_row_is_a_one_element_array() {
        let output = encode_all(&[vec![
            ("id".to_string(), FieldValue::Int(1)),
            ("name".to_string(), FieldValue::Text("alpha".to_string())),
        ]]);
        assert_eq!(output, r#"[{"id":1,"name":"alpha"}]"#);
    }

    #[test]
    fn rows_are_comma_separated() {
        let output = encode_all(&[
            vec![("id".to_string(), FieldValue::Int(1))],
            vec![("id".to_string(), FieldValue::Int(2))],
        ]);
        assert_eq!(output, r#"[{"id":1},{"id":2}]"#);
    }

    #[test]
    fn member_order_follows_projection_order() {
        let output = encode_all(&[vec![
            ("z".to_string(), FieldValue::Int(1)),
            ("a".to_string(), FieldValue::Int(2)),
        ]]);
        assert_eq!(output, r#"[{"z":1,"a":2}]"#);
    }

    #[test]
    fn nested_structures_embed_structurally() {
        let output = encode_all(&[vec![(
            "metadata".to_string(),
            FieldValue::Json(serde_json::json!({"tags": ["a", "b"]})),
        )]]);
        assert_eq!(output, r#"[{"metadata":{"tags":["a","b"]}}]"#);
    }

    #[test]
    fn null_and_timestamp_render_as_json_values() {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let output = encode_all(&[vec![
            ("metadata".to_string(), FieldValue::Null),
            ("createdAt".to_string(), FieldValue::Timestamp(ts)),
        ]]);
        assert_eq!(
            output,
            r#"[{"metadata":null,"createdAt":"2024-01-15T10:30:00.000Z"}]"#
        );
    }

    #[test]
    fn output_parses_back_as_json() {
        let output = encode_all(&[
            vec![("id".to_string(), FieldValue::Int(1))],
            vec![("id".to_string(), FieldValue::Int(2))],
        ]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }
}
