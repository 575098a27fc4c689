//! XML encoder: a `<records>` document with one `<record>` per row.

use crate::error::StreamingError;
use crate::types::{ExportFormat, FieldValue};

use super::{EncoderState, FormatEncoder, finalized_error};

const DOCUMENT_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><records>";

/// Encodes rows as an XML document.
///
/// The declaration and the opening `<records>` go out before the first
/// row (or at finalize for a zero-row export, so the document is always
/// well-formed). Each row is a `<record>` with one child element per
/// target field; finalize closes `</records>`.
///
/// Nested-value policy: a nested structure expands recursively into
/// child elements named by the structure's own keys, wrapped inside the
/// target field's element. Array entries expand under their index
/// position. This mirrors the shape downstream consumers already parse;
/// index-named elements are kept for compatibility even though they are
/// not schema-valid names. Null renders as an empty element.
#[derive(Default)]
pub struct XmlEncoder {
    state: EncoderState,
}

impl XmlEncoder {
    /// Create an encoder at the start of its document
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormatEncoder for XmlEncoder {
    fn encode_row(&mut self, fields: &[(String, FieldValue)]) -> Result<Vec<u8>, StreamingError> {
        if self.state == EncoderState::Finalized {
            return Err(finalized_error(ExportFormat::Xml));
        }

        let mut out = String::new();
        if self.state == EncoderState::NotStarted {
            out.push_str(DOCUMENT_HEADER);
        }

        out.push_str("<record>");
        for (target, value) in fields {
            out.push('<');
            out.push_str(target);
            out.push('>');
            write_value(&mut out, value);
            out.push_str("</");
            out.push_str(target);
            out.push('>');
        }
        out.push_str("</record>");

        self.state = EncoderState::Streaming;
        Ok(out.into_bytes())
    }

    fn finalize(&mut self) -> Result<Vec<u8>, StreamingError> {
        match self.state {
            EncoderState::Finalized => Err(finalized_error(ExportFormat::Xml)),
            EncoderState::Streaming => {
                self.state = EncoderState::Finalized;
                Ok(b"</records>".to_vec())
            }
            EncoderState::NotStarted => {
                self.state = EncoderState::Finalized;
                Ok(format!("{}</records>", DOCUMENT_HEADER).into_bytes())
            }
        }
    }
}

fn write_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Null => {}
        FieldValue::Json(json) => write_json(out, json),
        scalar => escape_into(out, &scalar.canonical_text()),
    }
}

/// Recursive expansion of a nested structure into child elements
fn write_json(out: &mut String, json: &serde_json::Value) {
    match json {
        serde_json::Value::Null => {}
        serde_json::Value::Object(map) => {
            for (key, inner) in map {
                out.push('<');
                out.push_str(key);
                out.push('>');
                write_json(out, inner);
                out.push_str("</");
                out.push_str(key);
                out.push('>');
            }
        }
        serde_json::Value::Array(items) => {
            for (index, inner) in items.iter().enumerate() {
                let key = index.to_string();
                out.push('<');
                out.push_str(&key);
                out.push('>');
                write_json(out, inner);
                out.push_str("</");
                out.push_str(&key);
                out.push('>');
            }
        }
        serde_json::Value::String(s) => escape_into(out, s),
        serde_json::Value::Number(n) => escape_into(out, &n.to_string()),
        serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
    }
}

/// Escape `& < > ' "` into their entity forms
fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}
