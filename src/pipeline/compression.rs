//! Optional gzip stage between the encoder and the sink.

use crate::error::StreamingError;
use crate::types::{Compression, ExportFormat};
use flate2::write::GzEncoder;
use std::io::Write;

/// Incremental gzip filter, or an identity pass-through.
///
/// Compressed output is drained after every write so the stage streams
/// rather than accumulating the whole document.
pub struct CompressionStage {
    format: ExportFormat,
    encoder: Option<GzEncoder<Vec<u8>>>,
}

impl CompressionStage {
    /// Build the stage for a job.
    ///
    /// Gzip is only engaged when requested and applicable to the format;
    /// parquet output always passes through untouched.
    pub fn for_job(compression: Option<Compression>, format: ExportFormat) -> Self {
        let active = compression.is_some_and(|c| c.applies_to(format));
        let encoder = active
            .then(|| GzEncoder::new(Vec::new(), flate2::Compression::default()));
        Self { format, encoder }
    }

    /// Whether output bytes are gzip-framed
    pub fn is_active(&self) -> bool {
        self.encoder.is_some()
    }

    /// Push a chunk through the stage, returning whatever output bytes
    /// are ready. May legitimately return an empty vec while gzip
    /// buffers input.
    pub fn process(&mut self, chunk: Vec<u8>) -> Result<Vec<u8>, StreamingError> {
        let format = self.format;
        match &mut self.encoder {
            None => Ok(chunk),
            Some(encoder) => {
                encoder
                    .write_all(&chunk)
                    .map_err(|e| gzip_error(format, e))?;
                Ok(std::mem::take(encoder.get_mut()))
            }
        }
    }

    /// Flush the gzip trailer. Identity stages return nothing. Calling
    /// this twice returns nothing the second time.
    pub fn finish(&mut self) -> Result<Vec<u8>, StreamingError> {
        let format = self.format;
        match self.encoder.take() {
            None => Ok(Vec::new()),
            Some(encoder) => encoder.finish().map_err(|e| gzip_error(format, e)),
        }
    }
}

fn gzip_error(format: ExportFormat, e: std::io::Error) -> StreamingError {
    StreamingError::Encoding {
        format,
        message: format!("gzip: {}", e),
    }
}
