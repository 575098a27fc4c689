//! Export sinks: terminal consumers of the encoded byte stream.
//!
//! One trait, three consumers: the HTTP response body channel, a byte
//! counter for benchmark runs, and an in-memory buffer for tests. All
//! encoders and the orchestrator target this interface uniformly.

use crate::error::StreamingError;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Terminal consumer of an export's byte stream
#[async_trait]
pub trait ExportSink: Send {
    /// Accept the next chunk of output bytes
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamingError>;

    /// Signal that the stream finished successfully
    async fn complete(&mut self) -> Result<(), StreamingError>;

    /// Signal that the stream failed.
    ///
    /// Best-effort: a sink whose consumer is already gone ignores this.
    async fn fail(&mut self, error: StreamingError);
}

/// Sink backed by a bounded channel, for HTTP response bodies.
///
/// The receiver side is wrapped into a body stream by the download
/// handler; transport backpressure and client disconnects propagate to
/// the pipeline through the channel. Dropping the receiver makes every
/// subsequent write fail with [`StreamingError::SinkClosed`].
pub struct ChannelSink {
    tx: mpsc::Sender<Result<Bytes, StreamingError>>,
}

impl ChannelSink {
    /// Create a sink and the receiver end of its byte channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Result<Bytes, StreamingError>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ExportSink for ChannelSink {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamingError> {
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| StreamingError::SinkClosed)
    }

    async fn complete(&mut self) -> Result<(), StreamingError> {
        // Nothing to flush; the channel closes when the sink is dropped
        Ok(())
    }

    async fn fail(&mut self, error: StreamingError) {
        let _ = self.tx.send(Err(error)).await;
    }
}

/// Counting discard sink for benchmark runs
#[derive(Debug, Default)]
pub struct CountingSink {
    bytes: u64,
}

impl CountingSink {
    /// Create a sink with a zeroed counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes accepted so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

#[async_trait]
impl ExportSink for CountingSink {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamingError> {
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    async fn complete(&mut self) -> Result<(), StreamingError> {
        Ok(())
    }

    async fn fail(&mut self, _error: StreamingError) {}
}

/// In-memory sink that records everything, for pipeline tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct BufferSink {
    /// All bytes written so far
    pub buffer: Vec<u8>,
    /// Whether `complete` was called
    pub completed: bool,
    /// The error `fail` was called with, if any
    pub failure: Option<StreamingError>,
}

#[cfg(test)]
#[async_trait]
impl ExportSink for BufferSink {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StreamingError> {
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    async fn complete(&mut self) -> Result<(), StreamingError> {
        self.completed = true;
        Ok(())
    }

    async fn fail(&mut self, error: StreamingError) {
        self.failure = Some(error);
    }
}
