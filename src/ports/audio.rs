use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{AudioChunk, DomainError};

/// Port for microphone capture.
///
/// Implementations own the platform capture device and emit one opaque
/// audio segment per chunk boundary. The stream is finite: it ends when
/// the device is released, and a new session acquires a new stream.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the capture device and start emitting chunks every
    /// `chunk_ms` milliseconds.
    ///
    /// Fails with `DomainError::Permission` when microphone access is
    /// denied.
    async fn acquire(&self, chunk_ms: u64) -> Result<mpsc::Receiver<AudioChunk>, DomainError>;

    /// Release the capture device; the chunk stream ends. Safe to call
    /// when nothing is acquired.
    fn release(&self);
}
