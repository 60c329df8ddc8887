use async_trait::async_trait;

use crate::domain::{AudioChunk, DomainError, Language};

/// Port for remote speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one flushed audio segment with an explicit source-
    /// language hint.
    ///
    /// An empty string means the service detected no speech; that is a
    /// valid, non-error outcome. A terminal failure (primary and
    /// fallback model both rejected) is `DomainError::Transcription`
    /// and skips the current chunk, not the session.
    async fn transcribe(
        &self,
        audio: &AudioChunk,
        language: Language,
    ) -> Result<String, DomainError>;
}
