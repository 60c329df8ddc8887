use async_trait::async_trait;

use crate::domain::{DomainError, Turn};

/// Port for remote translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate the latest turn given a sliding window of prior
    /// conversation turns (the window, not the full history).
    ///
    /// Fails fast with `DomainError::Offline` when connectivity is
    /// known to be absent, without issuing a request.
    async fn translate(&self, window: &[Turn]) -> Result<String, DomainError>;
}
