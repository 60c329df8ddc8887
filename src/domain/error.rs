use crate::domain::session::SessionState;
use thiserror::Error;

/// Domain-level errors for VoiceBridge.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API key configured")]
    MissingApiKey,

    #[error("Microphone access denied: {0}")]
    Permission(String),

    #[error("Transcription failed with HTTP {status}: {body}")]
    Transcription { status: u16, body: String },

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Offline: {0}")]
    Offline(String),

    #[error("Cache install failed: {0}")]
    CacheInstall(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid session state transition from {from:?} to {to:?}")]
    SessionState { from: SessionState, to: SessionState },
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
