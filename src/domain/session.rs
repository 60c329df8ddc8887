use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::domain::history::ConversationHistory;
use crate::domain::DomainError;

/// Source language of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Japanese,
    English,
}

impl Language {
    /// ISO 639-1 code sent as the transcription language hint.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::English => "en",
        }
    }
}

/// Session state machine.
///
/// State transitions:
/// - Idle -> Recording (start_session)
/// - Recording -> Flushing (chunk boundary with the processing gate free)
/// - Flushing -> AwaitingTranscript (transcription request issued)
/// - AwaitingTranscript -> AwaitingTranslation (non-empty transcript)
/// - AwaitingTranscript -> Recording (silence or skippable failure)
/// - AwaitingTranslation -> Recording (cycle complete or skippable failure)
/// - any -> Idle (stop_session, visibility hidden)
///
/// A chunk boundary reached outside Recording leaves its audio in the
/// buffer; no second cycle is ever started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No active session.
    Idle,
    /// Capturing audio, no cycle in flight.
    Recording,
    /// Buffer taken, cycle about to start.
    Flushing,
    /// Transcription request in flight.
    AwaitingTranscript,
    /// Translation request in flight.
    AwaitingTranslation,
}

impl SessionState {
    /// Check if a new session can be started from this state.
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Check if a flush may begin from this state.
    #[must_use]
    pub fn can_flush(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    /// Check whether the transition to `to` is legal.
    #[must_use]
    pub fn can_transition(&self, to: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Idle, Recording)
                | (Recording, Flushing)
                | (Flushing, AwaitingTranscript)
                | (AwaitingTranscript, AwaitingTranslation)
                | (AwaitingTranscript, Recording)
                | (AwaitingTranslation, Recording)
                | (_, Idle)
        )
    }
}

/// One fixed-duration segment of captured audio. The bytes are opaque
/// (container/codec is fixed for the whole session) and are zeroed on
/// drop; raw audio never outlives its use.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct AudioChunk {
    bytes: Vec<u8>,
}

impl AudioChunk {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Ordered audio segments accumulated between flush points.
/// Owned exclusively by the session; taken atomically on each flush.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<AudioChunk>,
}

impl ChunkBuffer {
    pub fn push(&mut self, chunk: AudioChunk) {
        self.chunks.push(chunk);
    }

    /// Take everything accumulated so far as one concatenated payload,
    /// leaving the buffer empty. Returns `None` when there is nothing
    /// to flush.
    pub fn take(&mut self) -> Option<AudioChunk> {
        if self.chunks.is_empty() {
            return None;
        }
        let total: usize = self.chunks.iter().map(AudioChunk::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(chunk.bytes());
        }
        Some(AudioChunk::new(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// One continuous recording-translation run for one source language.
///
/// Ephemeral: created on start, dropped on stop or tab-hide. The epoch
/// ties in-flight cycles to the session that issued them; results from
/// a superseded epoch are discarded rather than published.
#[derive(Debug)]
pub struct Session {
    language: Language,
    state: SessionState,
    buffer: ChunkBuffer,
    history: ConversationHistory,
    epoch: u64,
}

impl Session {
    pub fn new(language: Language, epoch: u64) -> Self {
        Self {
            language,
            state: SessionState::Recording,
            buffer: ChunkBuffer::default(),
            history: ConversationHistory::default(),
            epoch,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Apply a state transition, rejecting illegal ones.
    pub fn transition(&mut self, to: SessionState) -> Result<(), DomainError> {
        if !self.state.can_transition(to) {
            return Err(DomainError::SessionState {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn buffer_mut(&mut self) -> &mut ChunkBuffer {
        &mut self.buffer
    }

    pub fn buffer(&self) -> &ChunkBuffer {
        &self.buffer
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }
}

/// Events published by the pipeline for the UI collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// A session started; show the recording indicator.
    RecordingStarted { language: Language },
    /// The session ended (explicit stop or visibility hidden).
    RecordingStopped,
    /// A transcript is ready for the caption area.
    Caption { text: String },
    /// A translation is ready for the translation area.
    Translation { text: String },
    /// A per-chunk failure; show a transient, auto-dismissing notice.
    TransientError { message: String },
    /// No credential is stored; open the settings dialog.
    CredentialPromptRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Japanese.code(), "ja");
        assert_eq!(Language::English.code(), "en");
    }

    #[test]
    fn test_state_can_start() {
        assert!(SessionState::Idle.can_start());
        assert!(!SessionState::Recording.can_start());
        assert!(!SessionState::AwaitingTranscript.can_start());
    }

    #[test]
    fn test_state_can_flush() {
        assert!(SessionState::Recording.can_flush());
        assert!(!SessionState::Idle.can_flush());
        assert!(!SessionState::Flushing.can_flush());
        assert!(!SessionState::AwaitingTranslation.can_flush());
    }

    #[test]
    fn test_legal_cycle_transitions() {
        let mut session = Session::new(Language::Japanese, 1);
        assert_eq!(session.state(), SessionState::Recording);
        session.transition(SessionState::Flushing).unwrap();
        session.transition(SessionState::AwaitingTranscript).unwrap();
        session.transition(SessionState::AwaitingTranslation).unwrap();
        session.transition(SessionState::Recording).unwrap();
    }

    #[test]
    fn test_silence_returns_to_recording() {
        let mut session = Session::new(Language::English, 1);
        session.transition(SessionState::Flushing).unwrap();
        session.transition(SessionState::AwaitingTranscript).unwrap();
        session.transition(SessionState::Recording).unwrap();
    }

    #[test]
    fn test_double_start_rejected() {
        let mut session = Session::new(Language::Japanese, 1);
        let err = session.transition(SessionState::Recording).unwrap_err();
        assert!(matches!(
            err,
            DomainError::SessionState {
                from: SessionState::Recording,
                to: SessionState::Recording,
            }
        ));
    }

    #[test]
    fn test_stop_allowed_from_any_state() {
        for state in [
            SessionState::Recording,
            SessionState::Flushing,
            SessionState::AwaitingTranscript,
            SessionState::AwaitingTranslation,
        ] {
            assert!(state.can_transition(SessionState::Idle));
        }
    }

    #[test]
    fn test_chunk_buffer_take_concatenates() {
        let mut buffer = ChunkBuffer::default();
        buffer.push(AudioChunk::new(vec![1, 2]));
        buffer.push(AudioChunk::new(vec![3]));
        let flushed = buffer.take().unwrap();
        assert_eq!(flushed.bytes(), &[1, 2, 3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_chunk_buffer_take_empty() {
        let mut buffer = ChunkBuffer::default();
        assert!(buffer.take().is_none());
    }
}
