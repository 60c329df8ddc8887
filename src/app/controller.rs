use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{
    AudioChunk, DomainError, Language, PipelineConfig, PipelineEvent, Role, Session, SessionState,
    Turn,
};
use crate::ports::{AudioCapture, CredentialStore, Transcriber, Translator};

/// Capacity of the UI event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Pipeline controller: owns the session, sequences transcribe →
/// translate cycles, and enforces that at most one cycle is in flight.
///
/// Back-pressure works by dropping redundant triggers, not by queuing:
/// a chunk boundary reached while a cycle is outstanding leaves its
/// audio in the session buffer, and the whole accumulated buffer is
/// flushed as one segment when the cycle completes.
///
/// The epoch counter ties cycles to the session that issued them. A
/// stop bumps the epoch, so a cycle completing afterwards finds its
/// epoch stale and discards its result instead of publishing it.
pub struct PipelineController {
    capture: Arc<dyn AudioCapture>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    credentials: Arc<dyn CredentialStore>,
    chunk_ms: u64,
    session: Mutex<Option<Session>>,
    processing: AtomicBool,
    epoch: AtomicU64,
    events: broadcast::Sender<PipelineEvent>,
}

impl PipelineController {
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        credentials: Arc<dyn CredentialStore>,
        config: PipelineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            capture,
            transcriber,
            translator,
            credentials,
            chunk_ms: config.chunk_ms,
            session: Mutex::new(None),
            processing: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            events,
        }
    }

    /// Subscribe to pipeline events (captions, translations, transient
    /// errors, recording indicator changes).
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn is_recording(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Current pipeline state; `Idle` when no session exists.
    pub fn state(&self) -> SessionState {
        self.session
            .lock()
            .as_ref()
            .map(Session::state)
            .unwrap_or(SessionState::Idle)
    }

    /// Snapshot of the conversation so far, for caption history views.
    pub fn history(&self) -> Vec<Turn> {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.history().turns().to_vec())
            .unwrap_or_default()
    }

    /// Start a session in the given source language.
    ///
    /// Fails with `MissingApiKey` (and raises a credential prompt
    /// event) before touching the capture device, with `Permission`
    /// when microphone access is denied, and with `SessionState` on a
    /// double start.
    pub async fn start_session(self: &Arc<Self>, language: Language) -> Result<(), DomainError> {
        // The session slot is reserved before the acquire suspension
        // point; a concurrent start is rejected here rather than
        // acquiring the capture device a second time.
        let epoch;
        {
            let mut guard = self.session.lock();
            if let Some(session) = guard.as_ref() {
                return Err(DomainError::SessionState {
                    from: session.state(),
                    to: SessionState::Recording,
                });
            }
            if self.credentials.api_key().is_none() {
                drop(guard);
                self.emit(PipelineEvent::CredentialPromptRequested);
                return Err(DomainError::MissingApiKey);
            }
            epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *guard = Some(Session::new(language, epoch));
        }

        let mut chunks = match self.capture.acquire(self.chunk_ms).await {
            Ok(chunks) => chunks,
            Err(e) => {
                // Roll back the reservation so a later start can retry.
                let mut guard = self.session.lock();
                if guard.as_ref().map(Session::epoch) == Some(epoch) {
                    *guard = None;
                }
                return Err(e);
            }
        };

        // A stop may have landed while acquire was suspended; the
        // device was acquired for a session that no longer exists.
        if self.session.lock().as_ref().map(Session::epoch) != Some(epoch) {
            self.capture.release();
            return Err(DomainError::SessionState {
                from: SessionState::Idle,
                to: SessionState::Recording,
            });
        }

        info!(language = language.code(), "session started");
        self.emit(PipelineEvent::RecordingStarted { language });

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(chunk) = chunks.recv().await {
                if controller.epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                controller.on_chunk_boundary(chunk);
            }
            debug!("chunk stream ended");
        });

        Ok(())
    }

    /// UI semantics of the two start buttons: stop if already
    /// recording, start otherwise. Returns whether a session is now
    /// active.
    pub async fn toggle_session(self: &Arc<Self>, language: Language) -> Result<bool, DomainError> {
        if self.is_recording() {
            self.stop_session();
            Ok(false)
        } else {
            self.start_session(language).await?;
            Ok(true)
        }
    }

    /// Stop the active session, releasing the capture device and
    /// discarding buffered audio. No-op when already idle.
    pub fn stop_session(&self) {
        {
            let mut guard = self.session.lock();
            if guard.take().is_none() {
                return;
            }
            self.epoch.fetch_add(1, Ordering::SeqCst);
            // Emitted under the lock: no caption or translation whose
            // epoch check already passed can land after this event.
            self.emit(PipelineEvent::RecordingStopped);
        }
        self.capture.release();
        info!("session stopped");
    }

    /// Visibility-driven cancellation: the host page went hidden while
    /// a session was active.
    pub fn on_visibility_hidden(&self) {
        if self.is_recording() {
            debug!("page hidden, stopping session");
            self.stop_session();
        }
    }

    /// Chunk boundary reached: buffer the audio, then flush unless a
    /// cycle is already in flight.
    pub fn on_chunk_boundary(self: &Arc<Self>, chunk: AudioChunk) {
        {
            let mut guard = self.session.lock();
            let Some(session) = guard.as_mut() else {
                debug!("chunk after stop, dropping");
                return;
            };
            session.buffer_mut().push(chunk);
        }
        self.try_flush();
    }

    fn try_flush(self: &Arc<Self>) {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // A cycle is in flight; the audio stays buffered for the
            // next eligible flush.
            debug!("flush deferred");
            return;
        }
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.flush_loop().await });
    }

    /// Runs with the processing gate held; drains the buffer one
    /// flush at a time, then releases the gate.
    async fn flush_loop(&self) {
        loop {
            while let Some((audio, language, epoch)) = self.begin_flush() {
                self.run_cycle(audio, language, epoch).await;
            }
            self.processing.store(false, Ordering::SeqCst);

            // A boundary may have landed between the last buffer check
            // and the gate release; reclaim the gate if so.
            let pending = self
                .session
                .lock()
                .as_ref()
                .map(|s| !s.buffer().is_empty())
                .unwrap_or(false);
            if !pending
                || self
                    .processing
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
            {
                return;
            }
        }
    }

    /// Take the accumulated buffer as one segment and enter Flushing.
    fn begin_flush(&self) -> Option<(AudioChunk, Language, u64)> {
        let mut guard = self.session.lock();
        let session = guard.as_mut()?;
        if !session.state().can_flush() {
            return None;
        }
        let audio = session.buffer_mut().take()?;
        session.transition(SessionState::Flushing).ok()?;
        Some((audio, session.language(), session.epoch()))
    }

    async fn run_cycle(&self, audio: AudioChunk, language: Language, epoch: u64) {
        if let Err(e) = self.cycle(audio, language, epoch).await {
            warn!(error = %e, "chunk cycle failed, skipping chunk");
            self.emit(PipelineEvent::TransientError {
                message: e.to_string(),
            });
        }
        let mut guard = self.session.lock();
        if let Some(session) = guard.as_mut() {
            if session.epoch() == epoch && session.state() != SessionState::Recording {
                let _ = session.transition(SessionState::Recording);
            }
        }
    }

    async fn cycle(
        &self,
        audio: AudioChunk,
        language: Language,
        epoch: u64,
    ) -> Result<(), DomainError> {
        if !self.mark_awaiting_transcript(epoch) {
            return Ok(());
        }

        let transcript = self.transcriber.transcribe(&audio, language).await?;
        if transcript.is_empty() {
            debug!("no speech detected, skipping translation");
            return Ok(());
        }

        let window = {
            let mut guard = self.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if session.epoch() != epoch {
                return Ok(());
            }
            session.history_mut().push(Role::User, transcript.clone());
            session.transition(SessionState::AwaitingTranslation)?;
            let window = session.history().window().to_vec();
            // Published while the epoch check still holds, so a racing
            // stop cannot deliver a caption after RecordingStopped.
            self.emit(PipelineEvent::Caption { text: transcript });
            window
        };

        let translation = self.translator.translate(&window).await?;
        {
            let mut guard = self.session.lock();
            let Some(session) = guard.as_mut() else {
                return Ok(());
            };
            if session.epoch() != epoch {
                return Ok(());
            }
            session
                .history_mut()
                .push(Role::Assistant, translation.clone());
            self.emit(PipelineEvent::Translation { text: translation });
        }
        Ok(())
    }

    fn mark_awaiting_transcript(&self, epoch: u64) -> bool {
        let mut guard = self.session.lock();
        let Some(session) = guard.as_mut() else {
            return false;
        };
        if session.epoch() != epoch {
            return false;
        }
        session
            .transition(SessionState::AwaitingTranscript)
            .is_ok()
    }
}
