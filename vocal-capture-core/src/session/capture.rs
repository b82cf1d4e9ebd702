use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::audio_models::{AudioSource, SessionDiagnostics};
use crate::models::config::SessionConfig;
use crate::models::error::{CaptureError, ConfigError};
use crate::models::recording_result::{Recording, RecordingMetadata};
use crate::models::state::SessionStatus;
use crate::traits::capture_delegate::SessionObserver;
use crate::traits::capture_provider::{CaptureProvider, ChunkSink};

/// Mutable session state shared with the provider's chunk sink.
struct SessionState {
    status: SessionStatus,
    /// Cleared as soon as `stop` begins, so late chunks are discarded.
    accepting: bool,
    chunks: Vec<Vec<u8>>,
    accumulated_bytes: usize,
    started_at: Option<DateTime<Utc>>,
    recording: Option<Recording>,
    diagnostics: SessionDiagnostics,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            accepting: false,
            chunks: Vec::new(),
            accumulated_bytes: 0,
            started_at: None,
            recording: None,
            diagnostics: SessionDiagnostics::default(),
        }
    }

    fn clear_chunks(&mut self) {
        self.chunks.clear();
        self.accumulated_bytes = 0;
    }
}

/// Recording lifecycle over an exclusive input device.
///
/// ```text
/// [Provider] --chunks--> [ChunkSink] → accumulated chunks --stop()--> Recording
/// ```
///
/// Only one recording exists at a time: starting again from `Stopped`
/// discards the previous one. Dropping a session that is still recording
/// releases the device.
pub struct CaptureSession<P: CaptureProvider> {
    provider: P,
    config: SessionConfig,
    state: Arc<Mutex<SessionState>>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl<P: CaptureProvider> CaptureSession<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: SessionConfig::default(),
            state: Arc::new(Mutex::new(SessionState::new())),
            observer: None,
        }
    }

    pub fn with_config(provider: P, config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut session = Self::new(provider);
        session.config = config;
        Ok(session)
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    /// Chunks accumulated so far in the current (or last) recording.
    pub fn chunk_count(&self) -> usize {
        let s = self.state.lock();
        match &s.recording {
            Some(recording) if s.status.is_stopped() => recording.metadata.chunk_count,
            _ => s.chunks.len(),
        }
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.state.lock().diagnostics.clone()
    }

    pub fn device_info(&self) -> AudioSource {
        self.provider.device_info()
    }

    /// The finished recording, only when stopped with a non-empty blob.
    pub fn recording(&self) -> Option<Recording> {
        let s = self.state.lock();
        if !s.status.is_stopped() {
            return None;
        }
        s.recording.clone().filter(|r| !r.is_empty())
    }

    /// Acquire the device and begin recording. Transitions: idle/stopped → recording.
    ///
    /// On failure the session keeps its previous state, including any
    /// earlier recording.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.status().is_recording() {
            let err = CaptureError::AlreadyRecording;
            self.notify_error(&err);
            return Err(err);
        }

        if !self.provider.is_available() {
            let err = CaptureError::DeviceUnavailable(self.provider.device_info().name);
            log::warn!("cannot start recording: {}", err);
            self.notify_error(&err);
            return Err(err);
        }

        {
            let mut s = self.state.lock();
            s.clear_chunks();
            s.accepting = true;
        }

        if let Err(err) = self.provider.start(self.chunk_sink()) {
            {
                let mut s = self.state.lock();
                s.accepting = false;
                s.clear_chunks();
            }
            log::error!("device failed to start: {}", err);
            self.notify_error(&err);
            return Err(err);
        }

        {
            let mut s = self.state.lock();
            s.recording = None;
            s.started_at = Some(Utc::now());
            s.diagnostics.sessions_started += 1;
        }
        self.set_status(SessionStatus::Recording);
        log::info!("recording started on {}", self.provider.device_info().name);
        Ok(())
    }

    /// Stop recording and assemble the chunks into one blob.
    /// Transitions: recording → stopped.
    ///
    /// Calling it while idle or already stopped is a no-op returning `None`.
    pub fn stop(&mut self) -> Result<Option<Recording>, CaptureError> {
        {
            let mut s = self.state.lock();
            if !s.status.is_recording() {
                return Ok(None);
            }
            s.accepting = false;
        }

        self.release_device();

        let recording = {
            let mut s = self.state.lock();
            let chunks = std::mem::take(&mut s.chunks);
            let chunk_count = chunks.len();
            let bytes = chunks.concat();
            s.accumulated_bytes = 0;

            let started_at = s.started_at.take().unwrap_or_else(Utc::now);
            let metadata = RecordingMetadata::new(&bytes, chunk_count, started_at, Utc::now());
            let recording = Recording { bytes, metadata };
            s.recording = Some(recording.clone());
            recording
        };

        self.set_status(SessionStatus::Stopped);
        log::info!(
            "recording {} stopped: {} chunks, {} bytes",
            recording.metadata.id,
            recording.metadata.chunk_count,
            recording.metadata.byte_length
        );

        if let Some(ref observer) = self.observer {
            observer.on_recording_finished(&recording);
        }

        Ok(Some(recording))
    }

    // --- Internal helpers ---

    fn chunk_sink(&self) -> ChunkSink {
        let state = Arc::clone(&self.state);
        let observer = self.observer.clone();
        let max_bytes = self.config.max_recording_bytes;

        Arc::new(move |chunk: &[u8]| {
            if chunk.is_empty() {
                return;
            }

            let accepted = {
                let mut s = state.lock();
                if !s.accepting {
                    s.diagnostics.chunks_dropped += 1;
                    false
                } else if max_bytes.is_some_and(|max| s.accumulated_bytes + chunk.len() > max) {
                    s.diagnostics.chunks_dropped += 1;
                    log::warn!(
                        "recording limit reached, dropping {} byte chunk",
                        chunk.len()
                    );
                    false
                } else {
                    s.chunks.push(chunk.to_vec());
                    s.accumulated_bytes += chunk.len();
                    s.diagnostics.chunks_accepted += 1;
                    s.diagnostics.bytes_accepted += chunk.len() as u64;
                    true
                }
            };

            if accepted {
                if let Some(ref observer) = observer {
                    observer.on_chunk(chunk.len());
                }
            }
        })
    }

    fn release_device(&mut self) {
        if let Err(err) = self.provider.stop() {
            log::error!("failed to release input device: {}", err);
            self.notify_error(&err);
        }
    }

    fn set_status(&self, status: SessionStatus) {
        self.state.lock().status = status;
        if let Some(ref observer) = self.observer {
            observer.on_status_changed(status);
        }
    }

    fn notify_error(&self, err: &CaptureError) {
        if let Some(ref observer) = self.observer {
            observer.on_error(err);
        }
    }
}

impl<P: CaptureProvider> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        let was_recording = {
            let mut s = self.state.lock();
            s.accepting = false;
            s.status.is_recording()
        };
        if was_recording {
            log::debug!("capture session dropped while recording, releasing device");
            self.release_device();
        }
    }
}
