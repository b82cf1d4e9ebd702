//! Replay capture provider.
//!
//! Feeds a pre-recorded byte stream (for example a file produced by a browser
//! `MediaRecorder`) through the same chunked delivery path a live device uses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::audio_models::{AudioSource, AudioTransportType};
use crate::models::error::CaptureError;
use crate::traits::capture_provider::{CaptureProvider, ChunkSink};

/// Delivers a fixed byte stream in `chunk_size` pieces on a dedicated thread.
///
/// A replay source with nothing to play reports no device.
pub struct ReplayProvider {
    name: String,
    data: Arc<Vec<u8>>,
    chunk_size: usize,
    interval: Duration,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    replay_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ReplayProvider {
    pub fn new(name: impl Into<String>, data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data),
            chunk_size: chunk_size.max(1),
            interval: Duration::ZERO,
            running: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
            replay_handle: Mutex::new(None),
        }
    }

    /// Pause between chunks, to mimic a device's delivery cadence.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Whether every chunk has been handed to the sink.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Block until the whole stream was delivered or `timeout` elapses.
    pub fn wait_until_finished(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

impl CaptureProvider for ReplayProvider {
    fn is_available(&self) -> bool {
        !self.data.is_empty()
    }

    fn start(&mut self, sink: ChunkSink) -> Result<(), CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is already streaming",
                self.name
            )));
        }
        self.finished.store(false, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let finished = Arc::clone(&self.finished);
        let data = Arc::clone(&self.data);
        let chunk_size = self.chunk_size;
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name("replay-capture".into())
            .spawn(move || {
                for chunk in data.chunks(chunk_size) {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    sink(chunk);
                    if !interval.is_zero() {
                        thread::sleep(interval);
                    }
                }
                finished.store(true, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::StreamFailed(format!("failed to spawn replay thread: {}", e))
            })?;

        *self.replay_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.replay_handle.lock().take() {
            if handle.join().is_err() {
                return Err(CaptureError::StreamFailed("replay thread panicked".into()));
            }
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: format!("replay:{}", self.name),
            name: self.name.clone(),
            is_default: false,
            transport_type: Some(AudioTransportType::Virtual),
        }
    }
}

impl Drop for ReplayProvider {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("failed to stop replay of {}: {}", self.name, err);
        }
    }
}
