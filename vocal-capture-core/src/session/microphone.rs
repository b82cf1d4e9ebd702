//! cpal microphone capture provider.
//!
//! Opens a system input device and streams it as a WAV: the first chunk is a
//! 44-byte header with placeholder sizes, every later chunk is mono 16-bit
//! PCM taken from channel 0 of each frame. The decoder fixes the sizes up when
//! the recording is decoded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;

use crate::models::audio_models::{AudioSource, AudioTransportType};
use crate::models::error::CaptureError;
use crate::processing::wav_format;
use crate::traits::capture_provider::{CaptureProvider, ChunkSink};

/// How often the capture thread checks whether it should release the stream.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Microphone capture through the default cpal host.
///
/// The cpal stream is not `Send` on every platform, so it lives on a
/// dedicated thread for the whole recording and is dropped there on stop.
pub struct MicrophoneProvider {
    device_name: Option<String>,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl MicrophoneProvider {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        }
    }

    /// Capture from the input device with this exact name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            ..Self::default_device()
        }
    }

    /// Names of the input devices the default host can see.
    pub fn list_devices() -> Vec<String> {
        cpal::default_host()
            .input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}

impl CaptureProvider for MicrophoneProvider {
    fn is_available(&self) -> bool {
        find_device(self.device_name.as_deref()).is_ok()
    }

    fn start(&mut self, sink: ChunkSink) -> Result<(), CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(
                "microphone is already streaming".into(),
            ));
        }

        let running = Arc::clone(&self.running);
        let device_name = self.device_name.clone();
        let (ready_tx, ready_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), sink) {
                    Ok(stream) => stream,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                while running.load(Ordering::SeqCst) {
                    thread::sleep(STOP_POLL_INTERVAL);
                }
                drop(stream);
                log::info!("microphone stream released");
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::StreamFailed(format!(
                    "failed to spawn microphone thread: {}",
                    e
                )));
            }
        };

        let outcome = ready_rx.recv().unwrap_or_else(|_| {
            Err(CaptureError::StreamFailed(
                "microphone thread exited before the stream opened".into(),
            ))
        });
        if let Err(err) = outcome {
            self.running.store(false, Ordering::SeqCst);
            let _ = handle.join();
            return Err(err);
        }

        *self.capture_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            if handle.join().is_err() {
                return Err(CaptureError::StreamFailed("microphone thread panicked".into()));
            }
        }
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        let name = find_device(self.device_name.as_deref())
            .ok()
            .and_then(|d| d.name().ok())
            .or_else(|| self.device_name.clone())
            .unwrap_or_else(|| "Default Microphone".into());
        AudioSource {
            id: format!("cpal:{}", name),
            name,
            is_default: self.device_name.is_none(),
            transport_type: Some(AudioTransportType::Unknown),
        }
    }
}

impl Drop for MicrophoneProvider {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("failed to release microphone: {}", err);
        }
    }
}

fn find_device(name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into())),
        Some(wanted) => host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("cannot list input devices: {}", e)))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceUnavailable(format!("no input device named {}", wanted))),
    }
}

/// Open and start the input stream on the device's default config.
fn open_stream(device_name: Option<&str>, sink: ChunkSink) -> Result<cpal::Stream, CaptureError> {
    let device = find_device(device_name)?;
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceUnavailable(format!("no usable input config: {}", e)))?;

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    log::info!(
        "opening {} at {} Hz, {} channel(s), {:?}",
        device.name().unwrap_or_else(|_| "input device".into()),
        sample_rate,
        channels,
        format
    );

    let stream = match format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, sample_rate, sink),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, sample_rate, sink),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, sample_rate, sink),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, sample_rate, sink),
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }?;

    stream
        .play()
        .map_err(|e| CaptureError::StreamFailed(format!("failed to start input stream: {}", e)))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_rate: u32,
    sink: ChunkSink,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    // Sent ahead of the first audio callback.
    let mut header = Some(wav_format::streaming_wav_header(sample_rate));
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if let Some(header) = header.take() {
                    sink(&header);
                }
                let chunk = first_channel_pcm16(data, channels);
                if !chunk.is_empty() {
                    sink(&chunk);
                }
            },
            |err| log::error!("microphone stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to build input stream: {}", e)))
}

/// Channel 0 of interleaved device samples, as 16-bit little-endian PCM.
fn first_channel_pcm16<T>(data: &[T], channels: usize) -> Vec<u8>
where
    T: Sample,
    f32: FromSample<T>,
{
    let mut out = Vec::with_capacity(data.len() / channels.max(1) * 2);
    wav_format::write_pcm16(
        &mut out,
        data.chunks_exact(channels.max(1)).map(|frame| f32::from_sample(frame[0])),
    );
    out
}
