//! # vocal-capture-core
//!
//! Capture-to-wire audio pipeline.
//!
//! Accumulates chunked bytes from a capture device, decodes them into float
//! samples, re-encodes mono 16-bit PCM WAV for a remote analysis service, and
//! reduces samples to a min/max envelope for waveform display. Device backends
//! implement the `CaptureProvider` trait and plug into `CaptureSession`.
//!
//! ## Features
//!
//! - `opus`: decode Opus (browser WebM/Ogg recordings) through libopus.
//! - `microphone`: live capture from the system input device through cpal.
//!
//! ## Architecture
//!
//! ```text
//! vocal-capture-core (this crate)
//! ├── traits/       ← CaptureProvider, SessionObserver
//! ├── models/       ← errors, SampleBuffer, SessionStatus, Recording, Envelope, config
//! ├── processing/   ← PCM decoder, Opus codec, WAV encoder, waveform downsampler
//! ├── session/      ← CaptureSession, ReplayProvider, MicrophoneProvider
//! └── client/       ← AnalysisTransport, AnalysisClient, AnalysisPipeline
//! ```

pub mod client;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use client::analysis::{AnalysisClient, AnalysisResult};
pub use client::pipeline::{prepare, AnalysisPipeline, PreparedAudio};
pub use client::transport::{AnalysisTransport, HttpTransport, RawResponse};
pub use models::audio_models::{AudioLevels, AudioSource, AudioTransportType, Envelope, EnvelopePoint, PixelSegment, SessionDiagnostics};
pub use models::config::{AnalysisConfig, SessionConfig};
pub use models::error::{AnalysisError, CaptureError, ConfigError, DecodeError, PipelineError, SampleBufferError};
pub use models::recording_result::{Recording, RecordingMetadata};
pub use models::sample_buffer::SampleBuffer;
pub use models::state::SessionStatus;
pub use processing::pcm_decoder::{decode, decode_with_hint};
pub use processing::wav_format::{encode_wav, repair_streaming_header, streaming_wav_header, WavContainer};
pub use processing::waveform::{downsample, levels};
pub use session::capture::CaptureSession;
#[cfg(feature = "microphone")]
pub use session::microphone::MicrophoneProvider;
pub use session::replay::ReplayProvider;
pub use traits::capture_delegate::SessionObserver;
pub use traits::capture_provider::{CaptureProvider, ChunkSink};
