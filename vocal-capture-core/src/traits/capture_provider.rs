use std::sync::Arc;

use crate::models::audio_models::AudioSource;
use crate::models::error::CaptureError;

/// Callback invoked for every chunk of encoded audio the device produces.
///
/// Chunks are opaque container bytes in the device's native encoding and must
/// be delivered in capture order. The callback may fire on a device thread.
pub type ChunkSink = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// A platform input device: start delivering chunks to a sink, then stop.
///
/// The underlying stream is exclusive. A provider that is already streaming
/// must refuse a second `start`, and `stop` must release the stream even if
/// delivery failed part-way.
pub trait CaptureProvider: Send {
    /// Whether an input device is present and usable (permission granted).
    fn is_available(&self) -> bool;

    /// Acquire the input stream and begin delivering chunks to `sink`.
    fn start(&mut self, sink: ChunkSink) -> Result<(), CaptureError>;

    /// Stop delivery and release the stream. Calling it when idle is a no-op.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}
