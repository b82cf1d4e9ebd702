use crate::models::error::CaptureError;
use crate::models::recording_result::Recording;
use crate::models::state::SessionStatus;

/// Lifecycle notifications from a capture session.
///
/// `on_chunk` is called from whatever thread the provider delivers on; the
/// other methods run on the caller of `start`/`stop`.
pub trait SessionObserver: Send + Sync {
    fn on_status_changed(&self, status: SessionStatus);

    /// A chunk of `len` bytes was accepted into the recording.
    fn on_chunk(&self, _len: usize) {}

    fn on_error(&self, error: &CaptureError);

    fn on_recording_finished(&self, recording: &Recording);
}
