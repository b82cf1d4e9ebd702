//! Waveform reduction.
//!
//! Collapses decoded samples into a fixed-width min/max envelope for drawing,
//! and measures RMS and peak levels for metering.

use crate::models::audio_models::{AudioLevels, Envelope, EnvelopePoint};
use crate::models::sample_buffer::SampleBuffer;

/// Reduce channel 0 of `buffer` to one `(min, max)` pair per pixel.
///
/// With `step = ceil(frames / width)`, pixel `i` covers frames
/// `[i * step, i * step + step)`. Frames past the end of the buffer are
/// ignored, and a pixel whose window holds no frames at all is `(0.0, 0.0)`.
/// The returned envelope always has exactly `width` points.
pub fn downsample(buffer: &SampleBuffer, width: usize) -> Envelope {
    downsample_samples(buffer.primary(), width)
}

/// Same as [`downsample`], on a bare sample slice.
pub fn downsample_samples(samples: &[f32], width: usize) -> Envelope {
    if width == 0 {
        return Envelope::default();
    }

    let frames = samples.len();
    let step = frames.div_ceil(width);

    let points = (0..width)
        .map(|i| {
            let start = (i * step).min(frames);
            let end = (start + step).min(frames);
            let window = &samples[start..end];
            if window.is_empty() {
                return EnvelopePoint::default();
            }

            let (min, max) = window
                .iter()
                .fold((1.0f32, -1.0f32), |(lo, hi), &s| (lo.min(s), hi.max(s)));
            EnvelopePoint {
                min: min.clamp(-1.0, 1.0),
                max: max.clamp(-1.0, 1.0),
            }
        })
        .collect();

    Envelope { points }
}

/// RMS and peak level of channel 0.
pub fn levels(buffer: &SampleBuffer) -> AudioLevels {
    AudioLevels {
        rms: rms_level(buffer.primary()),
        peak: peak_level(buffer.primary()),
    }
}

/// Compute RMS level of samples (0.0–1.0 range for normalized audio).
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Compute peak absolute level of samples.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}
