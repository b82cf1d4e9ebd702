use super::audio_models::AudioLevels;
use super::error::SampleBufferError;
use crate::processing::waveform;

/// Highest rate whose 16-bit mono byte rate still fits a WAV header field.
pub const MAX_SAMPLE_RATE: u32 = u32::MAX / 2;

/// Normalized floating-point audio, planar, with its sample rate.
///
/// Samples are nominally in `[-1.0, 1.0]`; values slightly outside that range
/// are kept as-is and clamped by consumers that need to. Once built the buffer
/// is immutable, so it can be shared by the encoder and the downsampler without
/// any locking.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// Every channel must hold the same number of frames.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, SampleBufferError> {
        if sample_rate == 0 {
            return Err(SampleBufferError::ZeroSampleRate);
        }
        if sample_rate > MAX_SAMPLE_RATE {
            return Err(SampleBufferError::SampleRateTooHigh {
                rate: sample_rate,
                max: MAX_SAMPLE_RATE,
            });
        }
        let Some(first) = channels.first() else {
            return Err(SampleBufferError::NoChannels);
        };
        let expected = first.len();
        if let Some((channel, samples)) = channels
            .iter()
            .enumerate()
            .find(|(_, samples)| samples.len() != expected)
        {
            return Err(SampleBufferError::RaggedChannels {
                channel,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel convenience constructor.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, SampleBufferError> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Channel 0, the only channel the encoder and downsampler look at.
    pub fn primary(&self) -> &[f32] {
        &self.channels[0]
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// RMS and peak of channel 0.
    pub fn levels(&self) -> AudioLevels {
        waveform::levels(self)
    }
}
