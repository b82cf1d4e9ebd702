//! WAV serialization.
//!
//! Produces the canonical wire format sent to the analysis service: a
//! 44-byte RIFF header followed by mono signed 16-bit little-endian PCM.

use crate::models::sample_buffer::SampleBuffer;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Bit depth of every container this module writes.
pub const BITS_PER_SAMPLE: u16 = 16;

const BYTES_PER_SAMPLE: usize = 2;

/// Size fields written while the final length is still unknown.
pub const STREAMING_SIZE_PLACEHOLDER: u32 = u32::MAX;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Derived fields that do not fit in 32 bits saturate at `u32::MAX`.
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = saturate_u32(u64::from(sample_rate) * u64::from(channels) * u64::from(bit_depth) / 8);
    let block_align = u16::try_from(u32::from(channels) * u32::from(bit_depth) / 8).unwrap_or(u16::MAX);
    let chunk_size = data_size.saturating_add(36);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Header for a mono 16-bit stream whose length is not known yet.
///
/// Both size fields hold [`STREAMING_SIZE_PLACEHOLDER`]; readers fix them up
/// with [`repair_streaming_header`] once the stream has ended.
pub fn streaming_wav_header(sample_rate: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = generate_wav_header(sample_rate, BITS_PER_SAMPLE, 1, 0);
    header[4..8].copy_from_slice(&STREAMING_SIZE_PLACEHOLDER.to_le_bytes());
    header[40..44].copy_from_slice(&STREAMING_SIZE_PLACEHOLDER.to_le_bytes());
    header
}

/// Rewrite the size fields of a streamed WAV to match the bytes actually held.
///
/// Only touches a canonical 44-byte header whose `data` size is the
/// placeholder. Returns whether anything changed.
pub fn repair_streaming_header(bytes: &mut [u8]) -> bool {
    if bytes.len() < WAV_HEADER_SIZE
        || &bytes[0..4] != b"RIFF"
        || &bytes[8..12] != b"WAVE"
        || &bytes[36..40] != b"data"
        || bytes[40..44] != STREAMING_SIZE_PLACEHOLDER.to_le_bytes()
    {
        return false;
    }
    let data_size = saturate_u32((bytes.len() - WAV_HEADER_SIZE) as u64);
    bytes[4..8].copy_from_slice(&data_size.saturating_add(36).to_le_bytes());
    bytes[40..44].copy_from_slice(&data_size.to_le_bytes());
    true
}

/// Quantize one normalized sample to signed 16-bit.
///
/// The sample is clamped to `[-1.0, 1.0]` before scaling so out-of-range
/// input saturates instead of wrapping. Negative values scale by 32768 and
/// non-negative values by 32767, so both ends of the i16 range are reachable.
pub fn quantize_sample(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * i16::MAX as f32
    };
    scaled.round() as i16
}

/// Append samples to `out` as signed 16-bit little-endian PCM.
pub fn write_pcm16(out: &mut Vec<u8>, samples: impl IntoIterator<Item = f32>) {
    for sample in samples {
        out.extend_from_slice(&quantize_sample(sample).to_le_bytes());
    }
}

/// An encoded mono 16-bit PCM WAV file.
///
/// Immutable once built; hand it to the transport with [`WavContainer::into_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Vec<u8>,
    sample_rate: u32,
}

impl WavContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        (self.bytes.len() - WAV_HEADER_SIZE) / BYTES_PER_SAMPLE
    }

    /// The `data` chunk payload (samples only, no header).
    pub fn data(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_SIZE..]
    }
}

/// Encode channel 0 of `buffer` as a mono 16-bit PCM WAV container.
///
/// Channels past the first are dropped, not mixed down. The output is
/// `44 + 2 * frame_count` bytes and is identical for identical input.
pub fn encode_wav(buffer: &SampleBuffer) -> WavContainer {
    let samples = buffer.primary();
    let data_size = samples.len() * BYTES_PER_SAMPLE;

    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size);
    bytes.extend_from_slice(&generate_wav_header(
        buffer.sample_rate(),
        BITS_PER_SAMPLE,
        1,
        saturate_u32(data_size as u64),
    ));
    write_pcm16(&mut bytes, samples.iter().copied());

    log::debug!(
        "encoded {} frames at {} Hz into {} WAV bytes",
        samples.len(),
        buffer.sample_rate(),
        bytes.len()
    );

    WavContainer {
        bytes,
        sample_rate: buffer.sample_rate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn sample_at(wav: &WavContainer, index: usize) -> i16 {
        let data = wav.data();
        i16::from_le_bytes([data[index * 2], data[index * 2 + 1]])
    }

    #[test]
    fn header_size_is_44_bytes() {
        let header = generate_wav_header(48000, 16, 1, 0);
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(48000, 16, 1, 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_48khz_stereo_16bit() {
        let header = generate_wav_header(48000, 16, 2, 9600);

        assert_eq!(u16_at(&header, 22), 2);
        assert_eq!(u32_at(&header, 24), 48000);
        assert_eq!(u32_at(&header, 28), 192000); // 48000 * 2 * 16/8
        assert_eq!(u16_at(&header, 32), 4);
        assert_eq!(u16_at(&header, 34), 16);
        assert_eq!(u32_at(&header, 40), 9600);
        assert_eq!(u32_at(&header, 4), 36 + 9600);
    }

    #[test]
    fn three_frames_at_16khz_is_50_bytes() {
        let buffer = SampleBuffer::mono(vec![0.0, 0.5, -0.5], 16000).unwrap();
        let wav = encode_wav(&buffer);
        let bytes = wav.as_bytes();

        assert_eq!(bytes.len(), 50);
        assert_eq!(u32_at(bytes, 4), 44);
        assert_eq!(u32_at(bytes, 40), 6);

        assert_eq!(u32_at(bytes, 16), 16);
        assert_eq!(u16_at(bytes, 20), 1);
        assert_eq!(u16_at(bytes, 22), 1);
        assert_eq!(u32_at(bytes, 24), 16000);
        assert_eq!(u32_at(bytes, 28), 32000);
        assert_eq!(u16_at(bytes, 32), 2);
        assert_eq!(u16_at(bytes, 34), 16);
        assert_eq!(wav.frame_count(), 3);
    }

    #[test]
    fn empty_buffer_is_header_only() {
        let buffer = SampleBuffer::mono(Vec::new(), 44100).unwrap();
        let wav = encode_wav(&buffer);

        assert_eq!(wav.len(), WAV_HEADER_SIZE);
        assert_eq!(u32_at(wav.as_bytes(), 4), 36);
        assert_eq!(u32_at(wav.as_bytes(), 40), 0);
        assert!(wav.data().is_empty());
    }

    #[test]
    fn out_of_range_samples_saturate() {
        let buffer = SampleBuffer::mono(vec![1.5, -1.5, 1.0, -1.0], 8000).unwrap();
        let wav = encode_wav(&buffer);

        assert_eq!(sample_at(&wav, 0), 32767);
        assert_eq!(sample_at(&wav, 1), -32768);
        assert_eq!(sample_at(&wav, 2), 32767);
        assert_eq!(sample_at(&wav, 3), -32768);
    }

    #[test]
    fn quantization_rounds_to_nearest() {
        assert_eq!(quantize_sample(0.0), 0);
        assert_eq!(quantize_sample(0.5), 16384); // 16383.5 rounds away from zero
        assert_eq!(quantize_sample(-0.5), -16384);
        assert_eq!(quantize_sample(1.0 / 32767.0), 1);
    }

    #[test]
    fn only_first_channel_is_encoded() {
        let buffer = SampleBuffer::new(vec![vec![0.25, 0.25], vec![-1.0, -1.0]], 22050).unwrap();
        let wav = encode_wav(&buffer);

        assert_eq!(wav.len(), 48);
        assert_eq!(sample_at(&wav, 0), quantize_sample(0.25));
        assert_eq!(sample_at(&wav, 1), quantize_sample(0.25));
    }

    #[test]
    fn oversized_fields_saturate_instead_of_wrapping() {
        let header = generate_wav_header(u32::MAX, 16, 2, u32::MAX - 10);

        assert_eq!(u32_at(&header, 24), u32::MAX);
        assert_eq!(u32_at(&header, 28), u32::MAX);
        assert_eq!(u32_at(&header, 4), u32::MAX);
        assert_eq!(u32_at(&header, 40), u32::MAX - 10);
    }

    #[test]
    fn highest_accepted_rate_encodes_exact_byte_rate() {
        let rate = crate::models::sample_buffer::MAX_SAMPLE_RATE;
        let buffer = SampleBuffer::mono(vec![0.0, 0.5], rate).unwrap();
        let wav = encode_wav(&buffer);

        assert_eq!(u32_at(wav.as_bytes(), 24), rate);
        assert_eq!(u32_at(wav.as_bytes(), 28), rate * 2);
    }

    #[test]
    fn streaming_header_is_repaired_to_actual_length() {
        let mut bytes = streaming_wav_header(16000).to_vec();
        assert_eq!(u32_at(&bytes, 40), STREAMING_SIZE_PLACEHOLDER);
        assert_eq!(u32_at(&bytes, 28), 32000);
        bytes.extend_from_slice(&[0u8; 10]);

        assert!(repair_streaming_header(&mut bytes));
        assert_eq!(u32_at(&bytes, 40), 10);
        assert_eq!(u32_at(&bytes, 4), 46);
        assert!(!repair_streaming_header(&mut bytes));
    }

    #[test]
    fn finished_headers_are_left_alone() {
        let wav = encode_wav(&SampleBuffer::mono(vec![0.1; 8], 8000).unwrap());
        let mut bytes = wav.clone().into_bytes();

        assert!(!repair_streaming_header(&mut bytes));
        assert_eq!(bytes, wav.into_bytes());
        assert!(!repair_streaming_header(&mut b"RIFF".to_vec()));
    }

    #[test]
    fn pcm16_appends_little_endian_samples() {
        let mut out = vec![0xAA];
        write_pcm16(&mut out, [0.0, 1.0, -1.0]);

        assert_eq!(out, vec![0xAA, 0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let samples: Vec<f32> = (0..512).map(|i| (i as f32 * 0.05).sin()).collect();
        let buffer = SampleBuffer::mono(samples, 44100).unwrap();

        assert_eq!(encode_wav(&buffer), encode_wav(&buffer));
    }
}
