//! Decoding captured audio containers into a [`SampleBuffer`].
//!
//! Any container and codec symphonia recognizes is accepted; the sample rate
//! and channel layout come from the stream itself. With the `opus` feature the
//! codec set also covers Opus, which browsers record into WebM and Ogg.

use std::io::{Cursor, ErrorKind};
use std::sync::OnceLock;

use symphonia::core::audio::{AudioBuffer, Signal};
use symphonia::core::codecs::{CodecRegistry, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::models::error::DecodeError;
use crate::models::sample_buffer::SampleBuffer;
use crate::processing::wav_format;

/// symphonia's enabled codecs, plus Opus when built with the `opus` feature.
fn codecs() -> &'static CodecRegistry {
    static CODECS: OnceLock<CodecRegistry> = OnceLock::new();
    CODECS.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        symphonia::default::register_enabled_codecs(&mut registry);
        #[cfg(feature = "opus")]
        registry.register_all::<crate::processing::opus_codec::OpusDecoder>();
        registry
    })
}

/// Decode a complete audio container held in memory.
pub fn decode(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    decode_with_hint(bytes, None)
}

/// Decode with a format hint: a MIME type (`audio/wav`) or a file extension (`wav`).
///
/// The hint only steers probing; the container is still verified.
pub fn decode_with_hint(bytes: &[u8], hint: Option<&str>) -> Result<SampleBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut probe_hint = Hint::new();
    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        if hint.contains('/') {
            probe_hint.mime_type(hint);
        } else {
            probe_hint.with_extension(hint);
        }
    }

    let mut owned = bytes.to_vec();
    if wav_format::repair_streaming_header(&mut owned) {
        log::debug!("patched streaming WAV header for {} bytes", owned.len());
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(owned)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &probe_hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unrecognized(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::UnsupportedCodec(e.to_string()))?;

    let mut sample_rate = decoder.codec_params().sample_rate;
    let mut channels: Vec<Vec<f32>> =
        vec![Vec::new(); codec_params.channels.map(|c| c.count()).unwrap_or(1).max(1)];
    let mut planar: Option<AudioBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }
        if packet.buf().is_empty() {
            break;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A single bad packet is recoverable; skip it and keep going.
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        };

        let spec = *decoded.spec();
        if spec.channels.count() != channels.len() {
            if channels.iter().all(Vec::is_empty) {
                channels = vec![Vec::new(); spec.channels.count().max(1)];
            } else {
                return Err(DecodeError::Corrupt(format!(
                    "channel count changed mid-stream ({} → {})",
                    channels.len(),
                    spec.channels.count()
                )));
            }
        }
        sample_rate.get_or_insert(spec.rate);

        let needs_alloc = planar
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() || *buf.spec() != spec);
        if needs_alloc {
            planar = Some(AudioBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = planar.as_mut() {
            decoded.convert(buf);
            for (ch, out) in channels.iter_mut().enumerate() {
                out.extend_from_slice(buf.chan(ch));
            }
        }
    }

    let decoded_frames = channels[0].len() as u64;
    if let Some(expected) = codec_params.n_frames {
        if decoded_frames < expected {
            return Err(DecodeError::Truncated {
                expected,
                decoded: decoded_frames,
            });
        }
    }

    let sample_rate = sample_rate.ok_or(DecodeError::MissingSampleRate)?;
    let buffer = SampleBuffer::new(channels, sample_rate)?;

    log::info!(
        "decoded {} frames x {} channel(s) at {} Hz",
        buffer.frame_count(),
        buffer.channel_count(),
        buffer.sample_rate()
    );

    Ok(buffer)
}
