//! Opus decoding for symphonia, backed by libopus.
//!
//! symphonia demuxes Opus from Ogg and WebM/Matroska but ships no Opus codec.
//! [`OpusDecoder`] fills that slot so browser recordings
//! (`audio/webm;codecs=opus`, `audio/ogg;codecs=opus`) decode like any other
//! container.

use audiopus::coder::{Decoder as LibOpusDecoder, GenericCtl};
use audiopus::packet::Packet as OpusPacket;
use audiopus::{Channels as OpusChannels, MutSignals, SampleRate};
use parking_lot::Mutex;
use symphonia::core::audio::{AsAudioBufferRef, AudioBuffer, AudioBufferRef, Channels, Signal, SignalSpec};
use symphonia::core::codecs::{
    CodecDescriptor, CodecParameters, Decoder, DecoderOptions, FinalizeResult, CODEC_TYPE_OPUS,
};
use symphonia::core::errors::{decode_error, unsupported_error, Result};
use symphonia::core::formats::Packet;

/// Longest frame a single Opus packet may carry: 120 ms.
const MAX_PACKET_MS: usize = 120;

const DESCRIPTORS: &[CodecDescriptor] = &[CodecDescriptor {
    codec: CODEC_TYPE_OPUS,
    short_name: "opus",
    long_name: "Opus Interactive Audio Codec (libopus)",
    inst_func: instantiate,
}];

fn instantiate(params: &CodecParameters, options: &DecoderOptions) -> Result<Box<dyn Decoder>> {
    Ok(Box::new(OpusDecoder::try_new(params, options)?))
}

fn opus_rate(rate: Option<u32>) -> SampleRate {
    match rate {
        Some(8000) => SampleRate::Hz8000,
        Some(12000) => SampleRate::Hz12000,
        Some(16000) => SampleRate::Hz16000,
        Some(24000) => SampleRate::Hz24000,
        // Everything else decodes at the native 48 kHz clock.
        _ => SampleRate::Hz48000,
    }
}

/// A symphonia [`Decoder`] for mono and stereo Opus streams.
pub struct OpusDecoder {
    params: CodecParameters,
    // Only reached through `get_mut`; the lock exists to make the state `Sync`.
    inner: Mutex<LibOpusDecoder>,
    channel_count: usize,
    interleaved: Vec<f32>,
    buf: AudioBuffer<f32>,
}

impl Decoder for OpusDecoder {
    fn try_new(params: &CodecParameters, _options: &DecoderOptions) -> Result<Self> {
        let (opus_channels, layout) = match params.channels.map(|c| c.count()) {
            Some(1) => (OpusChannels::Mono, Channels::FRONT_LEFT),
            Some(2) | None => (OpusChannels::Stereo, Channels::FRONT_LEFT | Channels::FRONT_RIGHT),
            Some(_) => return unsupported_error("opus: multistream layouts are not supported"),
        };
        let rate = opus_rate(params.sample_rate);
        let inner = match LibOpusDecoder::new(rate, opus_channels) {
            Ok(inner) => inner,
            Err(e) => {
                log::error!("libopus refused to create a decoder: {}", e);
                return unsupported_error("opus: decoder initialisation failed");
            }
        };

        let rate_hz = rate as u32;
        let channel_count = layout.count();
        let max_frames = rate_hz as usize * MAX_PACKET_MS / 1000;

        let mut params = params.clone();
        params.with_sample_rate(rate_hz).with_channels(layout);

        Ok(Self {
            params,
            inner: Mutex::new(inner),
            channel_count,
            interleaved: vec![0.0; max_frames * channel_count],
            buf: AudioBuffer::new(max_frames as u64, SignalSpec::new(rate_hz, layout)),
        })
    }

    fn supported_codecs() -> &'static [CodecDescriptor] {
        DESCRIPTORS
    }

    fn reset(&mut self) {
        if let Err(e) = self.inner.get_mut().reset_state() {
            log::warn!("failed to reset opus decoder state: {}", e);
        }
    }

    fn codec_params(&self) -> &CodecParameters {
        &self.params
    }

    fn decode(&mut self, packet: &Packet) -> Result<AudioBufferRef<'_>> {
        self.buf.clear();

        let Ok(input) = OpusPacket::try_from(packet.buf()) else {
            return decode_error("opus: empty packet");
        };
        let Ok(output) = MutSignals::try_from(&mut self.interleaved[..]) else {
            return decode_error("opus: output buffer too large");
        };
        let frames = match self.inner.get_mut().decode_float(Some(input), output, false) {
            Ok(frames) => frames,
            Err(e) => {
                log::debug!("libopus rejected a packet: {}", e);
                return decode_error("opus: invalid packet");
            }
        };

        self.buf.render_reserved(Some(frames));
        for ch in 0..self.channel_count {
            let plane = self.buf.chan_mut(ch);
            for (frame, sample) in plane.iter_mut().enumerate() {
                *sample = self.interleaved[frame * self.channel_count + ch];
            }
        }
        Ok(self.buf.as_audio_buffer_ref())
    }

    fn finalize(&mut self) -> FinalizeResult {
        FinalizeResult::default()
    }

    fn last_decoded(&self) -> AudioBufferRef<'_> {
        self.buf.as_audio_buffer_ref()
    }
}
