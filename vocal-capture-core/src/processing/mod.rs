#[cfg(feature = "opus")]
pub mod opus_codec;
pub mod pcm_decoder;
pub mod wav_format;
pub mod waveform;
