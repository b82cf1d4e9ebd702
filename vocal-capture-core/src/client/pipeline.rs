use crate::client::analysis::{AnalysisClient, AnalysisResult};
use crate::models::error::{AnalysisError, PipelineError};
use crate::models::recording_result::Recording;
use crate::models::sample_buffer::SampleBuffer;
use crate::processing::pcm_decoder;
use crate::processing::wav_format::{self, WavContainer};

/// A recording decoded and re-encoded into the canonical wire format.
#[derive(Debug, Clone)]
pub struct PreparedAudio {
    pub buffer: SampleBuffer,
    pub wav: WavContainer,
}

/// Decode captured bytes and re-encode them as mono 16-bit WAV.
///
/// `None` or an empty payload is `NoAudio`.
pub fn prepare(raw: Option<&[u8]>, hint: Option<&str>) -> Result<PreparedAudio, PipelineError> {
    let raw = raw
        .filter(|bytes| !bytes.is_empty())
        .ok_or(AnalysisError::NoAudio)?;
    let buffer = pcm_decoder::decode_with_hint(raw, hint)?;
    let wav = wav_format::encode_wav(&buffer);
    Ok(PreparedAudio { buffer, wav })
}

/// Decode → encode → forward, the canonical path from captured bytes to a result.
#[derive(Clone)]
pub struct AnalysisPipeline {
    client: AnalysisClient,
}

impl AnalysisPipeline {
    pub fn new(client: AnalysisClient) -> Self {
        Self { client }
    }

    /// Analyze a recording. No request is sent unless decoding succeeds.
    pub async fn analyze_recording(&self, raw: Option<&[u8]>) -> Result<AnalysisResult, PipelineError> {
        self.analyze_with_hint(raw, None).await
    }

    /// Analyze what a capture session produced; pass `session.recording()`.
    pub async fn analyze_captured(
        &self,
        recording: Option<&Recording>,
    ) -> Result<AnalysisResult, PipelineError> {
        self.analyze_recording(recording.map(|r| r.bytes.as_slice())).await
    }

    pub async fn analyze_with_hint(
        &self,
        raw: Option<&[u8]>,
        hint: Option<&str>,
    ) -> Result<AnalysisResult, PipelineError> {
        let prepared = prepare(raw, hint).inspect_err(|e| {
            log::warn!("recording rejected before upload: {}", e);
        })?;
        self.forward(prepared).await
    }

    /// Send audio that was already prepared, for callers that decode elsewhere.
    pub async fn forward(&self, prepared: PreparedAudio) -> Result<AnalysisResult, PipelineError> {
        log::info!(
            "forwarding {:.2}s of audio ({} WAV bytes)",
            prepared.buffer.duration_secs(),
            prepared.wav.len()
        );
        Ok(self.client.analyze(prepared.wav).await?)
    }
}
