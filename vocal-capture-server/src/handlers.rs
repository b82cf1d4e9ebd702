//! HTTP handlers for the calling UI.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vocal_capture_core::{
    decode_with_hint, downsample, prepare, AnalysisError, AudioLevels, Envelope, PixelSegment,
};

use crate::config::MAX_WAVEFORM_WIDTH;
use crate::error::ApiError;
use crate::state::AppState;

/// Name of the multipart field carrying the captured audio.
pub const AUDIO_FIELD: &str = "audio";

/// The `audio` part of a multipart upload, if there was one.
#[derive(Debug, Default)]
pub struct AudioUpload {
    pub bytes: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl AudioUpload {
    /// Probe hint: the declared MIME type, else the file extension.
    pub fn hint(&self) -> Option<String> {
        self.content_type
            .clone()
            .filter(|mime| mime != "application/octet-stream")
            .or_else(|| {
                self.filename
                    .as_deref()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase())
            })
    }
}

/// Read the `audio` field of a multipart body, enforcing `limit`.
///
/// Other fields are drained and ignored. A missing field is not an error here.
pub async fn read_audio_field(mut payload: Multipart, limit: usize) -> Result<AudioUpload, ApiError> {
    let mut upload = AudioUpload::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadMultipart(e.to_string()))?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_owned),
                cd.get_filename().map(str::to_owned),
            ),
            None => (None, None),
        };

        if name.as_deref() != Some(AUDIO_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
            }
            continue;
        }

        upload.content_type = field.content_type().map(|mime| mime.essence_str().to_owned());
        upload.filename = filename;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::BadMultipart(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                log::warn!("rejecting upload larger than {} bytes", limit);
                return Err(ApiError::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        upload.bytes = Some(bytes);
    }

    Ok(upload)
}

/// `POST /api/analyze`
///
/// Decodes the uploaded recording, re-encodes it as mono 16-bit WAV and
/// forwards it to the analysis service. The service's JSON comes back as-is.
/// Decoding and encoding run on the blocking pool, off the worker thread.
pub async fn analyze(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let upload = read_audio_field(payload, state.config().max_upload_bytes).await?;
    let hint = upload.hint();

    let prepared = web::block(move || prepare(upload.bytes.as_deref(), hint.as_deref()))
        .await?
        .inspect_err(|e| log::warn!("upload rejected before analysis: {}", e))?;
    let result = state.pipeline().forward(prepared).await?;

    Ok(HttpResponse::Ok().json(result.body))
}

#[derive(Debug, Deserialize)]
pub struct WaveformQuery {
    pub width: Option<usize>,
    pub height: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformResponse {
    pub sample_rate: u32,
    pub frame_count: usize,
    pub duration_secs: f64,
    pub width: usize,
    pub height: u32,
    pub levels: AudioLevels,
    pub envelope: Envelope,
    pub segments: Vec<PixelSegment>,
}

/// `POST /api/waveform?width=W&height=H`
pub async fn waveform(
    state: web::Data<AppState>,
    query: web::Query<WaveformQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let config = state.config();
    let width = query.width.unwrap_or(config.default_waveform_width);
    let height = query.height.unwrap_or(config.default_waveform_height);
    if width > MAX_WAVEFORM_WIDTH {
        return Err(ApiError::BadQuery(format!(
            "width must be at most {}",
            MAX_WAVEFORM_WIDTH
        )));
    }

    let upload = read_audio_field(payload, config.max_upload_bytes).await?;
    let hint = upload.hint();
    let bytes = upload
        .bytes
        .filter(|bytes| !bytes.is_empty())
        .ok_or(AnalysisError::NoAudio)?;

    let response = web::block(move || {
        let buffer = decode_with_hint(&bytes, hint.as_deref())?;
        let envelope = downsample(&buffer, width);
        let segments = envelope.segments(height);
        Ok::<_, ApiError>(WaveformResponse {
            sample_rate: buffer.sample_rate(),
            frame_count: buffer.frame_count(),
            duration_secs: buffer.duration_secs(),
            width,
            height,
            levels: buffer.levels(),
            envelope,
            segments,
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
