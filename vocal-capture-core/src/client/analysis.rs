use std::sync::Arc;

use serde_json::Value;

use crate::client::transport::{AnalysisTransport, HttpTransport, RawResponse};
use crate::models::config::AnalysisConfig;
use crate::models::error::{AnalysisError, ConfigError};
use crate::processing::wav_format::WavContainer;

/// Parsed answer from the analysis service.
///
/// The body is passed through untouched; its shape is the service's business.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// HTTP status the service answered with. Informational only: any JSON
    /// body counts as a result.
    pub status: u16,
    pub body: Value,
}

/// Sends WAV containers to the analysis service and interprets the replies.
#[derive(Clone)]
pub struct AnalysisClient {
    transport: Arc<dyn AnalysisTransport>,
}

impl AnalysisClient {
    pub fn new(transport: Arc<dyn AnalysisTransport>) -> Self {
        Self { transport }
    }

    /// Client backed by [`HttpTransport`].
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(HttpTransport::from_config(config)?)))
    }

    /// Perform one request carrying `wav` and parse the response body as JSON.
    ///
    /// Exactly one transport call is made; nothing is retried.
    pub async fn analyze(&self, wav: WavContainer) -> Result<AnalysisResult, AnalysisError> {
        let frames = wav.frame_count();
        let response = self.transport.post_wav(wav.into_bytes()).await.inspect_err(|e| {
            log::error!("analysis request failed: {}", e);
        })?;

        log::info!(
            "analysis service answered {} for {} frames ({} byte body)",
            response.status,
            frames,
            response.body.len()
        );
        interpret_response(response)
    }
}

/// Turn a raw response into a result, or a `MalformedResponse` carrying the body.
pub fn interpret_response(response: RawResponse) -> Result<AnalysisResult, AnalysisError> {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(body) => Ok(AnalysisResult {
            status: response.status,
            body,
        }),
        Err(e) => {
            log::warn!(
                "analysis service returned non-JSON body (status {}): {}",
                response.status,
                e
            );
            Err(AnalysisError::MalformedResponse {
                raw: response.body,
                reason: e.to_string(),
            })
        }
    }
}
