use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::models::config::AnalysisConfig;
use crate::models::error::{AnalysisError, ConfigError};

/// MIME type of every payload sent to the analysis service.
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// What came back from the service, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// One-shot delivery of a WAV payload to the analysis service.
///
/// Implementors perform exactly one request per call and never retry.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn post_wav(&self, wav: Vec<u8>) -> Result<RawResponse, AnalysisError>;
}

/// `POST`s WAV bytes to a fixed HTTP endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from config; the timeout covers the whole exchange.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::invalid("http_client", e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn post_wav(&self, wav: Vec<u8>) -> Result<RawResponse, AnalysisError> {
        log::debug!("POST {} ({} bytes)", self.endpoint, wav.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, WAV_CONTENT_TYPE)
            .body(wav)
            .send()
            .await?;

        let status = response.status().as_u16();
        // Read as text whatever the declared content type; the caller decides
        // whether it is JSON.
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
