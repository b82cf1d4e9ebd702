use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use vocal_capture_core::{AnalysisError, DecodeError, PipelineError};

/// Errors a handler can return; each becomes a JSON `{ "error": ... }` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed multipart upload: {0}")]
    BadMultipart(String),

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("invalid query: {0}")]
    BadQuery(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The blocking pool dropped the job, or it panicked.
    #[error("audio processing was interrupted")]
    Blocking(#[from] BlockingError),
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        ApiError::Pipeline(e.into())
    }
}

impl From<DecodeError> for ApiError {
    fn from(e: DecodeError) -> Self {
        ApiError::Pipeline(e.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadMultipart(_) | ApiError::BadQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(PipelineError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Analysis(e)) => match e {
                AnalysisError::NoAudio => StatusCode::BAD_REQUEST,
                AnalysisError::Transport { .. } | AnalysisError::MalformedResponse { .. } => {
                    StatusCode::BAD_GATEWAY
                }
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({ "error": self.to_string() });
        if let ApiError::Pipeline(PipelineError::Analysis(e)) = self {
            if let Some(raw) = e.raw_body() {
                body["raw"] = json!(raw);
            }
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
