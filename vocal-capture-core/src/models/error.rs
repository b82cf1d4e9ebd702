use thiserror::Error;

/// Errors raised by the capture session and its device providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No input device, or permission to use it was refused.
    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("device stream failed: {0}")]
    StreamFailed(String),
}

/// Violations of the `SampleBuffer` invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SampleBufferError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("sample rate {rate} Hz exceeds the {max} Hz maximum")]
    SampleRateTooHigh { rate: u32, max: u32 },

    #[error("sample buffer needs at least one channel")]
    NoChannels,

    #[error("channel {channel} has {actual} frames, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors produced while turning captured bytes into a `SampleBuffer`.
///
/// Decode failures are fatal for the recording attempt and are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("audio payload is empty")]
    Empty,

    #[error("unrecognized audio container: {0}")]
    Unrecognized(String),

    #[error("container has no decodable audio track")]
    NoTrack,

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("container does not declare a sample rate")]
    MissingSampleRate,

    #[error("audio stream truncated: expected {expected} frames, decoded {decoded}")]
    Truncated { expected: u64, decoded: u64 },

    #[error("corrupt audio stream: {0}")]
    Corrupt(String),

    #[error("decoded audio is invalid: {0}")]
    InvalidBuffer(#[from] SampleBufferError),
}

/// Errors from a single exchange with the remote analysis service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Analysis was requested with nothing recorded; no request was sent.
    #[error("no recorded audio to analyze")]
    NoAudio,

    #[error("transport failure: {message}")]
    Transport { message: String, timed_out: bool },

    /// The service answered with a body that is not JSON.
    #[error("analysis service returned a non-JSON response: {reason}")]
    MalformedResponse { raw: String, reason: String },
}

impl AnalysisError {
    /// Raw response body, when the service answered with something unparseable.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Transport {
            message: e.to_string(),
            timed_out: e.is_timeout(),
        }
    }
}

/// Any failure along decode → encode → forward.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
