use super::error::ConfigError;

/// Where and how the analysis client talks to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Full URL of the analysis endpoint (default: `http://localhost:8080/analyze`).
    pub endpoint: String,

    /// Per-request timeout in seconds, covering connect and body read (default: 30).
    pub timeout_secs: u64,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "endpoint",
                format!("expected an http(s) URL, got {:?}", self.endpoint),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be positive"));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/analyze".into(),
            timeout_secs: 30,
        }
    }
}

/// Limits applied by a capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum bytes accumulated per recording (None = unlimited).
    /// Chunks past the limit are dropped.
    pub max_recording_bytes: Option<usize>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_recording_bytes == Some(0) {
            return Err(ConfigError::invalid("max_recording_bytes", "must be positive"));
        }
        Ok(())
    }
}
