//! Server settings.
//!
//! Layered lowest to highest: built-in defaults, an optional
//! `vocal-capture.{toml,json,yaml}` file, then `VOCAL_*` environment
//! variables (`VOCAL_MAX_UPLOAD_BYTES` sets `max_upload_bytes`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vocal_capture_core::{AnalysisConfig, ConfigError};

/// Base name of the optional settings file, looked up in the working directory.
pub const CONFIG_FILE: &str = "vocal-capture";

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "VOCAL";

/// Widest envelope the waveform endpoint will compute.
pub const MAX_WAVEFORM_WIDTH: usize = 8192;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Bridge server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Where recordings are forwarded for analysis.
    pub analysis_endpoint: String,
    pub analysis_timeout_secs: u64,
    /// Largest accepted `audio` upload.
    pub max_upload_bytes: usize,
    /// Envelope width when the request does not ask for one (canvas pixels).
    pub default_waveform_width: usize,
    pub default_waveform_height: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            bind_address: "127.0.0.1:3000".into(),
            analysis_endpoint: analysis.endpoint,
            analysis_timeout_secs: analysis.timeout_secs,
            max_upload_bytes: 25 * 1024 * 1024,
            default_waveform_width: 600,
            default_waveform_height: 150,
        }
    }
}

impl ServerConfig {
    /// Defaults, then `vocal-capture.*` if present, then the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(CONFIG_FILE, None)
    }

    /// Load with an explicit settings file and, optionally, an environment map
    /// standing in for the process environment.
    pub fn load_from(file: &str, env: Option<config::Map<String, String>>) -> Result<Self, SettingsError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Settings for the analysis client.
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            endpoint: self.analysis_endpoint.clone(),
            timeout_secs: self.analysis_timeout_secs,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::invalid("bind_address", "must not be empty"));
        }
        self.analysis().validate()?;
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid("max_upload_bytes", "must be greater than zero"));
        }
        if self.default_waveform_width == 0 || self.default_waveform_width > MAX_WAVEFORM_WIDTH {
            return Err(ConfigError::invalid(
                "default_waveform_width",
                format!("must be between 1 and {}", MAX_WAVEFORM_WIDTH),
            ));
        }
        if self.default_waveform_height == 0 {
            return Err(ConfigError::invalid("default_waveform_height", "must be greater than zero"));
        }
        Ok(())
    }
}
