use std::sync::Arc;

use vocal_capture_core::{AnalysisClient, AnalysisPipeline, ConfigError};

use crate::config::ServerConfig;

/// Shared by every worker; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    pipeline: AnalysisPipeline,
}

impl AppState {
    pub fn new(config: ServerConfig, pipeline: AnalysisPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    /// State forwarding to the HTTP analysis service named in `config`.
    pub fn from_config(config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = AnalysisClient::from_config(&config.analysis())?;
        Ok(Self::new(config, AnalysisPipeline::new(client)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.pipeline
    }
}
