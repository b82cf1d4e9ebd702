//! # vocal-capture-server
//!
//! HTTP bridge between the calling UI and the remote analysis service.
//!
//! ```text
//! GET  /health
//! POST /api/analyze              multipart `audio` → decode → WAV → analysis JSON
//! POST /api/waveform?width&height multipart `audio` → decode → envelope JSON
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use actix_web::web;

pub use crate::config::{ServerConfig, SettingsError};
pub use error::ApiError;
pub use state::AppState;

/// Register every route. Shared state is added by the caller with `app_data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadQuery(err.to_string()).into()),
    )
    .route("/health", web::get().to(handlers::health))
    .service(
        web::scope("/api")
            .route("/analyze", web::post().to(handlers::analyze))
            .route("/waveform", web::post().to(handlers::waveform)),
    );
}
