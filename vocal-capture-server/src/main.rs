use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

use vocal_capture_server::{configure, AppState, ServerConfig};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::load().context("loading settings")?;
    let state = AppState::from_config(config.clone()).context("building analysis client")?;

    log::info!(
        "vocal-capture-server v{} listening on {}, forwarding to {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_address,
        config.analysis_endpoint
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(&config.bind_address)
    .with_context(|| format!("binding {}", config.bind_address))?
    .run()
    .await
    .context("server terminated with an error")?;

    log::info!("server stopped");
    Ok(())
}
