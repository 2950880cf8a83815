//! # nir-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the bed board. Configuration comes from
//! the environment (see [`AppConfig::from_env`]); `NIR_LOG_FORMAT=json`
//! switches to JSON log lines.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nir_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("NIR_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env();
    match &config.data_dir {
        Some(dir) => tracing::info!(dir = %dir.display(), "using file store"),
        None => tracing::warn!("NIR_DATA_DIR not set; board state is kept in memory only"),
    }
    if !config.simulated_latency.is_zero() {
        tracing::info!(
            delay_ms = config.simulated_latency.as_millis() as u64,
            "simulated latency enabled"
        );
    }

    let port = config.port;
    let state = AppState::with_config(config);
    state
        .run(|service| service.snapshot())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to open the board store")?;

    let app = nir_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("NIR bed board listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
