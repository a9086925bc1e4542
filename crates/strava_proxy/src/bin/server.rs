use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use strava_client::StravaClient;
use strava_client::config::Config;
use strava_client::http_client::ReqwestStravaClient;
use strava_proxy::{AppState, ServerConfig, router};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Configure logging from env var `STRAVA_PROXY_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("STRAVA_PROXY_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(log_env.clone())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    info!(%log_env, "strava_proxy: log filter");

    let strava_config = Config::from_env()?;
    let missing = strava_config.missing_credentials();
    if !missing.is_empty() {
        // requests answer 500 until these are provided
        warn!(?missing, "Strava credentials are not configured");
    }
    let server_config = ServerConfig::from_env()?;
    if strava_config.request_timeout >= server_config.request_timeout {
        // the request deadline fires first and hides the upstream error
        warn!(
            upstream_timeout = ?strava_config.request_timeout,
            request_timeout = ?server_config.request_timeout,
            "STRAVA_TIMEOUT_SECS should be below REQUEST_TIMEOUT_SECS"
        );
    }

    let metrics = PrometheusBuilder::new().install_recorder()?;

    let client: Arc<dyn StravaClient> = Arc::new(ReqwestStravaClient::new(strava_config)?);
    let state = AppState::new(client, server_config.summary.clone()).with_metrics(metrics);
    let app = router(state, server_config.request_timeout);

    let addr = server_config.address;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind to address {addr}: {e}"))?;
    info!(
        %addr,
        timezone = %server_config.summary.timezone,
        "starting HTTP server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("failed to install ctrl+c handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}
