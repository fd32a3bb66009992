use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_engine::cart::AppState;
use storefront_engine::config::load_config;
use storefront_engine::data::{DataService, MemoryDataService};
use storefront_engine::demo::seed_catalog;
use storefront_engine::ratelimit::spawn_cleanup_sweep;
use storefront_engine::retry::retry_with_backoff;
use storefront_engine::router::create_app_router;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config().context("failed to load configuration")?;

    // Backend with the demo catalog
    let data = Arc::new(MemoryDataService::new());
    seed_catalog(&data);
    let data: Arc<dyn DataService> = data;

    retry_with_backoff(|| data.ping(), &config.retry)
        .await
        .context("data service unreachable")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    // Initialize application state
    let state = Arc::new(AppState::from_config(config, data).context("failed to open cart store")?);

    let shutdown = CancellationToken::new();
    let sweep = spawn_cleanup_sweep(Arc::clone(&state.rate_limiter), shutdown.clone());

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server running");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            signal.cancel();
        })
        .await
        .context("server error")?;

    shutdown.cancel();
    if let Err(err) = sweep.await {
        tracing::warn!(error = %err, "cleanup sweep ended abnormally");
    }
    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
