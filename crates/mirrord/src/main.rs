use anyhow::Result;
use mirror_core::MirrorConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod engine;
mod page;
mod routes;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("mirrord starting");

    let config = Arc::new(MirrorConfig::from_env());
    tracing::info!(
        camera = %config.camera_device,
        capture_path = %config.capture_path.display(),
        log_path = %config.log_path.display(),
        "configuration loaded"
    );

    let engine = engine::spawn_engine(&config)?;
    let app = routes::build_router(routes::AppState {
        engine,
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "mirrord ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("mirrord shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
