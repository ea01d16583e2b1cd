use std::sync::Arc;

use anyhow::{Context, Result};
use bugdesk::{
    api::{self, AppState},
    config::Config,
    repository, telemetry,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    telemetry::init(config.log_format)?;

    info!("Starting bugdesk");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {:?}", config.backend);

    let store = Arc::new(
        config
            .connect_store()
            .await
            .context("Failed to connect to the document store")?,
    );
    repository::prepare_store(&store)
        .await
        .context("Failed to prepare the document store")?;

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, api::router(AppState::new(store.clone())))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| error!(error.cause_chain = ?e, error.message = %e, "Unexpected error"))?;

    match Arc::try_unwrap(store) {
        Ok(store) => store
            .shutdown()
            .await
            .context("Failed to shut down the document store")?,
        Err(_) => warn!("Document store still referenced at shutdown"),
    }

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error.message = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
}
