//! Startup orchestration.
//!
//! Order: logging, metrics, listener, config watcher, signal handler, server.
//! Any startup error is fatal.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bring the gateway up and serve until a termination signal.
///
/// When `config_path` is given, edits to that file are hot-reloaded.
pub async fn run(config: GatewayConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "admission-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = ?config.upstream.address,
        window_secs = config.admission.window_secs,
        max_requests = config.admission.max_requests,
        max_body_bytes = config.admission.max_body_bytes,
        mode = ?config.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    // Keep the watcher alive for the whole run.
    let (config_updates, _watcher) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(&path, config.clone());
            (rx, Some(watcher.run()?))
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::wait_for_signal(shutdown.clone()));

    HttpServer::new(config)
        .run(listener, config_updates, server_shutdown)
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
