//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the admission middleware in front of the handler
//! - Wire up cross-cutting layers (request ID, tracing, timeout)
//! - Own the rate limiter for the process lifetime
//! - Apply configuration reloads and run the eviction sweeper
//! - Serve until the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Json, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admission::AdmissionPipeline;
use crate::config::GatewayConfig;
use crate::http::middleware::admission_middleware;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::upstream::{forward_handler, Upstream};
use crate::lifecycle::sweeper::spawn_sweeper;

/// HTTP server for the admission gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    pipeline: Arc<AdmissionPipeline>,
}

impl HttpServer {
    /// Create a server forwarding admitted requests to `config.upstream`.
    pub fn new(config: GatewayConfig) -> Self {
        let upstream = Upstream::new(config.upstream.address.as_deref());
        let handler = Router::new()
            .fallback(forward_handler)
            .with_state(upstream);
        Self::with_handler(config, handler)
    }

    /// Create a server guarding an arbitrary handler router.
    pub fn with_handler(config: GatewayConfig, handler: Router) -> Self {
        let pipeline = Arc::new(AdmissionPipeline::from_config(&config));
        let router = build_router(&config, pipeline.clone(), handler);
        Self {
            router,
            config,
            pipeline,
        }
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates are applied to the pipeline as they arrive; the
    /// listener address and upstream are fixed for the server's lifetime.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = spawn_sweeper(
            self.pipeline.limiter().clone(),
            Duration::from_secs(self.config.admission.sweep_interval_secs),
            shutdown.resubscribe(),
        );

        let pipeline = self.pipeline.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                pipeline.reload(&config);
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        let _ = sweeper.await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<AdmissionPipeline> {
        &self.pipeline
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router: `/healthz` unguarded, everything else admitted first.
#[allow(deprecated)]
pub fn build_router(
    config: &GatewayConfig,
    pipeline: Arc<AdmissionPipeline>,
    handler: Router,
) -> Router {
    let guarded = handler.layer(middleware::from_fn_with_state(pipeline, admission_middleware));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(guarded)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
