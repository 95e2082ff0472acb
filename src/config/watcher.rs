//! Configuration file watcher for hot reload.
//!
//! Every edit is loaded and validated, then compared against the config the
//! gateway is running with. Only reloads that stay within the runtime-applied
//! fields reach the server; anything else keeps the current configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;
use crate::config::validation::{check_reload, ValidationError};

/// Watches the configuration file and forwards accepted reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    active: Arc<ArcSwap<GatewayConfig>>,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, starting from the config currently served.
    ///
    /// Returns the watcher and a receiver for accepted configuration updates.
    pub fn new(
        path: &Path,
        active: GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                active: Arc::new(ArcSwap::from_pointee(active)),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let active = self.active.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Config file changed");
                    let next = match load_config(&path) {
                        Ok(next) => next,
                        Err(e) => {
                            tracing::error!(error = %e, "Reload rejected, keeping current configuration");
                            return;
                        }
                    };
                    match accept_reload(&active, next) {
                        Ok(accepted) => {
                            let _ = tx.send(accepted);
                        }
                        Err(errors) => {
                            for error in &errors {
                                tracing::error!(error = %error, "Reload rejected, keeping current configuration");
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Accept `next` if it only changes runtime fields, making it the new baseline.
fn accept_reload(
    active: &ArcSwap<GatewayConfig>,
    next: GatewayConfig,
) -> Result<GatewayConfig, Vec<ValidationError>> {
    check_reload(&active.load(), &next)?;
    active.store(Arc::new(next.clone()));
    Ok(next)
}
