//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Logging/metrics → Bind → Watcher → Serve
//!
//! Running (sweeper.rs):
//!     Periodically evict idle rate-limit windows
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → server drains, sweeper exits
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod sweeper;

pub use shutdown::Shutdown;
