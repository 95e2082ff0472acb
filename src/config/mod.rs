//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → AdmissionPolicy / RateLimiter built from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates, refusing changes to startup-only fields
//!     → server swaps the policy and reconfigures the limiter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Listener, upstream, timeouts, sweep interval and observability are fixed at
//!   startup; a reload that changes any of them is refused as a whole

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdmissionConfig, CorsConfig, ExecutionMode, GatewayConfig, ListenerConfig,
    ObservabilityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{check_reload, validate_config, ValidationError};
