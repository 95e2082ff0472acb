//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Production origin used by the default CORS policy.
pub const DEFAULT_PRODUCTION_ORIGIN: &str = "https://lucrazi.com.br";

/// Root configuration for the admission gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Execution mode. Development mode relaxes the CORS fallback to `*`.
    pub mode: ExecutionMode,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Where admitted requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Admission pipeline limits.
    pub admission: AdmissionConfig,

    /// CORS allow-list.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Upstream application receiving admitted requests.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). `None` answers 503.
    pub address: Option<String>,
}

/// Admission pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Rate-limit window length in seconds.
    pub window_secs: u64,

    /// Maximum requests per (identity, endpoint) per window.
    pub max_requests: u32,

    /// Methods accepted by the gateway.
    pub allowed_methods: Vec<String>,

    /// Ceiling for the serialized request body in bytes.
    pub max_body_bytes: usize,

    /// Hard cap on raw bytes read from the request stream. Transport-level
    /// guard only; the serialized ceiling above is what normally rejects.
    pub max_raw_body_bytes: usize,

    /// How often idle rate-limit windows are swept, in seconds.
    pub sweep_interval_secs: u64,

    /// A window idle for this many window lengths is evicted.
    pub idle_multiplier: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 30,
            allowed_methods: vec!["GET".into(), "POST".into(), "OPTIONS".into()],
            max_body_bytes: 10 * 1024,
            max_raw_body_bytes: 1024 * 1024,
            sweep_interval_secs: 60,
            idle_multiplier: 3,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins echoed back verbatim in `Access-Control-Allow-Origin`.
    pub allowed_origins: Vec<String>,

    /// Origin used when only a matching `Referer` is present.
    pub production_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".into(),
                "http://localhost:5173".into(),
                DEFAULT_PRODUCTION_ORIGIN.into(),
            ],
            production_origin: DEFAULT_PRODUCTION_ORIGIN.into(),
        }
    }
}

/// Deployment mode of the process.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Production,
    Development,
}

impl ExecutionMode {
    pub fn is_development(self) -> bool {
        self == ExecutionMode::Development
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
