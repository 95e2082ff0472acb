//! Request admission gateway library.

pub mod admission;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use admission::{AdmissionPipeline, AdmissionVerdict, RequestEnvelope};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
