//! Security subsystem.
//!
//! Leaf components used by the admission pipeline.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per identity + endpoint window)
//!     → limits.rs (content type, body ceiling)
//!     → inspector.rs (injection signatures in the body)
//!     → headers.rs (security headers, CORS origin)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod inspector;
pub mod limits;
pub mod rate_limit;

pub use headers::CorsPolicy;
pub use inspector::PayloadInspector;
pub use rate_limit::{RateLimiter, RateLimits, UNKNOWN_IDENTITY};
