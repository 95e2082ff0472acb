//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID, body buffering, envelope)
//!     → middleware/admission.rs (run the pipeline)
//!     → upstream.rs (forward admitted requests)
//!     → response.rs (verdict → response, security headers)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::{build_router, HttpServer};
