//! Middleware wrapping the handler routes.

pub mod admission;

pub use admission::admission_middleware;
