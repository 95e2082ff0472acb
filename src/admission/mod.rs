//! Admission subsystem.
//!
//! # Data Flow
//! ```text
//! http middleware builds RequestEnvelope
//!     → pipeline.rs (ordered checks, uses security/*)
//!     → verdict.rs (Admit | Preflight | Reject(kind))
//!     → audit.rs (one structured record per rejection)
//!     → http/response.rs turns the verdict into a response
//! ```

pub mod audit;
pub mod envelope;
pub mod pipeline;
pub mod verdict;

pub use envelope::{ClientIdentity, Payload, RequestEnvelope};
pub use pipeline::{AdmissionPipeline, AdmissionPolicy};
pub use verdict::{Admission, AdmissionVerdict, ErrorBody, RejectionKind};
