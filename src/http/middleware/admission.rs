//! Admission middleware.
//!
//! Wraps any router: buffers the body, runs the pipeline and either answers
//! directly or hands the rebuilt request to the inner handler. A panic inside
//! the pipeline becomes a generic 500 instead of tearing down the connection.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::admission::audit::AuditRecord;
use crate::admission::{
    Admission, AdmissionPipeline, AdmissionVerdict, RejectionKind, RequestEnvelope,
};
use crate::http::request::{buffer_body, envelope, BufferedBody};
use crate::http::response;
use crate::observability::metrics;

pub async fn admission_middleware(
    State(pipeline): State<Arc<AdmissionPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();

    let limit = pipeline.policy().max_raw_body_bytes;
    let buffered = buffer_body(&parts, body, limit).await;
    let envelope = envelope(&parts, &buffered, limit);

    let admission = contain(&envelope, || pipeline.admit(&envelope));

    let response = match admission.verdict {
        AdmissionVerdict::Reject(ref kind) => response::rejection_response(kind, &admission.headers),
        AdmissionVerdict::Preflight => response::preflight_response(&admission.headers),
        AdmissionVerdict::Admit => {
            let body = match buffered {
                BufferedBody::Skipped(body) => body,
                BufferedBody::Complete(bytes) => Body::from(bytes),
                // Both are rejected by the pipeline before reaching here.
                BufferedBody::Oversized | BufferedBody::Failed(_) => Body::empty(),
            };
            let handled = next.run(Request::from_parts(parts, body)).await;
            response::with_headers(handled, &admission.headers)
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Run `evaluate`, turning a panic into an audited internal error.
///
/// The panic text goes to the audit log only; the client sees the generic
/// internal error body.
pub fn contain<F>(envelope: &RequestEnvelope, evaluate: F) -> Admission
where
    F: FnOnce() -> Admission,
{
    match catch_unwind(AssertUnwindSafe(evaluate)) {
        Ok(admission) => admission,
        Err(panic) => {
            let detail = panic_message(panic.as_ref());
            let kind = RejectionKind::internal(format!("pipeline panicked: {}", detail));
            AuditRecord::new(envelope, &envelope.identity(), &kind).emit();
            Admission::reject(kind, HeaderMap::new())
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
