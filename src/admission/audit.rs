//! Structured audit records for rejected requests.
//!
//! Records are `tracing` events under the `admission::audit` target so they can
//! be routed separately by the subscriber. Emitting them cannot fail the
//! request.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::admission::envelope::{ClientIdentity, RequestEnvelope};
use crate::admission::verdict::RejectionKind;
use crate::observability::metrics;

/// One rejection, as written to the audit log.
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub timestamp_ms: u64,
    pub identity: &'a ClientIdentity,
    pub endpoint: &'a str,
    pub method: &'a str,
    pub request_id: &'a str,
    pub kind: &'a RejectionKind,
}

impl<'a> AuditRecord<'a> {
    pub fn new(
        envelope: &'a RequestEnvelope,
        identity: &'a ClientIdentity,
        kind: &'a RejectionKind,
    ) -> Self {
        Self {
            timestamp_ms: unix_millis(),
            identity,
            endpoint: &envelope.path,
            method: envelope.method.as_str(),
            request_id: envelope.request_id.as_deref().unwrap_or("unknown"),
            kind,
        }
    }

    /// Write the record and count it.
    pub fn emit(&self) {
        metrics::record_rejection(self.kind.code());

        match self.kind {
            RejectionKind::RateLimitExceeded => {
                tracing::warn!(
                    target: "admission::audit",
                    timestamp_ms = self.timestamp_ms,
                    identity = %self.identity,
                    endpoint = self.endpoint,
                    method = self.method,
                    request_id = self.request_id,
                    code = self.kind.code(),
                    "Rate limit exceeded"
                );
            }
            RejectionKind::MethodNotAllowed { method } => {
                tracing::warn!(
                    target: "admission::audit",
                    timestamp_ms = self.timestamp_ms,
                    identity = %self.identity,
                    endpoint = self.endpoint,
                    request_id = self.request_id,
                    code = self.kind.code(),
                    method = method.as_str(),
                    "Method not allowed"
                );
            }
            RejectionKind::InvalidContentType { content_type } => {
                tracing::warn!(
                    target: "admission::audit",
                    timestamp_ms = self.timestamp_ms,
                    identity = %self.identity,
                    endpoint = self.endpoint,
                    method = self.method,
                    request_id = self.request_id,
                    code = self.kind.code(),
                    content_type = content_type.as_deref().unwrap_or("<missing>"),
                    "Invalid content type"
                );
            }
            RejectionKind::PayloadTooLarge { size, limit } => {
                tracing::warn!(
                    target: "admission::audit",
                    timestamp_ms = self.timestamp_ms,
                    identity = %self.identity,
                    endpoint = self.endpoint,
                    method = self.method,
                    request_id = self.request_id,
                    code = self.kind.code(),
                    payload_size = *size,
                    limit = *limit,
                    "Payload too large"
                );
            }
            RejectionKind::SuspiciousPayload { rule } => {
                tracing::warn!(
                    target: "admission::audit",
                    timestamp_ms = self.timestamp_ms,
                    identity = %self.identity,
                    endpoint = self.endpoint,
                    method = self.method,
                    request_id = self.request_id,
                    code = self.kind.code(),
                    rule = *rule,
                    "Suspicious payload detected"
                );
            }
            RejectionKind::InternalPipelineError { detail } => {
                tracing::error!(
                    target: "admission::audit",
                    timestamp_ms = self.timestamp_ms,
                    identity = %self.identity,
                    endpoint = self.endpoint,
                    method = self.method,
                    request_id = self.request_id,
                    code = self.kind.code(),
                    detail = detail.as_str(),
                    "Admission pipeline failed"
                );
            }
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
