//! Admission verdicts and the rejection taxonomy.

use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Why a request was turned away.
///
/// The `Display` text is what the caller sees; variant fields are kept for the
/// audit log only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionKind {
    #[error("Too many requests. Please try again later.")]
    RateLimitExceeded,

    #[error("Method not allowed")]
    MethodNotAllowed { method: String },

    #[error("Content-Type must be application/json")]
    InvalidContentType { content_type: Option<String> },

    #[error("Request body too large")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Request contains suspicious content")]
    SuspiciousPayload { rule: &'static str },

    #[error("Internal server error")]
    InternalPipelineError { detail: String },
}

impl RejectionKind {
    pub fn status(&self) -> StatusCode {
        match self {
            RejectionKind::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            RejectionKind::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RejectionKind::InvalidContentType { .. } => StatusCode::BAD_REQUEST,
            RejectionKind::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RejectionKind::SuspiciousPayload { .. } => StatusCode::BAD_REQUEST,
            RejectionKind::InternalPipelineError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine code returned in the `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            RejectionKind::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            RejectionKind::InvalidContentType { .. } => "INVALID_CONTENT_TYPE",
            RejectionKind::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            RejectionKind::SuspiciousPayload { .. } => "SUSPICIOUS_PAYLOAD",
            RejectionKind::InternalPipelineError { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        RejectionKind::InternalPipelineError {
            detail: detail.into(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            code: Some(self.code()),
        }
    }
}

/// JSON body sent with every rejection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// The pipeline's terminal decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionVerdict {
    /// Pass to the handler.
    Admit,
    /// CORS preflight answered by the gateway: 200, empty body.
    Preflight,
    Reject(RejectionKind),
}

impl AdmissionVerdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionVerdict::Admit | AdmissionVerdict::Preflight)
    }

    pub fn rejection(&self) -> Option<&RejectionKind> {
        match self {
            AdmissionVerdict::Reject(kind) => Some(kind),
            _ => None,
        }
    }

    /// Label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            AdmissionVerdict::Admit => "admitted",
            AdmissionVerdict::Preflight => "preflight",
            AdmissionVerdict::Reject(_) => "rejected",
        }
    }
}

/// Verdict plus the response headers computed for the request.
///
/// `headers` is empty when the request was rejected before the header step.
#[derive(Debug, Clone)]
pub struct Admission {
    pub verdict: AdmissionVerdict,
    pub headers: HeaderMap,
}

impl Admission {
    pub fn reject(kind: RejectionKind, headers: HeaderMap) -> Self {
        Self {
            verdict: AdmissionVerdict::Reject(kind),
            headers,
        }
    }
}
