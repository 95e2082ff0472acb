//! Request admission pipeline.
//!
//! Checks run in a fixed order and stop at the first rejection:
//!
//! ```text
//! identity → rate limit → method allow-list → security headers
//!          → OPTIONS preflight → content type (POST) → body ceiling
//!          → payload inspection → admit
//! ```
//!
//! The order is observable (a flood of DELETEs is answered with 429, not 405)
//! and must not change.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::{HeaderMap, Method};

use crate::admission::audit::AuditRecord;
use crate::admission::envelope::{Payload, RequestEnvelope};
use crate::admission::verdict::{Admission, AdmissionVerdict, RejectionKind};
use crate::config::GatewayConfig;
use crate::observability::metrics;
use crate::security::headers::security_headers;
use crate::security::limits::{self, exceeds_ceiling};
use crate::security::{CorsPolicy, PayloadInspector, RateLimiter, RateLimits};

/// Reloadable part of the pipeline configuration.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub allowed_methods: Vec<Method>,
    pub max_body_bytes: usize,
    /// Raw stream cap used while buffering.
    pub max_raw_body_bytes: usize,
    pub cors: CorsPolicy,
}

impl AdmissionPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let allowed_methods = config
            .admission
            .allowed_methods
            .iter()
            .filter_map(|name| match Method::from_bytes(name.trim().to_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    tracing::warn!(method = %name, "Ignoring invalid method in allow-list");
                    None
                }
            })
            .collect();

        Self {
            allowed_methods,
            max_body_bytes: config.admission.max_body_bytes,
            max_raw_body_bytes: config.admission.max_raw_body_bytes,
            cors: CorsPolicy::new(&config.cors, config.mode),
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }
}

/// Evaluates every inbound request before it reaches a handler.
///
/// Holds no per-request state; the only cross-request state lives in the
/// shared [`RateLimiter`].
pub struct AdmissionPipeline {
    limiter: Arc<RateLimiter>,
    inspector: PayloadInspector,
    policy: ArcSwap<AdmissionPolicy>,
}

impl AdmissionPipeline {
    pub fn new(config: &GatewayConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            inspector: PayloadInspector::new(),
            policy: ArcSwap::from_pointee(AdmissionPolicy::from_config(config)),
        }
    }

    /// Build a pipeline with its own limiter.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(RateLimits::from_config(&config.admission)));
        Self::new(config, limiter)
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn policy(&self) -> Arc<AdmissionPolicy> {
        self.policy.load_full()
    }

    /// Apply a reloaded configuration. Rate windows survive the reload.
    pub fn reload(&self, config: &GatewayConfig) {
        self.policy.store(Arc::new(AdmissionPolicy::from_config(config)));
        self.limiter
            .reconfigure(RateLimits::from_config(&config.admission));
        tracing::info!("Admission policy reloaded");
    }

    /// Evaluate a request, auditing any rejection.
    pub fn admit(&self, envelope: &RequestEnvelope) -> Admission {
        let identity = envelope.identity();
        let admission = self.evaluate(envelope, identity.as_str());

        if let AdmissionVerdict::Reject(kind) = &admission.verdict {
            AuditRecord::new(envelope, &identity, kind).emit();
        } else {
            tracing::debug!(
                identity = %identity,
                endpoint = %envelope.path,
                method = %envelope.method,
                outcome = admission.verdict.outcome(),
                "Request admitted"
            );
        }
        metrics::record_admission(admission.verdict.outcome());

        admission
    }

    fn evaluate(&self, envelope: &RequestEnvelope, identity: &str) -> Admission {
        let policy = self.policy.load();

        if !self.limiter.check(identity, &envelope.path) {
            return Admission::reject(RejectionKind::RateLimitExceeded, HeaderMap::new());
        }

        if !policy.allows(&envelope.method) {
            return Admission::reject(
                RejectionKind::MethodNotAllowed {
                    method: envelope.method.to_string(),
                },
                HeaderMap::new(),
            );
        }

        let headers = security_headers(&envelope.headers, &policy.cors);

        if envelope.method == Method::OPTIONS {
            return Admission {
                verdict: AdmissionVerdict::Preflight,
                headers,
            };
        }

        if Payload::requires_json(&envelope.method) && !limits::is_json_content_type(&envelope.headers) {
            let content_type = limits::content_type(&envelope.headers).map(str::to_string);
            return Admission::reject(RejectionKind::InvalidContentType { content_type }, headers);
        }

        let body = match &envelope.payload {
            Payload::Absent => None,
            Payload::Json(value) => Some(value.to_string()),
            Payload::Opaque(bytes) => {
                if exceeds_ceiling(bytes.len(), policy.max_body_bytes) {
                    return Admission::reject(
                        RejectionKind::PayloadTooLarge {
                            size: bytes.len(),
                            limit: policy.max_body_bytes,
                        },
                        headers,
                    );
                }
                // Binary bodies are passed through uninspected.
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            Payload::Oversized { read_limit } => {
                return Admission::reject(
                    RejectionKind::PayloadTooLarge {
                        size: *read_limit,
                        limit: policy.max_body_bytes,
                    },
                    headers,
                );
            }
            Payload::Malformed(reason) => {
                return Admission::reject(
                    RejectionKind::internal(format!("request body is not valid JSON: {}", reason)),
                    headers,
                );
            }
        };

        if let Some(text) = body {
            if exceeds_ceiling(text.len(), policy.max_body_bytes) {
                return Admission::reject(
                    RejectionKind::PayloadTooLarge {
                        size: text.len(),
                        limit: policy.max_body_bytes,
                    },
                    headers,
                );
            }

            if let Some(rule) = self.inspector.first_match_in(&text) {
                return Admission::reject(RejectionKind::SuspiciousPayload { rule }, headers);
            }
        }

        Admission {
            verdict: AdmissionVerdict::Admit,
            headers,
        }
    }
}
