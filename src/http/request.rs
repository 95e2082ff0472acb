//! Request identification and envelope construction.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Buffer the body up to a hard read limit
//! - Build the `RequestEnvelope` the admission pipeline evaluates

use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{request::Parts, HeaderName, HeaderValue, Request},
};
use futures_util::StreamExt;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

use crate::admission::{Payload, RequestEnvelope};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Layer assigning `x-request-id` to requests that arrive without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), UuidRequestId)
}

/// Layer echoing the request's `x-request-id` on the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Result of draining a request body.
pub enum BufferedBody {
    /// Method carries no payload; the original body is passed through untouched.
    Skipped(Body),
    Complete(Bytes),
    Oversized,
    Failed(String),
}

/// Drain `body`, giving up once more than `limit` bytes have arrived.
pub async fn buffer_body(parts: &Parts, body: Body, limit: usize) -> BufferedBody {
    if !Payload::method_carries_body(&parts.method) {
        return BufferedBody::Skipped(body);
    }

    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                if buf.len() + chunk.len() > limit {
                    return BufferedBody::Oversized;
                }
                buf.extend_from_slice(&chunk);
            }
            Err(e) => return BufferedBody::Failed(e.to_string()),
        }
    }
    BufferedBody::Complete(Bytes::from(buf))
}

/// Build the envelope for a request whose body has been buffered.
pub fn envelope(parts: &Parts, buffered: &BufferedBody, limit: usize) -> RequestEnvelope {
    let payload = match buffered {
        BufferedBody::Skipped(_) => Payload::Absent,
        BufferedBody::Complete(bytes) => Payload::from_bytes(&parts.method, bytes),
        BufferedBody::Oversized => Payload::Oversized { read_limit: limit },
        BufferedBody::Failed(reason) => {
            Payload::Malformed(format!("failed to read request body: {}", reason))
        }
    };

    let mut envelope = RequestEnvelope::new(parts.method.clone(), parts.uri.path())
        .with_headers(parts.headers.clone())
        .with_payload(payload);

    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        envelope = envelope.with_peer(*addr);
    }
    if let Some(id) = request_id(parts) {
        envelope = envelope.with_request_id(id);
    }
    envelope
}

pub fn request_id(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
