//! The inbound request as seen by the pipeline.

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderMap, Method};
use serde_json::Value;

use crate::security::UNKNOWN_IDENTITY;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Request body after buffering.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body, or a method that carries none.
    Absent,
    /// Parsed JSON document.
    Json(Value),
    /// A JSON-only method whose body did not parse.
    Malformed(String),
    /// Non-JSON body on a method exempt from the content-type check.
    Opaque(Vec<u8>),
    /// The body stream exceeded the read limit before it was fully buffered.
    Oversized { read_limit: usize },
}

impl Payload {
    /// Methods that never carry a payload.
    pub fn method_carries_body(method: &Method) -> bool {
        !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Methods whose body must be `application/json`.
    pub fn requires_json(method: &Method) -> bool {
        *method == Method::POST
    }

    /// Interpret buffered bytes for the given method.
    pub fn from_bytes(method: &Method, bytes: &[u8]) -> Self {
        if !Self::method_carries_body(method) || bytes.is_empty() {
            return Payload::Absent;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Payload::Json(value),
            Err(_) if !Self::requires_json(method) => Payload::Opaque(bytes.to_vec()),
            Err(e) => Payload::Malformed(e.to_string()),
        }
    }
}

/// One request, owned by the pipeline while it is evaluated.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Raw connection address, if the transport exposes one.
    pub peer: Option<SocketAddr>,
    pub request_id: Option<String>,
    pub payload: Payload,
}

impl RequestEnvelope {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            peer: None,
            request_id: None,
            payload: Payload::Absent,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity::derive(&self.headers, self.peer)
    }
}

/// Best-effort caller identity used as the rate-limit partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// First entry of `x-forwarded-for`, else the peer IP, else `"unknown"`.
    pub fn derive(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (forwarded, peer) {
            (Some(addr), _) => Self(addr.to_string()),
            (None, Some(peer)) => Self(peer.ip().to_string()),
            (None, None) => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_IDENTITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_IDENTITY
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
