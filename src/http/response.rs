//! Turning verdicts into responses.
//!
//! Rejections carry `{ "error", "code" }` JSON. Security headers computed by the
//! pipeline are copied onto every response the gateway produces or forwards.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::admission::RejectionKind;
use crate::security::headers;

pub fn rejection_response(kind: &RejectionKind, extra: &HeaderMap) -> Response {
    let mut response = (kind.status(), Json(kind.body())).into_response();
    headers::apply(response.headers_mut(), extra);
    response
}

/// CORS preflight answer: 200 with an empty body.
pub fn preflight_response(extra: &HeaderMap) -> Response {
    let mut response = StatusCode::OK.into_response();
    headers::apply(response.headers_mut(), extra);
    response
}

/// Attach the security headers to a response produced by the handler.
pub fn with_headers(mut response: Response, extra: &HeaderMap) -> Response {
    headers::apply(response.headers_mut(), extra);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[tokio::test]
    async fn rejection_has_json_body_and_headers() {
        let mut extra = HeaderMap::new();
        extra.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

        let response = rejection_response(&RejectionKind::RateLimitExceeded, &extra);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn preflight_is_empty_ok() {
        let response = preflight_response(&HeaderMap::new());
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(bytes.is_empty());
    }
}
