//! Security response headers and the CORS origin decision.
//!
//! The header set is computed once per request and attached to whatever the
//! gateway returns from that point on: rejections, preflight answers and
//! responses from the upstream handler.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::config::{CorsConfig, ExecutionMode};

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; frame-ancestors 'none'";
pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";

/// CORS allow-list and mode, resolved from configuration.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    production_origin: String,
    development: bool,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig, mode: ExecutionMode) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            production_origin: config.production_origin.clone(),
            development: mode.is_development(),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` to omit the header.
    ///
    /// An allow-listed `Origin` is echoed. Without an `Origin`, a `Referer` under
    /// the production origin yields the production origin. Development mode
    /// falls back to `*`.
    pub fn allow_origin(&self, origin: Option<&str>, referer: Option<&str>) -> Option<String> {
        if let Some(origin) = origin {
            if self.allowed_origins.iter().any(|allowed| allowed == origin) {
                return Some(origin.to_string());
            }
        } else if referer.is_some_and(|r| r.starts_with(&self.production_origin)) {
            return Some(self.production_origin.clone());
        }

        if self.development {
            Some("*".to_string())
        } else {
            None
        }
    }
}

/// Build the full response header set for a request.
pub fn security_headers(request_headers: &HeaderMap, cors: &CorsPolicy) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );

    let origin = header_str(request_headers, &header::ORIGIN);
    let referer = header_str(request_headers, &header::REFERER);
    if let Some(allowed) = cors.allow_origin(origin, referer) {
        // An echoed origin already came from a valid header value.
        if let Ok(value) = HeaderValue::from_str(&allowed) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );

    headers
}

/// Copy every header in `extra` onto `target`, replacing existing values.
pub fn apply(target: &mut HeaderMap, extra: &HeaderMap) {
    for (name, value) in extra {
        target.insert(name.clone(), value.clone());
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: ExecutionMode) -> CorsPolicy {
        CorsPolicy::new(&CorsConfig::default(), mode)
    }

    #[test]
    fn allow_listed_origin_is_echoed() {
        let p = policy(ExecutionMode::Production);
        assert_eq!(
            p.allow_origin(Some("https://lucrazi.com.br"), None).as_deref(),
            Some("https://lucrazi.com.br")
        );
        assert_eq!(
            p.allow_origin(Some("http://localhost:5173"), None).as_deref(),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn unknown_origin_omitted_in_production() {
        let p = policy(ExecutionMode::Production);
        assert_eq!(p.allow_origin(Some("https://evil.example"), None), None);
        // A matching referer does not rescue a foreign Origin.
        assert_eq!(
            p.allow_origin(Some("https://evil.example"), Some("https://lucrazi.com.br/checkout")),
            None
        );
    }

    #[test]
    fn referer_fallback_without_origin() {
        let p = policy(ExecutionMode::Production);
        assert_eq!(
            p.allow_origin(None, Some("https://lucrazi.com.br/cursos/1")).as_deref(),
            Some("https://lucrazi.com.br")
        );
        assert_eq!(p.allow_origin(None, Some("https://other.example/")), None);
        assert_eq!(p.allow_origin(None, None), None);
    }

    #[test]
    fn development_falls_back_to_wildcard() {
        let p = policy(ExecutionMode::Development);
        assert_eq!(p.allow_origin(Some("https://evil.example"), None).as_deref(), Some("*"));
        assert_eq!(p.allow_origin(None, None).as_deref(), Some("*"));
    }

    #[test]
    fn fixed_headers_always_present() {
        let headers = security_headers(&HeaderMap::new(), &policy(ExecutionMode::Production));
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], STRICT_TRANSPORT_SECURITY);
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], CONTENT_SECURITY_POLICY);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn apply_overrides_existing_values() {
        let mut target = HeaderMap::new();
        target.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        let extra = security_headers(&HeaderMap::new(), &policy(ExecutionMode::Production));
        apply(&mut target, &extra);
        assert_eq!(target[header::X_FRAME_OPTIONS], "DENY");
    }
}
