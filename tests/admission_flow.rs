//! End-to-end admission behavior through the layered router.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use admission_gateway::config::{ExecutionMode, GatewayConfig};
use admission_gateway::http::X_REQUEST_ID;
use admission_gateway::HttpServer;

fn app(config: GatewayConfig) -> Router {
    let handler = Router::new()
        .route("/api/plans", get(|| async { Json(json!({ "plans": ["basic", "pro"] })) }))
        .route("/api/checkout", post(|body: Bytes| async move { body }))
        .route("/api/leads", post(|body: Bytes| async move { body }));
    HttpServer::with_handler(config, handler).router()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn assert_security_headers(headers: &HeaderMap) {
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
}

#[tokio::test]
async fn get_is_admitted_with_headers_and_no_cors_origin() {
    let app = app(GatewayConfig::default());
    let response = send(
        &app,
        Request::builder().uri("/api/plans").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(response.headers());
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert_eq!(json_body(response).await["plans"][1], "pro");
}

#[tokio::test]
async fn admitted_body_reaches_handler_intact() {
    let app = app(GatewayConfig::default());
    let body = r#"{"plan":"pro","email":"buyer@example.com"}"#;
    let response = send(&app, post_json("/api/checkout", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], body.as_bytes());
}

#[tokio::test]
async fn thirty_first_checkout_is_rejected() {
    let app = app(GatewayConfig::default());

    for i in 0..30 {
        let response = send(&app, post_json("/api/checkout", r#"{"plan":"pro"}"#)).await;
        assert_eq!(response.status(), StatusCode::OK, "request {}", i + 1);
    }

    let response = send(&app, post_json("/api/checkout", r#"{"plan":"pro"}"#)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn identities_and_endpoints_have_separate_buckets() {
    let mut config = GatewayConfig::default();
    config.admission.max_requests = 1;
    let app = app(config);

    let first = send(&app, post_json("/api/checkout", "{}")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let other_endpoint = send(&app, post_json("/api/leads", "{}")).await;
    assert_eq!(other_endpoint.status(), StatusCode::OK);

    let mut other_client = post_json("/api/checkout", "{}");
    other_client
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
    assert_eq!(send(&app, other_client).await.status(), StatusCode::OK);

    let repeat = send(&app, post_json("/api/checkout", "{}")).await;
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn options_preflight_is_empty_ok_with_cors() {
    let app = app(GatewayConfig::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/checkout")
        .header(header::ORIGIN, "https://lucrazi.com.br")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://lucrazi.com.br"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn foreign_origin_gets_no_allow_origin_in_production() {
    let app = app(GatewayConfig::default());
    let request = Request::builder()
        .uri("/api/plans")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn development_mode_uses_wildcard_origin() {
    let mut config = GatewayConfig::default();
    config.mode = ExecutionMode::Development;
    let app = app(config);
    let request = Request::builder()
        .uri("/api/plans")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn referer_under_production_origin_without_origin_header() {
    let app = app(GatewayConfig::default());
    let request = Request::builder()
        .uri("/api/plans")
        .header(header::REFERER, "https://lucrazi.com.br/ebooks/42")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://lucrazi.com.br"
    );
}

#[tokio::test]
async fn disallowed_method_is_405() {
    let app = app(GatewayConfig::default());
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/checkout")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    // Rejected before the header step.
    assert!(!response.headers().contains_key(header::X_FRAME_OPTIONS));
    assert_eq!(json_body(response).await["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn text_plain_post_is_invalid_content_type() {
    let app = app(GatewayConfig::default());
    let mut request = post_json("/api/leads", r#"{"name":"Ana"}"#);
    request
        .headers_mut()
        .insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_security_headers(response.headers());
    assert_eq!(json_body(response).await["code"], "INVALID_CONTENT_TYPE");
}

#[tokio::test]
async fn body_at_ceiling_admitted_one_over_rejected() {
    let app = app(GatewayConfig::default());
    let overhead = r#"{"d":""}"#.len();

    let at_limit = format!(r#"{{"d":"{}"}}"#, "x".repeat(10_240 - overhead));
    assert_eq!(at_limit.len(), 10_240);
    let response = send(&app, post_json("/api/leads", &at_limit)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let over = format!(r#"{{"d":"{}"}}"#, "x".repeat(10_241 - overhead));
    let response = send(&app, post_json("/api/checkout", &over)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn whitespace_padding_does_not_count_against_ceiling() {
    let app = app(GatewayConfig::default());
    let padded = format!(r#"{{"a":1{}}}"#, " ".repeat(25_000));
    assert!(padded.len() > 10_240);

    let response = send(&app, post_json("/api/leads", &padded)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stream_past_raw_cap_is_payload_too_large() {
    let app = app(GatewayConfig::default());
    let huge = format!(r#"{{"d":"{}"}}"#, "x".repeat(2 * 1024 * 1024));

    let response = send(&app, post_json("/api/leads", &huge)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn raw_cap_is_configurable() {
    let mut config = GatewayConfig::default();
    config.admission.max_raw_body_bytes = 12_000;
    let app = app(config);

    let padded = format!(r#"{{"a":1{}}}"#, " ".repeat(25_000));
    let response = send(&app, post_json("/api/leads", &padded)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn non_json_put_body_is_admitted_when_method_allowed() {
    let mut config = GatewayConfig::default();
    config.admission.allowed_methods.push("PUT".into());
    let handler = Router::new().route("/api/files", put(|body: Bytes| async move { body }));
    let app = HttpServer::with_handler(config, handler).router();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/files")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from("name,price\nebook,10"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"name,price\nebook,10");
}

#[tokio::test]
async fn script_injection_is_suspicious() {
    let app = app(GatewayConfig::default());
    let body = json!({ "name": "Ana", "message": "<script>alert(1)</script>" }).to_string();

    let response = send(&app, post_json("/api/leads", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "SUSPICIOUS_PAYLOAD");
}

#[tokio::test]
async fn malformed_json_is_generic_internal_error() {
    let app = app(GatewayConfig::default());

    let response = send(&app, post_json("/api/leads", "{not json")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "error": "Internal server error", "code": "INTERNAL_ERROR" }));
}

#[tokio::test]
async fn healthz_bypasses_admission() {
    let mut config = GatewayConfig::default();
    config.admission.max_requests = 1;
    let app = app(config);

    for _ in 0..3 {
        let response = send(
            &app,
            Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn request_id_is_generated_and_echoed() {
    let app = app(GatewayConfig::default());

    let response = send(
        &app,
        Request::builder().uri("/api/plans").body(Body::empty()).unwrap(),
    )
    .await;
    let generated = response.headers()[X_REQUEST_ID].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let response = send(
        &app,
        Request::builder()
            .uri("/api/plans")
            .header(X_REQUEST_ID, "client-chosen-id")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.headers()[X_REQUEST_ID], "client-chosen-id");
}
