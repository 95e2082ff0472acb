//! Forwarding of admitted requests to the upstream application.

use std::str::FromStr;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Json,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::admission::ErrorBody;
use crate::http::request::X_REQUEST_ID;

/// The external handler: an HTTP application behind the gateway.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    authority: Option<Authority>,
}

impl Upstream {
    /// `address` is `host:port`. An unparsable or absent address leaves the
    /// upstream unconfigured and every admitted request gets 503.
    pub fn new(address: Option<&str>) -> Self {
        let authority = address.and_then(|addr| match Authority::from_str(addr) {
            Ok(authority) => Some(authority),
            Err(e) => {
                tracing::error!(address = %addr, error = %e, "Invalid upstream address");
                None
            }
        });

        Self {
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            authority,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.authority.is_some()
    }

    fn target_uri(&self, authority: &Authority, original: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = original
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

/// Fallback handler forwarding every admitted request upstream.
pub async fn forward_handler(State(upstream): State<Upstream>, request: Request) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let Some(authority) = upstream.authority.as_ref() else {
        tracing::warn!(request_id = %request_id, "No upstream configured");
        return error(StatusCode::SERVICE_UNAVAILABLE, "No upstream configured");
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = match upstream.target_uri(authority, &parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return error(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        uri = %parts.uri,
        "Forwarding request"
    );

    match upstream.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            error(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
            code: None,
        }),
    )
        .into_response()
}
