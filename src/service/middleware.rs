//! Service middleware: access log and request metrics.
//!
//! ## Access Log
//!
//! Every request runs in a `request` span carrying its correlation id,
//! taken from `x-request-id` when the caller sends one. The id is echoed
//! on the response and logged under `channel_ranking::access`.
//!
//! ## Metrics Exposed
//!
//! - `request_metric` - one event per request by normalized path, method, status
//! - `tick_metric` - emitted by the conversion scheduler
//!
//! Both go to the `channel_ranking::metrics` tracing target.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Access log middleware with correlation ids.
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!("request", request_id = %request_id, method = %method, path = %path);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        target: "channel_ranking::access",
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

fn request_id(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "channel_ranking::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Channel ids in `/channel/<id>` are replaced with a placeholder.
fn normalize_path(path: &str) -> String {
    static CHANNEL_PATH: OnceLock<Regex> = OnceLock::new();
    let channel_regex = CHANNEL_PATH
        .get_or_init(|| Regex::new(r"^/channel/[^/]+").expect("channel path pattern is valid"));

    channel_regex.replace(path, "/channel/:user_id").to_string()
}
