//! Request logging, HTTP metrics and response hardening.
//!
//! Handlers and the session guard report context for the request log by
//! attaching [`RequestUser`] or [`RedemptionContext`] to their response;
//! the logging middleware reads them back once the response is built.

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, Span, field, info, info_span, warn};
use uuid::Uuid;

use super::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Admin that made an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUser(pub String);

/// What a redemption attempt did. `code` is `None` when the input was not a
/// well-formed code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionContext {
    pub code: Option<String>,
    pub outcome: &'static str,
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

fn record_context(span: &Span, response: &Response) {
    if let Some(RequestUser(username)) = response.extensions().get::<RequestUser>() {
        span.record("user_id", username.as_str());
    }

    if let Some(redemption) = response.extensions().get::<RedemptionContext>() {
        span.record("redemption", redemption.outcome);
        if let Some(code) = &redemption.code {
            span.record("promo_code", code.as_str());
        }
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        %request_id,
        %method,
        path = %req.uri().path(),
        route = route.as_deref(),
        user_id = field::Empty,
        promo_code = field::Empty,
        redemption = field::Empty,
    );

    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status();
    let elapsed = start.elapsed();

    // Console assets and stray paths share one label.
    let labels = [
        ("method", method.to_string()),
        ("path", route.unwrap_or_else(|| "unmatched".to_string())),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    record_context(&span, &response);

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        if status.is_server_error() {
            warn!(status = status.as_u16(), duration_ms, "Request finished");
        } else {
            info!(status = status.as_u16(), duration_ms, "Request finished");
        }
    });

    response
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(
            "default-src 'self'; img-src 'self' data:; script-src 'self'; style-src 'self'; frame-ancestors 'none'",
        ),
    );

    response
}
