//! HTTP request/response tracing middleware.

use axum::body::Body;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span, info_span};

type MakeSpanFn = fn(&Request<Body>) -> Span;

/// Opens one `request` span per HTTP request.
///
/// The first path segment after `/api` is recorded as `resource` so logs can
/// be filtered per content type.
fn make_span(req: &Request<Body>) -> Span {
    let path = req.uri().path();
    let resource = path
        .strip_prefix("/api/")
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        resource,
    )
}

/// Creates a tracing middleware for HTTP requests.
///
/// # Logging Behavior
///
/// **On Request:** opens a span with method, URI and resource.
///
/// **On Response:** logs at `INFO` level with status code and latency in
/// milliseconds. Server errors are additionally logged as failures.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=POST uri=/api/news resource=news}: started processing request
/// INFO request{method=POST uri=/api/news resource=news}: finished processing request latency=12 ms status=201
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpanFn> {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeSpanFn)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
