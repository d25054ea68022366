//! Middleware helpers applied to the router.

use std::time::Duration;

use axum::extract::Request;
use tracing::Span;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the request span, tagged with the request ID set by the outer layer.
///
/// Only the method and path are recorded; bodies carry passwords and keys.
pub fn make_span(req: &Request) -> Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id,
    )
}
