pub mod cors;
pub mod request_tracing;

use tower_http::limit::RequestBodyLimitLayer;

/// Reject request bodies larger than `bytes` with 413.
pub fn body_limit_layer(bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(bytes)
}
