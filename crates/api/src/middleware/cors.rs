use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer. The admin UI and the public site may be served
/// from other origins; credentials travel in the `Authorization` header,
/// never cookies.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CACHE_CONTROL, HeaderName::from_static("x-robots-tag")])
}
