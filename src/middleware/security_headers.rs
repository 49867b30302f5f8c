//! Security headers middleware.
//!
//! Adds standard security headers to all responses to protect against
//! clickjacking and MIME-sniffing.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Middleware that adds security headers to all responses.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config.server.security_headers;

    if !config.enabled {
        return next.run(request).await;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    if let Ok(value) = HeaderValue::from_str(&config.frame_options) {
        headers.insert("x-frame-options", value);
    }

    if let Ok(value) = HeaderValue::from_str(&config.referrer_policy) {
        headers.insert("referrer-policy", value);
    }

    response
}
