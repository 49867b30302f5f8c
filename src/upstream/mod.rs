//! Authenticated proxy client for the upstream backend.
//!
//! The upstream is an independently operated WordPress installation. It can
//! return maintenance pages instead of JSON, HTML error pages with a 200,
//! truncated bodies, and auth rejections in several shapes. Everything that
//! comes back through this module is normalized into a predictable form
//! before a caller sees it.

mod client;
mod response;

use axum::{
    Json,
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
pub use client::{ProxyRequest, UpstreamClient};
pub use response::normalize;
use thiserror::Error;

use crate::error::ErrorBody;

/// Errors raised before or while talking to the upstream.
///
/// Normalization of upstream *responses* (auth rejections, HTML bodies)
/// does not produce errors; those become a [`ProxyOutcome`] with an
/// [`errorKind`](ProxyOutcome::error_kind) set.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The session carries no upstream bearer token. Checked before any
    /// network I/O: a locally valid session does not imply an upstream
    /// credential exists.
    #[error("Session has no upstream credential")]
    MissingCredential,

    /// The requested path did not resolve against the upstream base URL.
    #[error("Invalid upstream path: {0}")]
    InvalidPath(#[from] url::ParseError),

    /// Transport failure: connect error, timeout, TLS. Not retried here;
    /// upstream actions are not guaranteed idempotent, so retrying is the
    /// caller's decision.
    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        match self {
            UpstreamError::MissingCredential => {
                tracing::warn!("proxy refused: session has no upstream credential");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorBody::unauthorized("Session has no upstream credential")),
                )
                    .into_response()
            }
            UpstreamError::InvalidPath(e) => {
                tracing::error!(error = %e, "upstream path did not resolve");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::server_error("Invalid upstream path")),
                )
                    .into_response()
            }
            UpstreamError::Transport(e) => {
                tracing::error!(error = %e, "upstream call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorBody::proxy_error("Upstream request failed")),
                )
                    .into_response()
            }
        }
    }
}

/// Why a [`ProxyOutcome`] body was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyErrorKind {
    /// Upstream answered 401 or 403 to the forwarded credential.
    AuthRejected,
    /// Upstream answered with an HTML document where JSON was expected.
    HtmlResponse,
}

/// Normalized result of one upstream call.
#[derive(Debug)]
pub struct ProxyOutcome {
    pub status: StatusCode,
    /// Final content type, after any correction.
    pub content_type: String,
    pub body: Bytes,
    /// Set when the body was rewritten during normalization; `None` for a
    /// passthrough.
    pub error_kind: Option<ProxyErrorKind>,
}

impl IntoResponse for ProxyOutcome {
    fn into_response(self) -> Response {
        Response::builder()
            .status(self.status)
            .header(http::header::CONTENT_TYPE, self.content_type)
            .body(Body::from(self.body))
            // Infallible in practice: status and content type are already
            // validated values
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}
