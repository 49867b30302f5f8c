//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::ErrorBody;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No session cookie was presented.
    #[error("No session")]
    MissingSession,

    /// A session cookie was presented but failed verification: bad
    /// signature, expired, malformed, or missing required claims. The
    /// variant does not say which check failed.
    #[error("Invalid session")]
    InvalidSession,

    /// The session is locally valid but carries no upstream bearer token,
    /// so no upstream call can be made on the caller's behalf. Logged
    /// distinctly from `InvalidSession` because it points at the login
    /// flow, not at the caller.
    #[error("Session has no upstream credential")]
    MissingUpstreamCredential,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingSession => "Authentication required",
            AuthError::InvalidSession => "Invalid or expired session",
            AuthError::MissingUpstreamCredential => "Session has no upstream credential",
        };

        if matches!(self, AuthError::MissingUpstreamCredential) {
            tracing::warn!("session valid but missing upstream credential");
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::unauthorized(message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_variants_are_401() {
        for error in [
            AuthError::MissingSession,
            AuthError::InvalidSession,
            AuthError::MissingUpstreamCredential,
        ] {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
