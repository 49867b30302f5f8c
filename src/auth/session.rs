//! Session token verification.
//!
//! The frontend mints HS256 JWTs at login and stores them in a cookie; this
//! module verifies them and produces a strictly typed [`SessionClaims`].
//! Anything that does not conform is rejected at this boundary rather than
//! propagated as loosely typed claim data.

use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation, decode};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::SessionAuthConfig;

/// Claims extracted from a verified session token.
///
/// Only ever constructed by [`SessionVerifier::verify`]; handlers never
/// build one from request data. Dropped at the end of the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the upstream user id, as an opaque string.
    pub sub: String,

    /// Display username.
    #[serde(default)]
    pub username: Option<String>,

    /// Account email.
    #[serde(default)]
    pub email: Option<String>,

    /// Raw upstream role strings, exactly as the upstream spelled them at
    /// login time. Normalization happens later, per request.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Bearer token for the upstream backend. Absent for sessions that
    /// authenticated locally without linking an upstream account.
    #[serde(rename = "wpToken", default)]
    pub wp_token: Option<String>,

    /// Expiration time (Unix timestamp). Required: tokens without an
    /// expiry never verify.
    pub exp: u64,

    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: u64,
}

/// Verifies session tokens against the configured secret.
pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(config: &SessionAuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        // exp is in required_spec_claims by default; keep it that way so a
        // token with no expiry is rejected rather than treated as eternal
        validation.leeway = config.leeway_secs;

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Verify a session token and return its claims.
    ///
    /// Every verification failure maps to [`AuthError::InvalidSession`].
    /// Business-level problems (unknown role spellings, missing upstream
    /// token) are not errors here; those belong to the role normalizer and
    /// the proxy client respectively.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let token_data: TokenData<SessionClaims> =
            decode(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(error = %e, "session verification failed");
                AuthError::InvalidSession
            })?;

        Ok(token_data.claims)
    }
}
