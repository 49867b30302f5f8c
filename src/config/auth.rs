//! Session authentication configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration for verifying the signed session cookie.
///
/// Sessions are HS256 JWTs minted by the login flow of the frontend; this
/// gateway only verifies them. The signing secret must therefore match the
/// one the frontend signs with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionAuthConfig {
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// HMAC-SHA256 signing secret. Use `${VAR}` interpolation rather than
    /// committing the literal value.
    pub secret: String,

    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Expected `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Clock-skew tolerance applied to `exp`/`nbf` validation, in seconds.
    ///
    /// 30 seconds absorbs ordinary NTP drift between the frontend and this
    /// gateway without meaningfully extending a token's life.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl SessionAuthConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Validation(
                "auth.secret must not be empty".into(),
            ));
        }
        if self.secret.len() < 32 {
            return Err(ConfigError::Validation(
                "auth.secret must be at least 32 bytes; shorter HMAC keys are brute-forceable"
                    .into(),
            ));
        }
        Ok(())
    }
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_issuer() -> String {
    "techoblivion-fe".to_string()
}

fn default_audience() -> String {
    "techoblivion-user".to_string()
}

fn default_leeway() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret(secret: &str) -> SessionAuthConfig {
        SessionAuthConfig {
            cookie_name: default_cookie_name(),
            secret: secret.to_string(),
            issuer: default_issuer(),
            audience: default_audience(),
            leeway_secs: default_leeway(),
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(config_with_secret("short").validate().is_err());
        assert!(config_with_secret("").validate().is_err());
    }

    #[test]
    fn test_long_secret_accepted() {
        assert!(
            config_with_secret("0123456789abcdef0123456789abcdef")
                .validate()
                .is_ok()
        );
    }
}
