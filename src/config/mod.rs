//! Configuration module for the authorization gateway.
//!
//! The gateway is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [auth]
//! secret = "${SESSION_JWT_SECRET}"
//!
//! [upstream]
//! base_url = "https://wp.example.com"
//! ```

mod auth;
mod observability;
mod policy;
mod server;
mod upstream;

use std::path::Path;

pub use auth::*;
pub use observability::*;
pub use policy::*;
use serde::{Deserialize, Serialize};
pub use server::*;
pub use upstream::*;

/// Root configuration for the gateway.
///
/// All sections except `upstream` are optional with sensible defaults,
/// allowing minimal configuration for simple deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session authentication configuration.
    pub auth: SessionAuthConfig,

    /// Upstream backend configuration.
    pub upstream: UpstreamConfig,

    /// Access policy table. If omitted, the built-in default table is used.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Observability configuration (logging).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let mut config: GatewayConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&mut self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.upstream.validate()?;
        self.policy.validate()?;

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR_NAME}` references from the environment.
///
/// Variables appearing after a `#` comment marker on a line are left alone.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let match_start = cap.get(0).unwrap().start();

            if let Some(pos) = comment_pos {
                if match_start >= pos {
                    continue;
                }
            }

            line_result.push_str(&line[last_end..match_start]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = cap.get(0).unwrap().end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [auth]
        secret = "0123456789abcdef0123456789abcdef"

        [upstream]
        base_url = "https://wp.example.com"
    "#;

    #[test]
    fn test_minimal_config() {
        let config = GatewayConfig::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.cookie_name, "session");
        assert_eq!(config.auth.leeway_secs, 30);
        assert_eq!(config.upstream.base_url.as_str(), "https://wp.example.com/");
        assert!(config.policy.rules.is_empty());
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: test-local variable name, no concurrent readers care
        unsafe { std::env::set_var("PORTCULLIS_TEST_SECRET", "s3cr3t-s3cr3t-s3cr3t-s3cr3t-s3cr3t") };
        let config = GatewayConfig::from_str(
            r#"
            [auth]
            secret = "${PORTCULLIS_TEST_SECRET}"

            [upstream]
            base_url = "https://wp.example.com"
        "#,
        )
        .unwrap();
        assert_eq!(config.auth.secret, "s3cr3t-s3cr3t-s3cr3t-s3cr3t-s3cr3t");
    }

    #[test]
    fn test_env_var_missing() {
        let err = GatewayConfig::from_str(
            r#"
            [auth]
            secret = "${PORTCULLIS_NO_SUCH_VAR}"

            [upstream]
            base_url = "https://wp.example.com"
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound(_)));
    }

    #[test]
    fn test_env_var_in_comment_not_expanded() {
        // ${NOT_SET} after the comment marker must not fail the load
        let config = GatewayConfig::from_str(
            r#"
            [auth]
            secret = "0123456789abcdef0123456789abcdef" # was ${NOT_SET}

            [upstream]
            base_url = "https://wp.example.com"
        "#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = GatewayConfig::from_str(
            r#"
            [auth]
            secret = "0123456789abcdef0123456789abcdef"
            shiny = true

            [upstream]
            base_url = "https://wp.example.com"
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_policy_rules_parse() {
        let config = GatewayConfig::from_str(
            r#"
            [auth]
            secret = "0123456789abcdef0123456789abcdef"

            [upstream]
            base_url = "https://wp.example.com"

            [[policy.rules]]
            path = "/api/wp/comments/{id}"
            method = "PATCH"
            action = "moderate"
            roles = ["editor"]
        "#,
        )
        .unwrap();
        assert_eq!(config.policy.rules.len(), 1);
        assert_eq!(config.policy.rules[0].method, "PATCH");
    }
}
