//! Upstream backend configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Configuration for the upstream WordPress backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the upstream, e.g. `https://wp.example.com`.
    /// REST paths are resolved against this (`/wp-json/wp/v2/...`).
    pub base_url: Url,

    /// Timeout for a single proxied call, in seconds.
    ///
    /// The upstream is independently operated; a hung call must not pin a
    /// connection longer than this.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent sent on outbound calls. Some upstream WAF layers reject
    /// requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Role freshness check against the upstream identity endpoint.
    #[serde(default)]
    pub identity_refresh: IdentityRefreshConfig,
}

impl UpstreamConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "upstream.base_url must be http or https, got '{other}'"
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "upstream.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the once-per-request role freshness check.
///
/// When enabled, the access guard re-fetches the caller's roles from the
/// upstream identity endpoint instead of trusting the roles baked into the
/// session at login time. Failures fall back to the embedded roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityRefreshConfig {
    /// Whether to refresh roles from the upstream on each guarded request.
    #[serde(default)]
    pub enabled: bool,

    /// Timeout for the refresh call, in seconds. Kept short so one slow
    /// upstream never stalls the request path.
    #[serde(default = "default_refresh_timeout")]
    pub timeout_secs: u64,
}

impl IdentityRefreshConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IdentityRefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_refresh_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_refresh_timeout() -> u64 {
    3
}

fn default_user_agent() -> String {
    format!("portcullis/{}", env!("CARGO_PKG_VERSION"))
}
