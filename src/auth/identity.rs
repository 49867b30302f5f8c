//! Role freshness lookup against the upstream identity endpoint.
//!
//! Roles baked into a session at login can go stale: an account demoted
//! upstream keeps its old roles until the session expires. When enabled,
//! the access guard asks the upstream for the caller's current roles once
//! per request, using the upstream token embedded in the session.
//!
//! This lookup is best-effort. A failure here must never fail the request;
//! the guard falls back to the embedded roles.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::UpstreamConfig;

const IDENTITY_PATH: &str = "/wp-json/wp/v2/users/me";

/// Subset of the upstream identity response this gateway cares about.
#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(default)]
    roles: Vec<String>,
}

/// Fetches current roles for an upstream credential.
pub struct IdentityRefresher {
    http_client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl IdentityRefresher {
    pub fn new(config: &UpstreamConfig, http_client: reqwest::Client) -> Self {
        let mut endpoint = config.base_url.clone();
        endpoint.set_path(IDENTITY_PATH);
        endpoint.set_query(Some("_fields=id,roles"));

        Self {
            http_client,
            endpoint,
            timeout: config.identity_refresh.timeout(),
        }
    }

    /// Fetch the roles currently attached to `upstream_token`.
    ///
    /// Any failure (transport, non-2xx, unparseable body) is returned as an
    /// error for the caller to log and fall back from; this function never
    /// distinguishes failure modes further because none of them change what
    /// the guard does next.
    pub async fn fetch_roles(&self, upstream_token: &str) -> Result<Vec<String>, RefreshError> {
        let response = self
            .http_client
            .get(self.endpoint.clone())
            .bearer_auth(upstream_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(RefreshError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Status(status.as_u16()));
        }

        let identity: IdentityResponse =
            response.json().await.map_err(RefreshError::Transport)?;

        Ok(identity.roles)
    }
}

/// Why a freshness lookup failed. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("identity request failed: {0}")]
    Transport(reqwest::Error),

    #[error("identity endpoint returned status {0}")]
    Status(u16),
}
