//! The access guard: one linear check from cookie to policy decision.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http::Method;
use thiserror::Error;
use tower_cookies::Cookies;

use super::{Action, CanonicalRole, PolicyTable};
use crate::{
    auth::{AuthError, IdentityRefresher, SessionClaims, SessionVerifier},
    error::ErrorBody,
};

/// A granted request: the verified claims plus the canonical role the
/// policy decision was made with.
#[derive(Debug)]
pub struct AccessGrant {
    pub claims: SessionClaims,
    pub role: CanonicalRole,
}

/// Why the guard refused a request.
#[derive(Debug, Error)]
pub enum GuardError {
    /// No session, an invalid session, or a session without the upstream
    /// credential a route needs. Maps to 401.
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// The policy table denied the (route, method, action) triple. Maps to
    /// 403. Carries no detail: callers are not told which rule failed.
    #[error("Access denied")]
    Forbidden,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::Unauthorized(e) => e.into_response(),
            GuardError::Forbidden => {
                (StatusCode::FORBIDDEN, Json(ErrorBody::forbidden())).into_response()
            }
        }
    }
}

/// Orchestrates session verification, role normalization and policy
/// evaluation for guarded routes.
///
/// There is no state machine here: one linear pass with two failure exits
/// (401 before a session exists, 403 after) and one optional network hop
/// (the role freshness check).
pub struct AccessGuard {
    verifier: SessionVerifier,
    policy: Arc<PolicyTable>,
    /// Present only when the freshness check is enabled in config.
    refresher: Option<IdentityRefresher>,
    cookie_name: String,
}

impl AccessGuard {
    pub fn new(
        verifier: SessionVerifier,
        policy: Arc<PolicyTable>,
        refresher: Option<IdentityRefresher>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            policy,
            refresher,
            cookie_name: cookie_name.into(),
        }
    }

    /// Require that the caller may perform `action` on `path` via `method`.
    ///
    /// Reads the session cookie, verifies it, optionally refreshes the
    /// caller's roles from the upstream, normalizes them to one canonical
    /// role and evaluates the policy table. Fails with 401 when no valid
    /// session exists, 403 when policy denies.
    pub async fn require_access(
        &self,
        cookies: &Cookies,
        path: &str,
        method: &Method,
        action: Action,
    ) -> Result<AccessGrant, GuardError> {
        let token = cookies
            .get(&self.cookie_name)
            .map(|c| c.value().to_string())
            .ok_or(AuthError::MissingSession)?;

        let claims = self.verifier.verify(&token)?;

        let roles = self.fresh_roles(&claims).await;
        let role = CanonicalRole::normalize(&roles);

        if !self.policy.check(role, path, method, action) {
            tracing::info!(
                subject = %claims.sub,
                role = %role,
                %method,
                path,
                action = %action,
                "access denied"
            );
            return Err(GuardError::Forbidden);
        }

        Ok(AccessGrant { claims, role })
    }

    /// Roles to authorize with: freshly fetched from the upstream when the
    /// freshness check is enabled and succeeds, otherwise the roles
    /// embedded in the session.
    ///
    /// Falling back on refresh failure trades strictness for availability;
    /// an upstream identity blip must not turn into a sitewide 403. The
    /// fallback is logged so operators can see how often stale roles are
    /// actually used.
    async fn fresh_roles(&self, claims: &SessionClaims) -> Vec<String> {
        let (Some(refresher), Some(token)) = (&self.refresher, claims.wp_token.as_deref()) else {
            return claims.roles.clone();
        };

        match refresher.fetch_roles(token).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(
                    subject = %claims.sub,
                    error = %e,
                    "role freshness check failed; falling back to session roles"
                );
                claims.roles.clone()
            }
        }
    }
}
