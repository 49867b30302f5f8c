//! Proxied API routes.
//!
//! Every guarded handler follows the same pipeline: access guard first,
//! proxy client second. Guard failures (401/403) are resolved here and
//! never reach the upstream; upstream failures come back already
//! normalized by the proxy client.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{MatchedPath, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use http::Method;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    AppState,
    authz::{Action, GuardError},
    upstream::{ProxyRequest, UpstreamError},
};

/// Cache window for anonymous read passthroughs. Post listings tolerate
/// five minutes of staleness; moderation state does not, which is why the
/// guarded routes stay on the no-store default.
const PUBLIC_CACHE_TTL: Duration = Duration::from_secs(300);

/// Profile fields a caller may update about themselves. Everything else in
/// the body is dropped before the request goes upstream (roles, capability
/// fields, passwords all travel through other flows).
const PROFILE_FIELDS: &[&str] = &["name", "nickname", "email", "url", "description", "locale"];

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(session_me))
        .route("/api/wp/posts", get(list_posts))
        .route("/api/wp/search", get(search))
        .route("/api/wp/users/me", get(profile).post(update_profile))
        .route(
            "/api/wp/comments/{id}",
            patch(moderate_comment).delete(delete_comment),
        )
}

/// One error type per handler return; both sides already render the wire
/// error contract.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Guard(e) => e.into_response(),
            ApiError::Upstream(e) => e.into_response(),
        }
    }
}

// ============================================================================
// Session introspection
// ============================================================================

#[derive(Debug, Serialize)]
struct SessionInfo {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// The canonical role the gateway authorizes with.
    role: String,
    /// Raw upstream role strings, for display only.
    roles: Vec<String>,
}

/// Who the caller is, as the gateway sees them. No upstream call.
async fn session_me(
    State(state): State<AppState>,
    matched: MatchedPath,
    cookies: Cookies,
) -> Result<Json<SessionInfo>, ApiError> {
    let grant = state
        .guard
        .require_access(&cookies, matched.as_str(), &Method::GET, Action::Read)
        .await?;

    Ok(Json(SessionInfo {
        id: grant.claims.sub.clone(),
        username: grant.claims.username.clone(),
        email: grant.claims.email.clone(),
        role: grant.role.to_string(),
        roles: grant.claims.roles,
    }))
}

// ============================================================================
// Public read passthroughs
// ============================================================================

#[derive(Debug, Deserialize)]
struct PostsQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    #[serde(default)]
    search: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

/// Published posts, with embedded media and terms. Anonymous on the
/// upstream too, so no credential is attached.
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Response, ApiError> {
    let path = {
        let mut params = url::form_urlencoded::Serializer::new(String::new());
        params.append_pair("_embed", "1");
        params.append_pair("page", &query.page.to_string());
        params.append_pair("per_page", &query.per_page.min(100).to_string());
        if let Some(search) = &query.search {
            params.append_pair("search", search);
        }
        format!("/wp-json/wp/v2/posts?{}", params.finish())
    };

    let outcome = state
        .upstream
        .fetch_public(&path, Some(PUBLIC_CACHE_TTL))
        .await?;

    Ok(outcome.into_response())
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let path = {
        let mut params = url::form_urlencoded::Serializer::new(String::new());
        params.append_pair("search", &query.q);
        params.append_pair("per_page", &query.per_page.min(100).to_string());
        format!("/wp-json/wp/v2/search?{}", params.finish())
    };

    let outcome = state
        .upstream
        .fetch_public(&path, Some(PUBLIC_CACHE_TTL))
        .await?;

    Ok(outcome.into_response())
}

// ============================================================================
// Guarded profile routes
// ============================================================================

/// The caller's upstream profile, in the upstream's `edit` context.
async fn profile(
    State(state): State<AppState>,
    matched: MatchedPath,
    cookies: Cookies,
) -> Result<Response, ApiError> {
    let grant = state
        .guard
        .require_access(&cookies, matched.as_str(), &Method::GET, Action::Read)
        .await?;

    let outcome = state
        .upstream
        .proxy(
            &grant.claims,
            "/wp-json/wp/v2/users/me?context=edit&_fields=id,slug,name,email,roles,avatar_urls,description,url,locale,nickname",
            ProxyRequest::get(),
        )
        .await?;

    Ok(outcome.into_response())
}

/// Update the caller's own profile, restricted to the safe field subset.
async fn update_profile(
    State(state): State<AppState>,
    matched: MatchedPath,
    cookies: Cookies,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let grant = state
        .guard
        .require_access(&cookies, matched.as_str(), &Method::POST, Action::Write)
        .await?;

    let mut patch = serde_json::Map::new();
    if let Some(object) = body.as_object() {
        for field in PROFILE_FIELDS {
            if let Some(value) = object.get(*field) {
                patch.insert(field.to_string(), value.clone());
            }
        }
    }

    let outcome = state
        .upstream
        .proxy(
            &grant.claims,
            "/wp-json/wp/v2/users/me",
            ProxyRequest::new(Method::POST).json(&serde_json::Value::Object(patch)),
        )
        .await?;

    Ok(outcome.into_response())
}

// ============================================================================
// Comment moderation
// ============================================================================

/// Moderation verbs accepted from the frontend. Serde rejects anything
/// else before the handler runs.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ModerationAction {
    Approve,
    Unapprove,
    Spam,
    Unspam,
    Trash,
    Restore,
}

impl ModerationAction {
    /// The upstream comment status each verb maps to.
    fn upstream_status(self) -> &'static str {
        match self {
            ModerationAction::Approve | ModerationAction::Unspam | ModerationAction::Restore => {
                "approved"
            }
            ModerationAction::Unapprove => "hold",
            ModerationAction::Spam => "spam",
            ModerationAction::Trash => "trash",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModerateRequest {
    action: ModerationAction,
}

async fn moderate_comment(
    State(state): State<AppState>,
    matched: MatchedPath,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(body): Json<ModerateRequest>,
) -> Result<Response, ApiError> {
    let grant = state
        .guard
        .require_access(&cookies, matched.as_str(), &Method::PATCH, Action::Moderate)
        .await?;

    let outcome = state
        .upstream
        .proxy(
            &grant.claims,
            &format!("/wp-json/wp/v2/comments/{id}"),
            ProxyRequest::new(Method::POST)
                .json(&serde_json::json!({ "status": body.action.upstream_status() })),
        )
        .await?;

    Ok(outcome.into_response())
}

async fn delete_comment(
    State(state): State<AppState>,
    matched: MatchedPath,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let grant = state
        .guard
        .require_access(&cookies, matched.as_str(), &Method::DELETE, Action::Delete)
        .await?;

    let outcome = state
        .upstream
        .proxy(
            &grant.claims,
            &format!("/wp-json/wp/v2/comments/{id}"),
            ProxyRequest::new(Method::DELETE),
        )
        .await?;

    Ok(outcome.into_response())
}
