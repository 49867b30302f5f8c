//! Normalization of upstream responses.
//!
//! Order matters and follows the trust we place in each signal:
//! 1. A 401/403 status is authoritative: the body is discarded and
//!    replaced with the structured auth-rejection shape, upstream status
//!    preserved.
//! 2. A body that opens an HTML document is a web-server error page, not
//!    an API response, whatever the status said. It becomes
//!    `wp_html_response`, with 502 substituted when the original status
//!    claimed success.
//! 3. Everything else passes through, with the declared content type
//!    corrected to `application/json` when the body is JSON-shaped but
//!    mislabeled.

use axum::http::StatusCode;
use bytes::Bytes;

use super::{ProxyErrorKind, ProxyOutcome};
use crate::error::ErrorBody;

const JSON_CONTENT_TYPE: &str = "application/json";

/// How much of a malformed upstream body is logged for diagnosis. The body
/// itself is never forwarded to the caller.
const LOG_BODY_PREFIX: usize = 256;

/// Normalize one upstream response into a [`ProxyOutcome`].
pub fn normalize(status: StatusCode, declared_content_type: Option<&str>, body: Bytes) -> ProxyOutcome {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return auth_rejected(status, &body);
    }

    if starts_with_html_marker(&body) {
        return html_response(status, &body);
    }

    passthrough(status, declared_content_type, body)
}

/// Upstream rejected the forwarded credential. The raw body is dropped; a
/// best-effort `message` is lifted out of it first so callers get the
/// upstream's reason without its formatting.
fn auth_rejected(status: StatusCode, body: &Bytes) -> ProxyOutcome {
    let message = extract_message(body)
        .unwrap_or_else(|| "Upstream rejected the forwarded credential".to_string());

    tracing::info!(
        status = status.as_u16(),
        body_prefix = %body_prefix(body),
        "upstream rejected credential"
    );

    ProxyOutcome {
        status,
        content_type: JSON_CONTENT_TYPE.to_string(),
        body: to_body(&ErrorBody::unauthorized(message)),
        error_kind: Some(ProxyErrorKind::AuthRejected),
    }
}

/// Upstream returned an HTML document (maintenance page, WAF block page,
/// fatal-error page) where JSON was expected.
fn html_response(original_status: StatusCode, body: &Bytes) -> ProxyOutcome {
    tracing::warn!(
        original_status = original_status.as_u16(),
        body_prefix = %body_prefix(body),
        "upstream returned HTML where JSON was expected"
    );

    // A success status on an HTML error page is a lie; 502 tells the caller
    // the upstream misbehaved. A genuine error status is kept as-is.
    let status = if original_status.is_success() {
        StatusCode::BAD_GATEWAY
    } else {
        original_status
    };

    ProxyOutcome {
        status,
        content_type: JSON_CONTENT_TYPE.to_string(),
        body: to_body(&ErrorBody::html_response(
            "Upstream returned an HTML document where JSON was expected",
            original_status.as_u16(),
        )),
        error_kind: Some(ProxyErrorKind::HtmlResponse),
    }
}

fn passthrough(status: StatusCode, declared_content_type: Option<&str>, body: Bytes) -> ProxyOutcome {
    let declared_is_json = declared_content_type
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with(JSON_CONTENT_TYPE))
        .unwrap_or(false);

    let content_type = if declared_is_json {
        declared_content_type.unwrap().to_string()
    } else if looks_like_json(&body) {
        // Mislabeled JSON (text/html or text/plain declared): correct it
        JSON_CONTENT_TYPE.to_string()
    } else {
        declared_content_type
            .unwrap_or("application/octet-stream")
            .to_string()
    };

    ProxyOutcome {
        status,
        content_type,
        body,
        error_kind: None,
    }
}

/// Best-effort extraction of a human-readable message from an upstream
/// error body. WordPress errors look like `{"code": "...", "message":
/// "...", "data": {...}}`; anything else yields `None`.
fn extract_message(body: &Bytes) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

/// Whether the body opens an HTML document: `<!DOCTYPE` or `<html`,
/// ignoring leading whitespace and case.
fn starts_with_html_marker(body: &Bytes) -> bool {
    let head = String::from_utf8_lossy(&body[..body.len().min(64)]);
    let prefix: String = head.trim_start().chars().take(9).collect();
    let prefix = prefix.to_ascii_lowercase();

    prefix.starts_with("<!doctype") || prefix.starts_with("<html")
}

/// Whether the body is textually JSON: first significant byte opens an
/// object or array, and the whole body parses.
fn looks_like_json(body: &Bytes) -> bool {
    let first = body.iter().copied().find(|b| !b.is_ascii_whitespace());
    if !matches!(first, Some(b'{') | Some(b'[')) {
        return false;
    }
    serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
}

fn body_prefix(body: &Bytes) -> String {
    String::from_utf8_lossy(&body[..body.len().min(LOG_BODY_PREFIX)]).into_owned()
}

fn to_body(error: &ErrorBody) -> Bytes {
    Bytes::from(serde_json::to_vec(error).unwrap_or_default())
}
