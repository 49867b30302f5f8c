//! Wire error contract.
//!
//! Every failure this gateway produces, whether its own or a normalized
//! upstream failure, is expressed as this one JSON shape so callers can
//! branch on `error` without sniffing bodies.

use serde::{Deserialize, Serialize};

/// JSON error body: `{"error": "...", "message": "...", "originalStatus": 502}`.
///
/// `error` is one of `unauthorized`, `forbidden`, `wp_html_response`,
/// `proxy_error`, `server_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The status the upstream originally returned, when the gateway
    /// substituted its own (e.g. 502 for an HTML error page on a 200).
    #[serde(rename = "originalStatus", skip_serializing_if = "Option::is_none")]
    pub original_status: Option<u16>,
}

impl ErrorBody {
    pub fn new(error: &'static str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
            original_status: None,
        }
    }

    pub fn with_message(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.into()),
            original_status: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_message("unauthorized", message)
    }

    pub fn forbidden() -> Self {
        // Never names the rule that denied
        Self::with_message("forbidden", "Forbidden")
    }

    pub fn html_response(message: impl Into<String>, original_status: u16) -> Self {
        let mut body = Self::with_message("wp_html_response", message);
        body.original_status = Some(original_status);
        body
    }

    pub fn proxy_error(message: impl Into<String>) -> Self {
        Self::with_message("proxy_error", message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::with_message("server_error", message)
    }
}
