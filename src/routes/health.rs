//! Health check endpoints for probes and monitoring.

use std::time::Duration;

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// How long the upstream reachability probe may take. Health checks run
/// often; they must stay cheap.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Detailed health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Service version
    pub version: String,
    /// Upstream reachability
    pub upstream: ComponentStatus,
}

/// Status of a single component.
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Full health check including an upstream reachability probe.
///
/// Any HTTP answer from the upstream counts as reachable; its status code
/// is irrelevant here (the root of a WordPress site is an HTML page).
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = std::time::Instant::now();
    let probe = state
        .http_client
        .head(state.config.upstream.base_url.clone())
        .timeout(PROBE_TIMEOUT)
        .send()
        .await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let upstream = match probe {
        Ok(_) => ComponentStatus {
            healthy: true,
            message: None,
            latency_ms: Some(latency_ms),
        },
        Err(e) => ComponentStatus {
            healthy: false,
            message: Some(e.to_string()),
            latency_ms: None,
        },
    };

    let healthy = upstream.healthy;
    let body = HealthStatus {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}

/// Liveness probe: answers as long as the process is serving requests.
/// Touches nothing external.
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
