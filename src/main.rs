//! Portcullis: a session-to-upstream authorization gateway.
//!
//! Sits between a content frontend and an independently operated WordPress
//! backend. Verifies the visitor's signed session cookie, derives one
//! canonical role from the upstream role strings embedded in it, evaluates
//! a static access policy, and forwards permitted requests to the upstream
//! carrying the bearer token embedded in the session. Upstream failures of
//! every shape come back as one predictable JSON error contract.

use std::sync::Arc;

use axum::{Router, routing::get};
use clap::Parser;
use reqwest::Client;
use tower_cookies::CookieManagerLayer;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

mod auth;
mod authz;
mod config;
mod error;
mod middleware;
mod observability;
mod routes;
mod upstream;

#[cfg(test)]
mod tests;

use auth::{IdentityRefresher, SessionVerifier};
use authz::{AccessGuard, PolicyTable};
use config::GatewayConfig;
use upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppState {
    /// Shared outbound HTTP client. reqwest keeps per-host connection
    /// pools internally, so one client serves both the proxy and the
    /// identity refresher.
    pub http_client: Client,
    pub config: Arc<GatewayConfig>,
    pub guard: Arc<AccessGuard>,
    pub upstream: Arc<UpstreamClient>,
}

#[derive(Parser)]
#[command(name = "portcullis", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "portcullis.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match GatewayConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration from {}: {e}", args.config);
            std::process::exit(1);
        }
    };

    observability::init_tracing(&config.observability.logging);

    let state = match build_state(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error building gateway state: {e}");
            std::process::exit(1);
        }
    };

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Gateway listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

/// Build the shared application state from a validated config.
fn build_state(config: GatewayConfig) -> Result<AppState, config::ConfigError> {
    let http_client = Client::builder()
        .build()
        .map_err(|e| config::ConfigError::Validation(format!("HTTP client: {e}")))?;

    let policy = Arc::new(PolicyTable::from_config(&config.policy)?);
    let verifier = SessionVerifier::new(&config.auth);

    let refresher = if config.upstream.identity_refresh.enabled {
        Some(IdentityRefresher::new(&config.upstream, http_client.clone()))
    } else {
        None
    };

    let guard = Arc::new(AccessGuard::new(
        verifier,
        policy,
        refresher,
        config.auth.cookie_name.clone(),
    ));
    let upstream = Arc::new(UpstreamClient::new(&config.upstream, http_client.clone()));

    Ok(AppState {
        http_client,
        config: Arc::new(config),
        guard,
        upstream,
    })
}

/// Assemble the router with all middleware layers.
fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let cors = state.config.server.cors.layer();

    let mut app = Router::new()
        .route("/health", get(routes::health_check))
        .route("/health/live", get(routes::liveness))
        .merge(routes::api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit));

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app.with_state(state)
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
