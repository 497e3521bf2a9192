//! # Interceptor HTTP Service
//!
//! HTTP layer for the GitHub hook interceptor. A trigger pipeline posts each
//! hook delivery here together with its matching rules as headers; the
//! response status tells the pipeline whether to continue:
//!
//! - `200 OK`: continue, using the response body as the new payload
//! - `412 Precondition Failed`: the delivery did not match, stop
//! - `500 Internal Server Error`: the delivery could not be processed
//!
//! The matching itself lives in `interceptor-core`.

pub mod config;
pub mod errors;

pub use config::{
    load_config, ConfigError, InterceptionConfig, LoggingConfig, ServerConfig, ServiceConfig,
};
pub use errors::{InterceptionHandlerError, ServiceError};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use interceptor_core::{EventRouter, InterceptionHeaders, InterceptionOutcome};
use serde::{Deserialize, Serialize};
use std::{future::IntoFuture, time::Duration};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Event-kind dispatch table, built once at startup
    pub router: EventRouter,
}

impl AppState {
    pub fn new(config: ServiceConfig, router: EventRouter) -> Self {
        Self { config, router }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let interception_routes = Router::new().route(
        &state.config.interception.endpoint_path,
        post(handle_interception),
    );

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(interception_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests are then given
/// `server.shutdown_timeout_seconds` to finish before the server stops.
pub async fn start_server(config: ServiceConfig, router: EventRouter) -> Result<(), ServiceError> {
    config.validate()?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(
        address = %address,
        endpoint = %config.interception.endpoint_path,
        "Starting HTTP server"
    );

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let app = create_router(AppState::new(config, router));

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let drain_deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(shutdown_timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out, dropping in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

// ============================================================================
// Interception Handler
// ============================================================================

/// Handle a hook delivery
///
/// The body is routed by its `X-Github-Event` header. A matched or
/// passed-through delivery is answered with its (possibly enriched) body and
/// the request's `Content-Type`.
#[instrument(skip(state, headers, body), fields(event_type))]
pub async fn handle_interception(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, InterceptionHandlerError> {
    let content_type = headers.get(CONTENT_TYPE).cloned();
    let headers = interception_headers(&headers);
    let event_type = headers.event_type();
    tracing::Span::current().record("event_type", event_type);

    let outcome = state.router.route(event_type, &headers, body)?;
    let body = match outcome {
        InterceptionOutcome::Intercepted { body } => {
            info!("Delivery matched, returning enriched payload");
            body
        }
        InterceptionOutcome::PassedThrough { body } => {
            debug!("Event kind not intercepted, passing payload through");
            body
        }
        InterceptionOutcome::Rejected => return Err(InterceptionHandlerError::NotMatched),
    };

    let mut response = body.into_response();
    match content_type {
        Some(value) => {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        None => {
            response.headers_mut().remove(CONTENT_TYPE);
        }
    }
    Ok(response)
}

/// Build the case-insensitive header view the interceptors read.
///
/// Values that are not valid UTF-8 read as empty.
pub fn interception_headers(headers: &HeaderMap) -> InterceptionHeaders {
    InterceptionHeaders::from_pairs(
        headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or(""))),
    )
}

// ============================================================================
// Health Check Handler
// ============================================================================

/// Basic health check endpoint
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
