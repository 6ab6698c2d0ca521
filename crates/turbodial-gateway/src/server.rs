// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Three route groups: an unauthenticated health probe, the bearer-guarded
//! CRM-facing API under `/v1`, and the provider webhook endpoints under
//! `/hooks` (authenticated by request signature, not bearer token).

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use turbodial_core::TurbodialError;
use turbodial_dialer::DialerEngine;

use crate::auth::{AuthConfig, auth_middleware};
use crate::{handlers, webhooks};

/// Webhook signature validation settings.
#[derive(Clone)]
pub struct SignatureConfig {
    /// HMAC key (the provider auth token). Required when `validate` is set.
    pub auth_token: Option<String>,
    /// Whether to validate `X-Provider-Signature` on webhook requests.
    pub validate: bool,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The dispatch engine the webhook handlers drive.
    pub engine: Arc<DialerEngine>,
    /// Bearer auth for the CRM-facing API.
    pub auth: AuthConfig,
    /// Webhook signature validation.
    pub signature: SignatureConfig,
}

/// Gateway server configuration (mirrors `GatewayConfig` from turbodial-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router over the shared state.
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let api_routes = Router::new()
        .route("/v1/queue", post(handlers::post_queue))
        .route("/v1/queue/status", get(handlers::get_queue_status))
        .route("/v1/reps/login", post(handlers::post_rep_login))
        .route("/v1/reps/logout", post(handlers::post_rep_logout))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let hook_routes = Router::new()
        .route("/hooks/answer", post(webhooks::post_answer))
        .route("/hooks/status", post(webhooks::post_status))
        .route("/hooks/conference", post(webhooks::post_conference))
        .route("/hooks/recording", post(webhooks::post_recording))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(hook_routes)
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and serve until the task is aborted.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
) -> Result<(), TurbodialError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TurbodialError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| TurbodialError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
