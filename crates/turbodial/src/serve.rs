// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `turbodial serve` command implementation.
//!
//! Assembles the full stack: SQLite storage, the provider REST client,
//! the dispatch engine, the periodic dispatch loop, and the HTTP gateway.
//! Shuts down gracefully on ctrl-c.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use turbodial_config::TurbodialConfig;
use turbodial_core::{NoopCrmHooks, TurbodialError};
use turbodial_dialer::{DialerEngine, run_dispatch_loop};
use turbodial_gateway::{AuthConfig, GatewayState, ServerConfig, SignatureConfig};
use turbodial_storage::Database;
use turbodial_telephony::ProviderClient;

/// Run the `turbodial serve` command.
pub async fn run_serve(config: TurbodialConfig) -> Result<(), TurbodialError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting turbodial serve");

    let account_sid = config
        .telephony
        .account_sid
        .clone()
        .ok_or_else(|| TurbodialError::Config("telephony.account_sid is required".to_string()))?;
    let auth_token = config
        .telephony
        .auth_token
        .clone()
        .ok_or_else(|| TurbodialError::Config("telephony.auth_token is required".to_string()))?;
    let caller_id = config
        .telephony
        .caller_id
        .clone()
        .ok_or_else(|| TurbodialError::Config("telephony.caller_id is required".to_string()))?;
    let public_base_url = config.gateway.public_base_url.clone().ok_or_else(|| {
        TurbodialError::Config(
            "gateway.public_base_url is required so the provider can reach the webhooks"
                .to_string(),
        )
    })?;

    if config.gateway.bearer_token.is_none() {
        warn!("gateway.bearer_token is unset; the CRM API is unauthenticated");
    }

    let db = Database::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "database ready");

    let provider = ProviderClient::new(
        account_sid,
        auth_token.clone(),
        config.telephony.base_url.clone(),
    )?;

    let engine = Arc::new(DialerEngine::new(
        db,
        Arc::new(provider),
        Arc::new(NoopCrmHooks),
        config.dialer.clone(),
        caller_id,
        &public_base_url,
    ));

    let shutdown = CancellationToken::new();
    let dispatch_handle = tokio::spawn(run_dispatch_loop(engine.clone(), shutdown.clone()));

    let state = GatewayState {
        engine,
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        signature: SignatureConfig {
            auth_token: Some(auth_token),
            validate: config.telephony.validate_signatures,
        },
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    tokio::select! {
        result = turbodial_gateway::start_server(&server_config, state) => {
            shutdown.cancel();
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    }

    if let Err(e) = dispatch_handle.await {
        warn!(error = %e, "dispatch loop did not stop cleanly");
    }
    info!("turbodial stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("turbodial={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
