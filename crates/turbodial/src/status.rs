// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `turbodial status` command implementation.
//!
//! Queries the running gateway's queue-status endpoint and prints a
//! per-status summary. Falls back gracefully when the service is down.

use std::time::Duration;

use serde::Deserialize;
use turbodial_config::TurbodialConfig;
use turbodial_core::TurbodialError;

#[derive(Debug, Deserialize)]
struct StatusCount {
    status: String,
    count: i64,
}

#[derive(Debug, Deserialize)]
struct QueueStatusResponse {
    org_id: String,
    counts: Vec<StatusCount>,
    available_reps: i64,
}

/// Run the `turbodial status` command.
pub async fn run_status(
    config: &TurbodialConfig,
    org_id: &str,
    json: bool,
) -> Result<(), TurbodialError> {
    let url = format!(
        "http://{}:{}/v1/queue/status?org_id={org_id}",
        config.gateway.host, config.gateway.port
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| TurbodialError::Internal(format!("failed to build HTTP client: {e}")))?;

    let mut request = client.get(&url);
    if let Some(token) = &config.gateway.bearer_token {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(_) => {
            if json {
                println!("{}", serde_json::json!({"running": false}));
            } else {
                println!("turbodial is not running on {}", url);
            }
            return Ok(());
        }
    };

    if !response.status().is_success() {
        return Err(TurbodialError::Internal(format!(
            "status request failed: {}",
            response.status()
        )));
    }

    let status: QueueStatusResponse = response
        .json()
        .await
        .map_err(|e| TurbodialError::Internal(format!("malformed status response: {e}")))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "running": true,
                "org_id": status.org_id,
                "available_reps": status.available_reps,
                "counts": status.counts.iter()
                    .map(|c| (c.status.clone(), c.count))
                    .collect::<std::collections::BTreeMap<_, _>>(),
            })
        );
    } else {
        println!("org: {}", status.org_id);
        println!("available reps: {}", status.available_reps);
        if status.counts.is_empty() {
            println!("queue: empty");
        } else {
            for count in &status.counts {
                println!("  {:>10}: {}", count.status, count.count);
            }
        }
    }

    Ok(())
}
