// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch launcher: periodic fan-out of outbound calls.
//!
//! Each cycle sizes a batch from the number of available reps plus a
//! fixed slack (absorbing expected no-answers), claims that many queued
//! entries atomically, and places one call per entry under a shared
//! batch id. Placement failures burn a retry on the entry and never
//! abort the rest of the batch.

use std::sync::Arc;

use tracing::{debug, info, warn};
use turbodial_core::{CallAttempt, Disposition, PlaceCallRequest, TurbodialError};
use turbodial_storage::queries::{attempts, queue, reps};
use uuid::Uuid;

use crate::engine::DialerEngine;

/// Run one dispatch cycle for an org. Returns the number of calls placed.
pub async fn run_dispatch_cycle(
    engine: &DialerEngine,
    org_id: &str,
) -> Result<usize, TurbodialError> {
    let available = reps::available_count(&engine.db, org_id).await?;
    if available == 0 {
        debug!(org_id, "no available reps, skipping dispatch cycle");
        return Ok(0);
    }

    let target = (available as usize + engine.config.fanout_slack)
        .min(engine.config.max_batch_size);
    let batch = queue::next_batch(&engine.db, org_id, target).await?;
    if batch.is_empty() {
        return Ok(0);
    }

    let batch_id = Uuid::new_v4().to_string();
    let mut placed = 0;

    for entry in &batch {
        let request = PlaceCallRequest {
            to: entry.phone.clone(),
            from: engine.caller_id.clone(),
            answer_url: engine.answer_url().to_string(),
            status_url: engine.status_url().to_string(),
            machine_detection: true,
        };

        match engine.provider.place_call(&request).await {
            Ok(call_handle) => {
                let attempt = CallAttempt {
                    call_handle: call_handle.clone(),
                    queue_entry_id: entry.id,
                    org_id: entry.org_id.clone(),
                    lead_id: entry.lead_id.clone(),
                    batch_id: batch_id.clone(),
                    status: turbodial_core::AttemptStatus::Dialing,
                    caller_id: Some(engine.caller_id.clone()),
                    assigned_rep_id: None,
                    session_id: None,
                    conference_name: None,
                    is_first_answer: false,
                    ringing_at: None,
                    answered_at: None,
                    connected_at: None,
                    ended_at: None,
                    recording_url: None,
                    voicemail_url: None,
                    voicemail_transcription: None,
                };
                attempts::create_attempt(&engine.db, &attempt).await?;
                debug!(call_handle, lead_id = %entry.lead_id, batch_id, "call placed");
                placed += 1;
            }
            Err(e) => {
                warn!(lead_id = %entry.lead_id, error = %e, "call placement failed");
                queue::mark_outcome(
                    &engine.db,
                    entry.id,
                    Disposition::Failed,
                    engine.config.retry_limit,
                    engine.config.redial_cooldown_secs,
                )
                .await?;
            }
        }
    }

    info!(org_id, batch_id, placed, batch_size = batch.len(), "dispatch cycle complete");
    Ok(placed)
}

/// Run the dispatch loop until cancellation, cycling every configured
/// interval over every org with dialable entries.
pub async fn run_dispatch_loop(
    engine: Arc<DialerEngine>,
    shutdown: tokio_util::sync::CancellationToken,
) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(
        engine.config.dispatch_interval_secs,
    ));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("dispatch loop shutting down");
                return;
            }
            _ = interval.tick() => {}
        }

        let orgs = match queue::orgs_with_queued_entries(&engine.db).await {
            Ok(orgs) => orgs,
            Err(e) => {
                warn!(error = %e, "failed to enumerate dispatch orgs");
                continue;
            }
        };

        for org_id in orgs {
            if let Err(e) = run_dispatch_cycle(&engine, &org_id).await {
                warn!(org_id, error = %e, "dispatch cycle failed");
            }
        }
    }
}
