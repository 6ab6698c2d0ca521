// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer handler: the moment a lead picks up.
//!
//! This is the correctness-critical path. Several answers from the same
//! batch can arrive concurrently; the rep claim and the connect are both
//! database compare-and-set operations, so exactly one answer wins each
//! rep and at most one attempt per batch carries the first-answer flag.
//!
//! The handler returns a semantic [`AnswerAction`]; rendering it into a
//! provider response document is the gateway's job.

use tracing::{debug, info, warn};
use turbodial_core::{
    AttemptStatus, CrmCallRecord, Disposition, MachineDetection, TurbodialError,
};
use turbodial_storage::queries::{attempts, queue, reps};

use crate::conference::conference_name;
use crate::engine::DialerEngine;

/// What the provider should do with the answered call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerAction {
    /// Machine or fax answered: hang up without claiming a rep.
    HangupMachine,
    /// A rep was claimed: bridge the lead into the rep's conference.
    Bridge { conference_name: String },
    /// No rep available, first failure: pause briefly and retry once.
    Hold { pause_secs: u64 },
    /// No rep available, second failure: record a voicemail.
    Voicemail,
    /// Stale or replayed event: acknowledge without instructions.
    Ignore,
}

/// Handle an answer webhook for `call_handle`.
///
/// `answered_by` is the provider's machine-detection verdict; it is absent
/// on the redirect re-invocation after a hold, which is how the handler
/// tells a first claim from the bounded second one (the attempt is already
/// `holding` by then).
pub async fn handle_answer(
    engine: &DialerEngine,
    call_handle: &str,
    answered_by: Option<&str>,
) -> Result<AnswerAction, TurbodialError> {
    let Some(attempt) = attempts::get_attempt(&engine.db, call_handle).await? else {
        return Err(TurbodialError::UntrackedCallback {
            call_handle: call_handle.to_string(),
        });
    };

    if attempt.status.is_terminal() {
        debug!(call_handle, status = %attempt.status, "answer event for ended attempt");
        return Ok(AnswerAction::Ignore);
    }

    let detection = MachineDetection::from_provider(answered_by);
    if detection.is_machine() {
        if attempts::mark_machine(&engine.db, call_handle).await? {
            queue::mark_outcome(
                &engine.db,
                attempt.queue_entry_id,
                Disposition::Machine,
                engine.config.retry_limit,
                engine.config.redial_cooldown_secs,
            )
            .await?;
            info!(call_handle, verdict = %detection, "machine answered, hanging up");
            return Ok(AnswerAction::HangupMachine);
        }
        return Ok(AnswerAction::Ignore);
    }

    let second_claim = attempt.status == AttemptStatus::Holding;
    if !second_claim {
        // Best effort: the status webhook may already have advanced this.
        attempts::advance_in_flight(&engine.db, call_handle, AttemptStatus::Answered).await?;
    }

    let org_id = attempt.org_id.clone();
    let claimed = reps::claim_available_rep(&engine.db, &attempt.org_id, move |rep_id| {
        conference_name(&org_id, rep_id)
    })
    .await?;

    match claimed {
        Some(session) => {
            // The claim stamps the conference name; a claimed session
            // without one is corrupt, and the claim must be handed back.
            let Some(conference) = session.conference_name.clone() else {
                release_claim(engine, &session.session_id).await;
                return Err(TurbodialError::Internal(format!(
                    "claimed session {} carries no conference name",
                    session.session_id
                )));
            };

            let connected = match attempts::connect_to_rep(
                &engine.db,
                call_handle,
                &session.rep_id,
                &session.session_id,
                &conference,
            )
            .await
            {
                Ok(connected) => connected,
                Err(e) => {
                    release_claim(engine, &session.session_id).await;
                    return Err(e);
                }
            };
            if !connected {
                // The call ended between the answer event and the claim;
                // hand the rep straight back.
                reps::release_rep(&engine.db, &session.session_id).await?;
                return Ok(AnswerAction::Ignore);
            }

            info!(
                call_handle,
                rep_id = %session.rep_id,
                conference = %conference,
                "lead connected to rep"
            );

            let refreshed = attempts::get_attempt(&engine.db, call_handle).await?;
            let is_first = refreshed.as_ref().is_some_and(|a| a.is_first_answer);
            if is_first {
                cancel_siblings(engine, &attempt.batch_id, call_handle).await;
            }

            if let Err(e) = engine
                .crm
                .assign_lead_owner(&attempt.org_id, &attempt.lead_id, &session.rep_id)
                .await
            {
                warn!(lead_id = %attempt.lead_id, error = %e, "CRM owner assignment failed");
            }
            let record = CrmCallRecord {
                org_id: attempt.org_id.clone(),
                lead_id: attempt.lead_id.clone(),
                rep_id: session.rep_id.clone(),
                call_handle: call_handle.to_string(),
                conference_name: conference.clone(),
                connected_at: refreshed
                    .and_then(|a| a.connected_at)
                    .unwrap_or_default(),
            };
            if let Err(e) = engine.crm.record_call(&record).await {
                warn!(call_handle, error = %e, "CRM call record failed");
            }

            Ok(AnswerAction::Bridge {
                conference_name: conference,
            })
        }
        None if second_claim => {
            // Bounded fallback: two consecutive failed claims send the lead
            // to voicemail, never a third hold.
            info!(call_handle, "no rep on second claim, sending to voicemail");
            queue::mark_outcome(
                &engine.db,
                attempt.queue_entry_id,
                Disposition::Voicemail,
                engine.config.retry_limit,
                engine.config.redial_cooldown_secs,
            )
            .await?;
            Ok(AnswerAction::Voicemail)
        }
        None => {
            attempts::mark_holding(&engine.db, call_handle).await?;
            info!(call_handle, "no rep available, holding for one retry");
            Ok(AnswerAction::Hold {
                pause_secs: engine.config.hold_pause_secs,
            })
        }
    }
}

/// Hand a freshly claimed rep back when the connect write never landed.
///
/// Until `connect_to_rep` persists the session id on the attempt, no
/// lifecycle event can reach this claim; without the release the rep would
/// stay stuck claimed until re-login.
async fn release_claim(engine: &DialerEngine, session_id: &str) {
    if let Err(e) = reps::release_rep(&engine.db, session_id).await {
        warn!(session_id, error = %e, "compensating rep release failed");
    }
}

/// Cancel still-ringing siblings of the winning attempt and requeue their
/// entries. Cancellation failures (a sibling that ended on its own) are
/// logged and ignored.
async fn cancel_siblings(engine: &DialerEngine, batch_id: &str, winner_handle: &str) {
    let siblings = match attempts::pre_answer_siblings(&engine.db, batch_id, winner_handle).await
    {
        Ok(siblings) => siblings,
        Err(e) => {
            warn!(batch_id, error = %e, "failed to load batch siblings");
            return;
        }
    };

    for sibling in siblings {
        if let Err(e) = engine.provider.cancel_call(&sibling.call_handle).await {
            debug!(
                call_handle = %sibling.call_handle,
                error = %e,
                "sibling cancel rejected, it likely ended on its own"
            );
        }

        match attempts::mark_terminal(&engine.db, &sibling.call_handle, AttemptStatus::Canceled)
            .await
        {
            Ok(true) => {
                if let Err(e) = queue::mark_outcome(
                    &engine.db,
                    sibling.queue_entry_id,
                    Disposition::Canceled,
                    engine.config.retry_limit,
                    engine.config.redial_cooldown_secs,
                )
                .await
                {
                    warn!(
                        entry_id = sibling.queue_entry_id,
                        error = %e,
                        "failed to requeue canceled sibling"
                    );
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(call_handle = %sibling.call_handle, error = %e, "sibling cancel bookkeeping failed");
            }
        }
    }
}
