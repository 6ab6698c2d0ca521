// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle webhook processor: call-status and conference events.
//!
//! Events arrive at least once and in no guaranteed order. Every
//! transition here is a conditional database update, so replays and
//! out-of-order deliveries collapse into no-ops.

use tracing::{debug, info, warn};
use turbodial_core::{AttemptStatus, Disposition, QueueStatus, TurbodialError};
use turbodial_storage::queries::{attempts, queue, reps};

use crate::engine::DialerEngine;

/// Map a provider call-status string to a terminal attempt status, or
/// `None` for non-terminal and unknown statuses.
fn terminal_status(provider_status: &str) -> Option<AttemptStatus> {
    match provider_status {
        "completed" => Some(AttemptStatus::Completed),
        "busy" => Some(AttemptStatus::Busy),
        "no-answer" => Some(AttemptStatus::NoAnswer),
        "failed" => Some(AttemptStatus::Failed),
        "canceled" => Some(AttemptStatus::Canceled),
        _ => None,
    }
}

/// Disposition for a terminal event, based on where the attempt was when
/// the call ended.
fn disposition_for(prior: AttemptStatus, terminal: AttemptStatus) -> Disposition {
    match prior {
        AttemptStatus::Connected => Disposition::Connected,
        AttemptStatus::Machine => Disposition::Machine,
        // A held call that ended was either recorded or abandoned mid-hold;
        // either way the lead picked up, so the entry is done.
        AttemptStatus::Holding => Disposition::Voicemail,
        _ => match terminal {
            AttemptStatus::Completed => Disposition::Connected,
            AttemptStatus::Busy => Disposition::Busy,
            AttemptStatus::NoAnswer => Disposition::NoAnswer,
            AttemptStatus::Canceled => Disposition::Canceled,
            _ => Disposition::Failed,
        },
    }
}

/// Process one call-status event.
///
/// Unknown call handles are acknowledged and dropped: the event belongs to
/// an untracked or already-cleaned-up call.
pub async fn process_status_event(
    engine: &DialerEngine,
    call_handle: &str,
    provider_status: &str,
    duration_secs: u64,
) -> Result<(), TurbodialError> {
    let Some(attempt) = attempts::get_attempt(&engine.db, call_handle).await? else {
        debug!(call_handle, provider_status, "status event for untracked call");
        return Ok(());
    };

    match provider_status {
        // The attempt is created as `dialing`; nothing to advance.
        "initiated" => Ok(()),
        "ringing" => {
            attempts::advance_in_flight(&engine.db, call_handle, AttemptStatus::Ringing).await?;
            queue::advance_in_flight(&engine.db, attempt.queue_entry_id, QueueStatus::Ringing)
                .await?;
            Ok(())
        }
        // The machine-detection branch runs in the answer handler; here the
        // event only advances the timeline.
        "in-progress" => {
            attempts::advance_in_flight(&engine.db, call_handle, AttemptStatus::Answered).await?;
            queue::advance_in_flight(&engine.db, attempt.queue_entry_id, QueueStatus::Answered)
                .await?;
            Ok(())
        }
        _ => {
            let Some(terminal) = terminal_status(provider_status) else {
                warn!(call_handle, provider_status, "unknown call status, ignoring");
                return Ok(());
            };

            let prior = attempt.status;
            let transitioned =
                attempts::mark_terminal(&engine.db, call_handle, terminal).await?;
            if transitioned {
                let disposition = disposition_for(prior, terminal);
                info!(
                    call_handle,
                    provider_status,
                    %disposition,
                    duration_secs,
                    "call ended"
                );
                queue::mark_outcome(
                    &engine.db,
                    attempt.queue_entry_id,
                    disposition,
                    engine.config.retry_limit,
                    engine.config.redial_cooldown_secs,
                )
                .await?;
            }

            // Backstop release even on replays, in case the conference
            // leave event was missed.
            if let Some(session_id) = &attempt.session_id {
                reps::release_rep(&engine.db, session_id).await?;
                if transitioned && prior == AttemptStatus::Connected && duration_secs > 0 {
                    reps::increment_connected(&engine.db, session_id).await?;
                }
            }
            Ok(())
        }
    }
}

/// Process a conference membership event.
///
/// A rep leaving their conference (or the conference ending) releases the
/// rep back to the available pool.
pub async fn process_conference_event(
    engine: &DialerEngine,
    conference_name: &str,
    event: &str,
) -> Result<(), TurbodialError> {
    match event {
        "participant-leave" | "conference-end" => {
            let released =
                reps::release_rep_by_conference(&engine.db, conference_name).await?;
            if released {
                info!(conference_name, event, "rep released back to pool");
            }
            Ok(())
        }
        _ => {
            debug!(conference_name, event, "ignoring conference event");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_mapping_covers_provider_statuses() {
        assert_eq!(terminal_status("completed"), Some(AttemptStatus::Completed));
        assert_eq!(terminal_status("no-answer"), Some(AttemptStatus::NoAnswer));
        assert_eq!(terminal_status("ringing"), None);
        assert_eq!(terminal_status("queued"), None);
    }

    #[test]
    fn disposition_prefers_prior_state() {
        assert_eq!(
            disposition_for(AttemptStatus::Connected, AttemptStatus::Completed),
            Disposition::Connected
        );
        assert_eq!(
            disposition_for(AttemptStatus::Machine, AttemptStatus::Completed),
            Disposition::Machine
        );
        assert_eq!(
            disposition_for(AttemptStatus::Holding, AttemptStatus::Completed),
            Disposition::Voicemail
        );
        assert_eq!(
            disposition_for(AttemptStatus::Ringing, AttemptStatus::NoAnswer),
            Disposition::NoAnswer
        );
        assert_eq!(
            disposition_for(AttemptStatus::Dialing, AttemptStatus::Canceled),
            Disposition::Canceled
        );
    }
}
