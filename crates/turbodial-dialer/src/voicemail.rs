// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voicemail finisher: recording and transcription completion.
//!
//! Transcription completes asynchronously, usually well after the call
//! itself has ended, so this path is independent of the answer and
//! lifecycle handlers.

use tracing::{debug, info};
use turbodial_core::{AttemptStatus, Disposition, TurbodialError};
use turbodial_storage::queries::{attempts, queue};

use crate::engine::DialerEngine;

/// Attach a completed recording (and transcription, when present) to its
/// attempt and close out the queue entry.
///
/// Recordings arrive on two paths: a voicemail left while the attempt was
/// holding, and an ordinary call recording for a connected call. Only the
/// voicemail path completes the entry here; connected calls are completed
/// by their own terminal status event.
pub async fn finish_voicemail(
    engine: &DialerEngine,
    call_handle: &str,
    recording_url: Option<&str>,
    transcription: Option<&str>,
) -> Result<(), TurbodialError> {
    let Some(attempt) = attempts::get_attempt(&engine.db, call_handle).await? else {
        debug!(call_handle, "recording event for untracked call");
        return Ok(());
    };

    let voicemail_path = matches!(
        attempt.status,
        AttemptStatus::Holding | AttemptStatus::Completed
    ) && attempt.session_id.is_none();

    if voicemail_path {
        let attached =
            attempts::attach_voicemail(&engine.db, call_handle, recording_url, transcription)
                .await?;
        if attached {
            info!(
                call_handle,
                has_transcription = transcription.is_some(),
                "voicemail attached"
            );
        }
        queue::mark_outcome(
            &engine.db,
            attempt.queue_entry_id,
            Disposition::Voicemail,
            engine.config.retry_limit,
            engine.config.redial_cooldown_secs,
        )
        .await?;
    } else if let Some(url) = recording_url {
        attempts::set_recording_url(&engine.db, call_handle, url).await?;
        debug!(call_handle, "call recording attached");
    }

    Ok(())
}
