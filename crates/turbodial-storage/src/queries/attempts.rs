// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call attempt operations keyed by the provider call handle.
//!
//! All state transitions are conditional updates: terminal statuses are
//! sticky, and the first-answer flag can be won by at most one attempt per
//! batch. Callers inspect the returned bool to learn whether a transition
//! actually happened, which is how duplicate webhook deliveries degrade to
//! no-ops.

use rusqlite::params;
use turbodial_core::{AttemptStatus, CallAttempt, TurbodialError};

use crate::database::Database;
use crate::queries::parse_enum;

fn row_to_attempt(row: &rusqlite::Row<'_>) -> Result<CallAttempt, rusqlite::Error> {
    let status: String = row.get(5)?;
    let is_first_answer: i64 = row.get(10)?;
    Ok(CallAttempt {
        call_handle: row.get(0)?,
        queue_entry_id: row.get(1)?,
        org_id: row.get(2)?,
        lead_id: row.get(3)?,
        batch_id: row.get(4)?,
        status: parse_enum(5, &status)?,
        caller_id: row.get(6)?,
        assigned_rep_id: row.get(7)?,
        session_id: row.get(8)?,
        conference_name: row.get(9)?,
        is_first_answer: is_first_answer != 0,
        ringing_at: row.get(11)?,
        answered_at: row.get(12)?,
        connected_at: row.get(13)?,
        ended_at: row.get(14)?,
        recording_url: row.get(15)?,
        voicemail_url: row.get(16)?,
        voicemail_transcription: row.get(17)?,
    })
}

const ATTEMPT_COLUMNS: &str = "call_handle, queue_entry_id, org_id, lead_id, batch_id, status,
     caller_id, assigned_rep_id, session_id, conference_name, is_first_answer,
     ringing_at, answered_at, connected_at, ended_at,
     recording_url, voicemail_url, voicemail_transcription";

/// Statuses that refuse any further transition.
const TERMINAL_SET: &str = "('completed', 'busy', 'no_answer', 'failed', 'canceled')";

/// Record a freshly placed dial.
pub async fn create_attempt(db: &Database, attempt: &CallAttempt) -> Result<(), TurbodialError> {
    let attempt = attempt.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO call_attempts
                     (call_handle, queue_entry_id, org_id, lead_id, batch_id, status, caller_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    attempt.call_handle,
                    attempt.queue_entry_id,
                    attempt.org_id,
                    attempt.lead_id,
                    attempt.batch_id,
                    attempt.status.to_string(),
                    attempt.caller_id,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up an attempt by its provider call handle.
pub async fn get_attempt(
    db: &Database,
    call_handle: &str,
) -> Result<Option<CallAttempt>, TurbodialError> {
    let call_handle = call_handle.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ATTEMPT_COLUMNS} FROM call_attempts WHERE call_handle = ?1"
            ))?;
            match stmt.query_row(params![call_handle], row_to_attempt) {
                Ok(attempt) => Ok(Some(attempt)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Advance a live attempt to a non-terminal in-flight status.
///
/// Only moves forward from pre-answer states so a late `ringing` can never
/// demote an attempt that is already holding, connected, or terminal.
/// Returns whether the transition happened.
pub async fn advance_in_flight(
    db: &Database,
    call_handle: &str,
    status: AttemptStatus,
) -> Result<bool, TurbodialError> {
    debug_assert!(!status.is_terminal());
    let call_handle = call_handle.to_string();
    let (timestamp_column, allowed_from) = match status {
        AttemptStatus::Ringing => ("ringing_at", "('dialing')"),
        AttemptStatus::Answered => ("answered_at", "('dialing', 'ringing')"),
        _ => ("answered_at", "('dialing', 'ringing')"),
    };
    let status_str = status.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                &format!(
                    "UPDATE call_attempts SET status = ?2,
                     {timestamp_column} = COALESCE({timestamp_column},
                         strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     WHERE call_handle = ?1 AND status IN {allowed_from}"
                ),
                params![call_handle, status_str],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark an answered call as classified machine/fax. No rep is ever claimed
/// for these. Returns whether the transition happened.
pub async fn mark_machine(db: &Database, call_handle: &str) -> Result<bool, TurbodialError> {
    let call_handle = call_handle.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                &format!(
                    "UPDATE call_attempts SET status = 'machine',
                     answered_at = COALESCE(answered_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     WHERE call_handle = ?1 AND status NOT IN {TERMINAL_SET}"
                ),
                params![call_handle],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Park an answered call while no rep is claimable (first claim failure).
pub async fn mark_holding(db: &Database, call_handle: &str) -> Result<bool, TurbodialError> {
    let call_handle = call_handle.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                &format!(
                    "UPDATE call_attempts SET status = 'holding',
                     answered_at = COALESCE(answered_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     WHERE call_handle = ?1 AND status NOT IN {TERMINAL_SET}"
                ),
                params![call_handle],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Connect an answered call to a claimed rep, winning the batch first-answer
/// flag if no sibling holds it yet.
///
/// The status/rep columns and the first-answer flag are written in one
/// conditional statement each, inside one transaction: a second answered
/// call in the same batch can still connect (to a different rep) but can
/// never also carry `is_first_answer`.
pub async fn connect_to_rep(
    db: &Database,
    call_handle: &str,
    rep_id: &str,
    session_id: &str,
    conference_name: &str,
) -> Result<bool, TurbodialError> {
    let call_handle = call_handle.to_string();
    let rep_id = rep_id.to_string();
    let session_id = session_id.to_string();
    let conference_name = conference_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let connected = tx.execute(
                &format!(
                    "UPDATE call_attempts SET status = 'connected',
                     assigned_rep_id = ?2, session_id = ?3, conference_name = ?4,
                     connected_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     answered_at = COALESCE(answered_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     WHERE call_handle = ?1 AND status NOT IN {TERMINAL_SET}"
                ),
                params![call_handle, rep_id, session_id, conference_name],
            )?;
            if connected > 0 {
                tx.execute(
                    "UPDATE call_attempts SET is_first_answer = 1
                     WHERE call_handle = ?1
                       AND NOT EXISTS (
                           SELECT 1 FROM call_attempts sibling
                           WHERE sibling.batch_id =
                                 (SELECT batch_id FROM call_attempts WHERE call_handle = ?1)
                             AND sibling.is_first_answer = 1)",
                    params![call_handle],
                )?;
            }
            tx.commit()?;
            Ok(connected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move an attempt to a terminal status. Terminal statuses are sticky, so
/// replays and out-of-order events no-op here. Returns whether the
/// transition happened.
pub async fn mark_terminal(
    db: &Database,
    call_handle: &str,
    status: AttemptStatus,
) -> Result<bool, TurbodialError> {
    debug_assert!(status.is_terminal());
    let call_handle = call_handle.to_string();
    let status_str = status.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                &format!(
                    "UPDATE call_attempts SET status = ?2,
                     ended_at = COALESCE(ended_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     WHERE call_handle = ?1 AND status NOT IN {TERMINAL_SET}"
                ),
                params![call_handle, status_str],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Batch siblings still in a pre-answer state, eligible for cancellation.
pub async fn pre_answer_siblings(
    db: &Database,
    batch_id: &str,
    exclude_handle: &str,
) -> Result<Vec<CallAttempt>, TurbodialError> {
    let batch_id = batch_id.to_string();
    let exclude_handle = exclude_handle.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ATTEMPT_COLUMNS} FROM call_attempts
                 WHERE batch_id = ?1 AND call_handle != ?2
                   AND status IN ('dialing', 'ringing')"
            ))?;
            let rows = stmt.query_map(params![batch_id, exclude_handle], row_to_attempt)?;
            let mut attempts = Vec::new();
            for row in rows {
                attempts.push(row?);
            }
            Ok(attempts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Attach a call recording URL delivered by a status event.
pub async fn set_recording_url(
    db: &Database,
    call_handle: &str,
    url: &str,
) -> Result<(), TurbodialError> {
    let call_handle = call_handle.to_string();
    let url = url.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE call_attempts SET recording_url = ?2 WHERE call_handle = ?1",
                params![call_handle, url],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Attach a voicemail recording and its transcription.
///
/// The recording and the transcription arrive as separate callbacks, so
/// both columns keep their existing value when the argument is absent.
pub async fn attach_voicemail(
    db: &Database,
    call_handle: &str,
    voicemail_url: Option<&str>,
    transcription: Option<&str>,
) -> Result<bool, TurbodialError> {
    let call_handle = call_handle.to_string();
    let voicemail_url = voicemail_url.map(|s| s.to_string());
    let transcription = transcription.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE call_attempts SET
                 voicemail_url = COALESCE(?2, voicemail_url),
                 voicemail_transcription = COALESCE(?3, voicemail_transcription)
                 WHERE call_handle = ?1",
                params![call_handle, voicemail_url, transcription],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use turbodial_core::Disposition;

    use crate::queries::queue;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn seed_attempt(db: &Database, handle: &str, batch: &str) -> CallAttempt {
        let lead = turbodial_core::LeadRef {
            lead_id: format!("lead-{handle}"),
            phone: "+15550100".to_string(),
        };
        queue::enqueue(db, "org-1", &[lead], 0, None).await.unwrap();
        let entry = queue::next_batch(db, "org-1", 1).await.unwrap().remove(0);
        let attempt = CallAttempt {
            call_handle: handle.to_string(),
            queue_entry_id: entry.id,
            org_id: "org-1".to_string(),
            lead_id: entry.lead_id.clone(),
            batch_id: batch.to_string(),
            status: AttemptStatus::Dialing,
            caller_id: Some("+15550100".to_string()),
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
        create_attempt(db, &attempt).await.unwrap();
        attempt
    }

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let (db, _dir) = setup_db().await;
        seed_attempt(&db, "CA1", "batch-1").await;

        let attempt = get_attempt(&db, "CA1").await.unwrap().unwrap();
        assert_eq!(attempt.status, AttemptStatus::Dialing);
        assert_eq!(attempt.batch_id, "batch-1");
        assert!(!attempt.is_first_answer);

        assert!(get_attempt(&db, "CA-missing").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn in_flight_advance_sets_timestamps_once() {
        let (db, _dir) = setup_db().await;
        seed_attempt(&db, "CA1", "batch-1").await;

        assert!(advance_in_flight(&db, "CA1", AttemptStatus::Ringing)
            .await
            .unwrap());
        let ringing_at = get_attempt(&db, "CA1").await.unwrap().unwrap().ringing_at;
        assert!(ringing_at.is_some());

        // Replay of the same event is a no-op.
        assert!(!advance_in_flight(&db, "CA1", AttemptStatus::Ringing)
            .await
            .unwrap());

        assert!(advance_in_flight(&db, "CA1", AttemptStatus::Answered)
            .await
            .unwrap());
        let attempt = get_attempt(&db, "CA1").await.unwrap().unwrap();
        assert_eq!(attempt.status, AttemptStatus::Answered);
        assert_eq!(attempt.ringing_at, ringing_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn terminal_status_is_sticky() {
        let (db, _dir) = setup_db().await;
        seed_attempt(&db, "CA1", "batch-1").await;

        assert!(mark_terminal(&db, "CA1", AttemptStatus::Completed)
            .await
            .unwrap());
        let ended_at = get_attempt(&db, "CA1").await.unwrap().unwrap().ended_at;
        assert!(ended_at.is_some());

        // A late ringing event must not resurrect the attempt.
        assert!(!advance_in_flight(&db, "CA1", AttemptStatus::Ringing)
            .await
            .unwrap());
        // Nor can a second terminal overwrite the first.
        assert!(!mark_terminal(&db, "CA1", AttemptStatus::Failed)
            .await
            .unwrap());

        let attempt = get_attempt(&db, "CA1").await.unwrap().unwrap();
        assert_eq!(attempt.status, AttemptStatus::Completed);
        assert_eq!(attempt.ended_at, ended_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn only_one_attempt_per_batch_wins_first_answer() {
        let (db, _dir) = setup_db().await;
        seed_attempt(&db, "CA1", "batch-1").await;
        seed_attempt(&db, "CA2", "batch-1").await;

        assert!(connect_to_rep(&db, "CA1", "rep-1", "sess-1", "conf-1")
            .await
            .unwrap());
        // A second call in the same batch connects to a different rep but
        // does not get the flag.
        assert!(connect_to_rep(&db, "CA2", "rep-2", "sess-2", "conf-2")
            .await
            .unwrap());

        let a1 = get_attempt(&db, "CA1").await.unwrap().unwrap();
        let a2 = get_attempt(&db, "CA2").await.unwrap().unwrap();
        assert!(a1.is_first_answer);
        assert!(!a2.is_first_answer);
        assert_eq!(a1.status, AttemptStatus::Connected);
        assert_eq!(a2.status, AttemptStatus::Connected);
        assert_eq!(a1.assigned_rep_id.as_deref(), Some("rep-1"));
        assert_eq!(a1.conference_name.as_deref(), Some("conf-1"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn connect_refused_on_terminal_attempt() {
        let (db, _dir) = setup_db().await;
        seed_attempt(&db, "CA1", "batch-1").await;
        mark_terminal(&db, "CA1", AttemptStatus::Canceled)
            .await
            .unwrap();

        assert!(!connect_to_rep(&db, "CA1", "rep-1", "sess-1", "conf-1")
            .await
            .unwrap());
        let attempt = get_attempt(&db, "CA1").await.unwrap().unwrap();
        assert_eq!(attempt.status, AttemptStatus::Canceled);
        assert!(!attempt.is_first_answer);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn pre_answer_siblings_excludes_winner_and_settled_calls() {
        let (db, _dir) = setup_db().await;
        seed_attempt(&db, "CA1", "batch-1").await;
        seed_attempt(&db, "CA2", "batch-1").await;
        seed_attempt(&db, "CA3", "batch-1").await;
        seed_attempt(&db, "CA4", "batch-2").await;

        advance_in_flight(&db, "CA2", AttemptStatus::Ringing)
            .await
            .unwrap();
        mark_terminal(&db, "CA3", AttemptStatus::Busy).await.unwrap();

        let siblings = pre_answer_siblings(&db, "batch-1", "CA1").await.unwrap();
        let handles: Vec<&str> = siblings.iter().map(|a| a.call_handle.as_str()).collect();
        assert_eq!(handles, vec!["CA2"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn voicemail_attachment_round_trips() {
        let (db, _dir) = setup_db().await;
        let attempt = seed_attempt(&db, "CA1", "batch-1").await;

        // Recording first, transcription later, as the provider delivers them.
        assert!(attach_voicemail(
            &db,
            "CA1",
            Some("https://recordings.example/vm1"),
            None
        )
        .await
        .unwrap());
        assert!(attach_voicemail(&db, "CA1", None, Some("call me back tomorrow"))
            .await
            .unwrap());
        queue::mark_outcome(&db, attempt.queue_entry_id, Disposition::Voicemail, 3, 0)
            .await
            .unwrap();

        let stored = get_attempt(&db, "CA1").await.unwrap().unwrap();
        assert_eq!(
            stored.voicemail_url.as_deref(),
            Some("https://recordings.example/vm1")
        );
        assert_eq!(
            stored.voicemail_transcription.as_deref(),
            Some("call me back tomorrow")
        );

        // Unknown handle reports false so the caller can ack-and-drop.
        assert!(
            !attach_voicemail(&db, "CA-missing", Some("u"), None)
                .await
                .unwrap()
        );

        db.close().await.unwrap();
    }
}
