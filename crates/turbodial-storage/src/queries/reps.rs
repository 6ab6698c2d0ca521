// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rep pool operations.
//!
//! `claim_available_rep` is the one operation in the whole system that must
//! never race: it is a compare-and-set against the availability column,
//! executed on the single writer thread, so N concurrent claims against a
//! pool of one rep see exactly one success. Release and counter bumps only
//! need to be idempotent.

use rusqlite::params;
use turbodial_core::{RepSession, TurbodialError};
#[cfg(test)]
use turbodial_core::Availability;

use crate::database::Database;
use crate::queries::parse_enum;

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<RepSession, rusqlite::Error> {
    let availability: String = row.get(3)?;
    Ok(RepSession {
        session_id: row.get(0)?,
        rep_id: row.get(1)?,
        org_id: row.get(2)?,
        availability: parse_enum(3, &availability)?,
        conference_name: row.get(4)?,
        claimed_at: row.get(5)?,
        connected_call_count: row.get(6)?,
    })
}

const SESSION_COLUMNS: &str = "session_id, rep_id, org_id, availability, conference_name,
     claimed_at, connected_call_count";

/// Open a dialing session for a rep logging into the pool.
///
/// Re-opening an existing session resets it to available (a rep whose
/// browser reconnected should not stay stuck claimed).
pub async fn open_session(
    db: &Database,
    session_id: &str,
    rep_id: &str,
    org_id: &str,
) -> Result<(), TurbodialError> {
    let session_id = session_id.to_string();
    let rep_id = rep_id.to_string();
    let org_id = org_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO rep_sessions (session_id, rep_id, org_id, availability)
                 VALUES (?1, ?2, ?3, 'available')
                 ON CONFLICT (session_id) DO UPDATE SET
                     availability = 'available',
                     conference_name = NULL,
                     claimed_at = NULL",
                params![session_id, rep_id, org_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove a rep's dialing session (logout).
pub async fn close_session(db: &Database, session_id: &str) -> Result<(), TurbodialError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM rep_sessions WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by id.
pub async fn get_session(
    db: &Database,
    session_id: &str,
) -> Result<Option<RepSession>, TurbodialError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM rep_sessions WHERE session_id = ?1"
            ))?;
            match stmt.query_row(params![session_id], row_to_session) {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim one available rep for the org.
///
/// Picks the least-recently-used available session (fair rotation), flips
/// it to claimed, and stamps the generated conference name, all inside one
/// transaction guarded by the availability predicate. Returns `None`
/// immediately when the pool is empty; never blocks.
pub async fn claim_available_rep(
    db: &Database,
    org_id: &str,
    conference_name_for: impl FnOnce(&str) -> String + Send + 'static,
) -> Result<Option<RepSession>, TurbodialError> {
    let org_id = org_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let candidate: Option<(String, String)> = match tx.query_row(
                "SELECT session_id, rep_id FROM rep_sessions
                 WHERE org_id = ?1 AND availability = 'available'
                 ORDER BY claimed_at ASC NULLS FIRST, session_id ASC
                 LIMIT 1",
                params![org_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            ) {
                Ok(v) => Some(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };

            let Some((session_id, rep_id)) = candidate else {
                tx.commit()?;
                return Ok(None);
            };

            let conference_name = conference_name_for(&rep_id);
            let affected = tx.execute(
                "UPDATE rep_sessions SET availability = 'claimed',
                 conference_name = ?2,
                 claimed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE session_id = ?1 AND availability = 'available'",
                params![session_id, conference_name],
            )?;
            if affected == 0 {
                // Lost the compare-and-set; report the pool as empty rather
                // than looping.
                tx.commit()?;
                return Ok(None);
            }

            let session = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM rep_sessions WHERE session_id = ?1"
                ))?;
                stmt.query_row(params![session_id], row_to_session)?
            };
            tx.commit()?;
            Ok(Some(session))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release a claimed session back to the pool.
///
/// Idempotent: only flips claimed -> available; a second release for an
/// already-released session is a silent no-op, which absorbs duplicate
/// lifecycle events. Returns whether a release actually happened.
pub async fn release_rep(db: &Database, session_id: &str) -> Result<bool, TurbodialError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE rep_sessions SET availability = 'available',
                 conference_name = NULL
                 WHERE session_id = ?1 AND availability = 'claimed'",
                params![session_id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release whichever session holds the given conference.
///
/// Used by conference-membership events, which carry the conference name
/// rather than the session id.
pub async fn release_rep_by_conference(
    db: &Database,
    conference_name: &str,
) -> Result<bool, TurbodialError> {
    let conference_name = conference_name.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE rep_sessions SET availability = 'available',
                 conference_name = NULL
                 WHERE conference_name = ?1 AND availability = 'claimed'",
                params![conference_name],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Best-effort bump of the connected-call counter. Non-fatal if the
/// session no longer exists.
pub async fn increment_connected(db: &Database, session_id: &str) -> Result<(), TurbodialError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE rep_sessions SET connected_call_count = connected_call_count + 1
                 WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of currently available reps for the org (dispatch fan-out bound).
pub async fn available_count(db: &Database, org_id: &str) -> Result<i64, TurbodialError> {
    let org_id = org_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM rep_sessions
                 WHERE org_id = ?1 AND availability = 'available'",
                params![org_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn conf_name(rep_id: &str) -> String {
        format!("turbo-test-{rep_id}")
    }

    #[tokio::test]
    async fn claim_against_empty_pool_returns_none_immediately() {
        let (db, _dir) = setup_db().await;
        let claimed = claim_available_rep(&db, "org-1", conf_name).await.unwrap();
        assert!(claimed.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_flips_availability_and_sets_conference() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();

        let claimed = claim_available_rep(&db, "org-1", conf_name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.session_id, "sess-1");
        assert_eq!(claimed.availability, Availability::Claimed);
        assert_eq!(claimed.conference_name.as_deref(), Some("turbo-test-rep-1"));
        assert!(claimed.claimed_at.is_some());

        // Pool is now empty.
        assert!(claim_available_rep(&db, "org-1", conf_name)
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_claims_against_pool_of_one_yield_exactly_one_success() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                claim_available_rep(&db, "org-1", conf_name).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1, "exactly one concurrent claim may win");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claims_do_not_cross_org_boundaries() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();

        assert!(claim_available_rep(&db, "org-2", conf_name)
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();
        claim_available_rep(&db, "org-1", conf_name)
            .await
            .unwrap()
            .unwrap();

        assert!(release_rep(&db, "sess-1").await.unwrap());
        // Duplicate lifecycle event: silent no-op.
        assert!(!release_rep(&db, "sess-1").await.unwrap());
        // Unknown session: also a no-op.
        assert!(!release_rep(&db, "sess-zzz").await.unwrap());

        let session = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(session.availability, Availability::Available);
        assert!(session.conference_name.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn release_by_conference_finds_the_holder() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();
        let claimed = claim_available_rep(&db, "org-1", conf_name)
            .await
            .unwrap()
            .unwrap();
        let conference = claimed.conference_name.unwrap();

        assert!(release_rep_by_conference(&db, &conference).await.unwrap());
        assert!(!release_rep_by_conference(&db, &conference).await.unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn increment_connected_is_best_effort() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();

        increment_connected(&db, "sess-1").await.unwrap();
        increment_connected(&db, "sess-1").await.unwrap();
        // Missing session must not error.
        increment_connected(&db, "sess-gone").await.unwrap();

        let session = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(session.connected_call_count, 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_a_session_resets_a_stuck_claim() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();
        claim_available_rep(&db, "org-1", conf_name)
            .await
            .unwrap()
            .unwrap();

        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();
        let session = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(session.availability, Availability::Available);
        assert!(session.conference_name.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn available_count_tracks_the_pool() {
        let (db, _dir) = setup_db().await;
        open_session(&db, "sess-1", "rep-1", "org-1").await.unwrap();
        open_session(&db, "sess-2", "rep-2", "org-1").await.unwrap();
        assert_eq!(available_count(&db, "org-1").await.unwrap(), 2);

        claim_available_rep(&db, "org-1", conf_name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(available_count(&db, "org-1").await.unwrap(), 1);

        close_session(&db, "sess-2").await.unwrap();
        assert_eq!(available_count(&db, "org-1").await.unwrap(), 0);

        db.close().await.unwrap();
    }
}
