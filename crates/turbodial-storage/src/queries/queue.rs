// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue store operations: enqueue, batch claiming, and outcome bookkeeping.

use rusqlite::params;
use turbodial_core::{Disposition, LeadRef, QueueEntry, QueueStatus, TurbodialError};

use crate::database::Database;
use crate::queries::parse_enum;

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<QueueEntry, rusqlite::Error> {
    let status: String = row.get(5)?;
    Ok(QueueEntry {
        id: row.get(0)?,
        org_id: row.get(1)?,
        lead_id: row.get(2)?,
        phone: row.get(3)?,
        priority: row.get(4)?,
        status: parse_enum(5, &status)?,
        added_at: row.get(6)?,
        added_by: row.get(7)?,
        last_attempt_at: row.get(8)?,
        last_disposition: row.get(9)?,
        attempt_count: row.get(10)?,
        not_before: row.get(11)?,
    })
}

const ENTRY_COLUMNS: &str = "id, org_id, lead_id, phone, priority, status, added_at, added_by,
     last_attempt_at, last_disposition, attempt_count, not_before";

/// Idempotently enqueue leads for dialing.
///
/// A lead already active in the queue has its priority and metadata
/// refreshed, not duplicated. A lead whose previous entry reached a
/// terminal state is re-activated with a fresh retry budget.
pub async fn enqueue(
    db: &Database,
    org_id: &str,
    leads: &[LeadRef],
    priority: i64,
    added_by: Option<&str>,
) -> Result<usize, TurbodialError> {
    let org_id = org_id.to_string();
    let leads = leads.to_vec();
    let added_by = added_by.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for lead in &leads {
                tx.execute(
                    "INSERT INTO queue_entries (org_id, lead_id, phone, priority, added_by)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (org_id, lead_id) DO UPDATE SET
                         phone = excluded.phone,
                         priority = excluded.priority,
                         added_by = excluded.added_by,
                         status = CASE
                             WHEN queue_entries.status IN ('completed', 'failed')
                             THEN 'queued' ELSE queue_entries.status END,
                         attempt_count = CASE
                             WHEN queue_entries.status IN ('completed', 'failed')
                             THEN 0 ELSE queue_entries.attempt_count END,
                         not_before = NULL",
                    params![org_id, lead.lead_id, lead.phone, priority, added_by],
                )?;
            }
            tx.commit()?;
            Ok(leads.len())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a queue entry by id.
pub async fn get_entry(db: &Database, id: i64) -> Result<Option<QueueEntry>, TurbodialError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM queue_entries WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_entry) {
                Ok(entry) => Ok(Some(entry)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim the next batch of queued entries for dialing.
///
/// Selects up to `n` entries with status `queued` (priority descending,
/// oldest first on ties, redial cooldown respected) and flips them to
/// `dialing` in the same transaction, so two concurrent dispatch cycles
/// can never pick the same entry.
pub async fn next_batch(
    db: &Database,
    org_id: &str,
    n: usize,
) -> Result<Vec<QueueEntry>, TurbodialError> {
    let org_id = org_id.to_string();
    let limit = n as i64;
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut entries = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM queue_entries
                     WHERE org_id = ?1 AND status = 'queued'
                       AND (not_before IS NULL
                            OR not_before <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ORDER BY priority DESC, added_at ASC
                     LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![org_id, limit], row_to_entry)?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                entries
            };

            for entry in &mut entries {
                tx.execute(
                    "UPDATE queue_entries SET status = 'dialing',
                     last_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![entry.id],
                )?;
                entry.status = QueueStatus::Dialing;
            }
            tx.commit()?;
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Advance a dialed entry alongside its live call attempt.
///
/// Only moves forward from earlier in-flight states, so a late `ringing`
/// event can never demote an answered or settled entry. Returns whether the
/// transition happened.
pub async fn advance_in_flight(
    db: &Database,
    entry_id: i64,
    status: QueueStatus,
) -> Result<bool, TurbodialError> {
    debug_assert!(!status.is_terminal());
    let allowed_from = match status {
        QueueStatus::Ringing => "('dialing')",
        _ => "('dialing', 'ringing')",
    };
    let status_str = status.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                &format!(
                    "UPDATE queue_entries SET status = ?2
                     WHERE id = ?1 AND status IN {allowed_from}"
                ),
                params![entry_id, status_str],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a call disposition to a queue entry.
///
/// Connecting dispositions (`connected`, `machine`, `voicemail`) complete
/// the entry. A sibling cancellation requeues it without consuming a retry
/// attempt. Retryable dispositions increment `attempt_count` and either
/// requeue (with the optional cooldown window) or fail the entry once the
/// retry limit is reached. Terminal entries are sticky: the call is a no-op.
pub async fn mark_outcome(
    db: &Database,
    entry_id: i64,
    disposition: Disposition,
    retry_limit: i64,
    cooldown_secs: u64,
) -> Result<(), TurbodialError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let current: Option<(String, i64)> = match tx.query_row(
                "SELECT status, attempt_count FROM queue_entries WHERE id = ?1",
                params![entry_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            ) {
                Ok(v) => Some(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };

            let Some((status, attempt_count)) = current else {
                tx.commit()?;
                return Ok(());
            };
            if status == "completed" || status == "failed" {
                // Terminal entries are never mutated again.
                tx.commit()?;
                return Ok(());
            }

            let disposition_str = disposition.to_string();
            if disposition.is_connecting() {
                tx.execute(
                    "UPDATE queue_entries SET status = 'completed', last_disposition = ?2,
                     not_before = NULL WHERE id = ?1",
                    params![entry_id, disposition_str],
                )?;
            } else if disposition == Disposition::Canceled {
                tx.execute(
                    "UPDATE queue_entries SET status = 'queued', last_disposition = ?2,
                     not_before = NULL WHERE id = ?1",
                    params![entry_id, disposition_str],
                )?;
            } else {
                let new_count = attempt_count + 1;
                if new_count >= retry_limit {
                    tx.execute(
                        "UPDATE queue_entries SET status = 'failed', attempt_count = ?2,
                         last_disposition = ?3, not_before = NULL WHERE id = ?1",
                        params![entry_id, new_count, disposition_str],
                    )?;
                } else if cooldown_secs > 0 {
                    tx.execute(
                        "UPDATE queue_entries SET status = 'queued', attempt_count = ?2,
                         last_disposition = ?3,
                         not_before = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+' || ?4 || ' seconds')
                         WHERE id = ?1",
                        params![entry_id, new_count, disposition_str, cooldown_secs as i64],
                    )?;
                } else {
                    tx.execute(
                        "UPDATE queue_entries SET status = 'queued', attempt_count = ?2,
                         last_disposition = ?3, not_before = NULL WHERE id = ?1",
                        params![entry_id, new_count, disposition_str],
                    )?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Orgs that currently have dialable queued entries. Drives the dispatch
/// loop without a static org roster.
pub async fn orgs_with_queued_entries(db: &Database) -> Result<Vec<String>, TurbodialError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT org_id FROM queue_entries
                 WHERE status = 'queued' ORDER BY org_id",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut orgs = Vec::new();
            for row in rows {
                orgs.push(row?);
            }
            Ok(orgs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Per-status entry counts for queue reporting.
pub async fn status_counts(
    db: &Database,
    org_id: &str,
) -> Result<Vec<(String, i64)>, TurbodialError> {
    let org_id = org_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM queue_entries
                 WHERE org_id = ?1 GROUP BY status ORDER BY status",
            )?;
            let rows = stmt.query_map(params![org_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
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

    fn leads(ids: &[&str]) -> Vec<LeadRef> {
        ids.iter()
            .enumerate()
            .map(|(i, s)| LeadRef {
                lead_id: s.to_string(),
                phone: format!("+1555000{i:04}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn enqueue_is_an_idempotent_upsert() {
        let (db, _dir) = setup_db().await;

        enqueue(&db, "org-1", &leads(&["lead-a"]), 5, Some("alice"))
            .await
            .unwrap();
        // Re-adding refreshes priority, does not duplicate.
        enqueue(&db, "org-1", &leads(&["lead-a"]), 9, Some("bob"))
            .await
            .unwrap();

        let batch = next_batch(&db, "org-1", 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].lead_id, "lead-a");
        assert_eq!(batch[0].priority, 9);
        assert_eq!(batch[0].added_by.as_deref(), Some("bob"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reenqueue_of_failed_entry_resets_retry_budget() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["lead-a"]), 0, None)
            .await
            .unwrap();
        let entry = next_batch(&db, "org-1", 1).await.unwrap().remove(0);

        // Exhaust the retry limit.
        for _ in 0..3 {
            mark_outcome(&db, entry.id, Disposition::NoAnswer, 3, 0)
                .await
                .unwrap();
            let _ = next_batch(&db, "org-1", 1).await.unwrap();
        }
        let failed = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(failed.status, QueueStatus::Failed);

        // Explicit re-enqueue re-activates with a fresh budget.
        enqueue(&db, "org-1", &leads(&["lead-a"]), 2, None)
            .await
            .unwrap();
        let revived = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(revived.status, QueueStatus::Queued);
        assert_eq!(revived.attempt_count, 0);
        assert_eq!(revived.priority, 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn next_batch_orders_by_priority_then_age_and_claims_atomically() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["low"]), 1, None).await.unwrap();
        enqueue(&db, "org-1", &leads(&["high"]), 10, None)
            .await
            .unwrap();
        enqueue(&db, "org-1", &leads(&["mid"]), 5, None).await.unwrap();

        let batch = next_batch(&db, "org-1", 2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].lead_id, "high");
        assert_eq!(batch[1].lead_id, "mid");
        assert!(batch.iter().all(|e| e.status == QueueStatus::Dialing));

        // The claimed entries are gone from the queue.
        let rest = next_batch(&db, "org-1", 10).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].lead_id, "low");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_dispatch_cycles_never_share_an_entry() {
        let (db, _dir) = setup_db().await;
        let all: Vec<LeadRef> = (0..20)
            .map(|i| LeadRef {
                lead_id: format!("lead-{i}"),
                phone: format!("+1555100{i:04}"),
            })
            .collect();
        enqueue(&db, "org-1", &all, 0, None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let db = db.clone();
            handles.push(tokio::spawn(
                async move { next_batch(&db, "org-1", 5).await },
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            for entry in handle.await.unwrap().unwrap() {
                assert!(seen.insert(entry.id), "entry {} claimed twice", entry.id);
            }
        }
        assert_eq!(seen.len(), 20);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn in_flight_advance_is_ordered_and_never_demotes() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["lead-a"]), 0, None)
            .await
            .unwrap();
        let entry = next_batch(&db, "org-1", 1).await.unwrap().remove(0);

        assert!(advance_in_flight(&db, entry.id, QueueStatus::Ringing)
            .await
            .unwrap());
        assert!(advance_in_flight(&db, entry.id, QueueStatus::Answered)
            .await
            .unwrap());
        // A late ringing event cannot demote an answered entry.
        assert!(!advance_in_flight(&db, entry.id, QueueStatus::Ringing)
            .await
            .unwrap());
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Answered);

        // Outcomes still settle an in-flight entry.
        mark_outcome(&db, entry.id, Disposition::Connected, 3, 0)
            .await
            .unwrap();
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Completed);
        assert!(!advance_in_flight(&db, entry.id, QueueStatus::Ringing)
            .await
            .unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn retry_bound_fails_entry_at_limit_and_never_retries_again() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["lead-a"]), 0, None)
            .await
            .unwrap();
        let entry = next_batch(&db, "org-1", 1).await.unwrap().remove(0);

        mark_outcome(&db, entry.id, Disposition::NoAnswer, 3, 0)
            .await
            .unwrap();
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Queued);
        assert_eq!(e.attempt_count, 1);

        let _ = next_batch(&db, "org-1", 1).await.unwrap();
        mark_outcome(&db, entry.id, Disposition::NoAnswer, 3, 0)
            .await
            .unwrap();
        let _ = next_batch(&db, "org-1", 1).await.unwrap();
        mark_outcome(&db, entry.id, Disposition::NoAnswer, 3, 0)
            .await
            .unwrap();

        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Failed);
        assert_eq!(e.attempt_count, 3);

        // Terminal entries are sticky: a late disposition changes nothing.
        mark_outcome(&db, entry.id, Disposition::NoAnswer, 3, 0)
            .await
            .unwrap();
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Failed);
        assert_eq!(e.attempt_count, 3);
        assert!(next_batch(&db, "org-1", 1).await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn connecting_disposition_completes_entry() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["lead-a"]), 0, None)
            .await
            .unwrap();
        let entry = next_batch(&db, "org-1", 1).await.unwrap().remove(0);

        mark_outcome(&db, entry.id, Disposition::Connected, 3, 0)
            .await
            .unwrap();
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Completed);
        assert_eq!(e.last_disposition.as_deref(), Some("connected"));
        assert_eq!(e.attempt_count, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sibling_cancellation_requeues_without_consuming_a_retry() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["lead-a"]), 0, None)
            .await
            .unwrap();
        let entry = next_batch(&db, "org-1", 1).await.unwrap().remove(0);

        mark_outcome(&db, entry.id, Disposition::Canceled, 3, 0)
            .await
            .unwrap();
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Queued);
        assert_eq!(e.attempt_count, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn redial_cooldown_hides_entry_from_next_batch() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["lead-a"]), 0, None)
            .await
            .unwrap();
        let entry = next_batch(&db, "org-1", 1).await.unwrap().remove(0);

        mark_outcome(&db, entry.id, Disposition::Busy, 3, 3600)
            .await
            .unwrap();
        let e = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(e.status, QueueStatus::Queued);
        assert!(e.not_before.is_some());

        // Inside the cooldown window the entry is not dialable.
        assert!(next_batch(&db, "org-1", 10).await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_counts_reports_per_status() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-1", &leads(&["a", "b", "c"]), 0, None)
            .await
            .unwrap();
        let _ = next_batch(&db, "org-1", 1).await.unwrap();

        let counts = status_counts(&db, "org-1").await.unwrap();
        let get = |s: &str| {
            counts
                .iter()
                .find(|(status, _)| status == s)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        };
        assert_eq!(get("queued"), 2);
        assert_eq!(get("dialing"), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn orgs_with_queued_entries_skips_drained_orgs() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "org-b", &leads(&["x"]), 0, None).await.unwrap();
        enqueue(&db, "org-a", &leads(&["y"]), 0, None).await.unwrap();

        assert_eq!(
            orgs_with_queued_entries(&db).await.unwrap(),
            vec!["org-a".to_string(), "org-b".to_string()]
        );

        // Draining org-a removes it from the dispatch roster.
        let _ = next_batch(&db, "org-a", 10).await.unwrap();
        assert_eq!(
            orgs_with_queued_entries(&db).await.unwrap(),
            vec!["org-b".to_string()]
        );

        db.close().await.unwrap();
    }
}
