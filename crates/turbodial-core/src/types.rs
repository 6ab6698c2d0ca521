// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Turbodial workspace.
//!
//! Status enums round-trip through their snake_case string form, which is
//! also the representation stored in SQLite and reported over the API.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a queue entry (one lead awaiting/undergoing dialing).
///
/// Busy and no-answer outcomes are dispositions, not entry states: they
/// either requeue the entry or fail it, and the detail lands in
/// `last_disposition`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Dialing,
    Ringing,
    Answered,
    Completed,
    Failed,
}

impl QueueStatus {
    /// Terminal entries are never mutated again except by explicit re-enqueue.
    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Failed)
    }
}

/// Lifecycle status of a single outbound dial.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Dialing,
    Ringing,
    Answered,
    Machine,
    Holding,
    Connected,
    Completed,
    Busy,
    NoAnswer,
    Failed,
    Canceled,
}

impl AttemptStatus {
    /// Terminal statuses are sticky: a terminal attempt rejects any
    /// subsequent status update.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AttemptStatus::Completed
                | AttemptStatus::Busy
                | AttemptStatus::NoAnswer
                | AttemptStatus::Failed
                | AttemptStatus::Canceled
        )
    }

    /// Pre-answer statuses are the ones eligible for batch-sibling cancellation.
    pub fn is_pre_answer(self) -> bool {
        matches!(self, AttemptStatus::Dialing | AttemptStatus::Ringing)
    }
}

/// Claim state of a rep dialing session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Claimed,
}

/// Final disposition of a call attempt, as applied to its queue entry.
///
/// Retryable dispositions send the entry back to `queued` until the retry
/// limit is reached; connecting dispositions complete the entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// A human answered and was bridged to a rep.
    Connected,
    /// An answering machine or fax picked up. Treated as handled.
    Machine,
    /// The lead answered and was sent to voicemail recording. Treated as handled.
    Voicemail,
    Busy,
    NoAnswer,
    Failed,
    /// Batch sibling canceled after another call won the first answer.
    /// Requeued without consuming a retry attempt.
    Canceled,
}

impl Disposition {
    /// Whether this disposition counts against the retry limit.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Disposition::Busy | Disposition::NoAnswer | Disposition::Failed
        )
    }

    /// Whether this disposition completes the queue entry.
    pub fn is_connecting(self) -> bool {
        matches!(
            self,
            Disposition::Connected | Disposition::Machine | Disposition::Voicemail
        )
    }
}

/// Machine-detection classification attached to an answered call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MachineDetection {
    Human,
    Machine,
    Fax,
    Unknown,
}

impl MachineDetection {
    /// Parse a provider `AnsweredBy` value. Absent or unrecognized values
    /// are treated as human so a detection hiccup never strands a live lead.
    pub fn from_provider(answered_by: Option<&str>) -> Self {
        match answered_by {
            Some(s) if s.starts_with("machine") => MachineDetection::Machine,
            Some("fax") => MachineDetection::Fax,
            Some("human") => MachineDetection::Human,
            Some("unknown") => MachineDetection::Unknown,
            _ => MachineDetection::Human,
        }
    }

    /// Whether this classification bypasses the rep claim entirely.
    pub fn is_machine(self) -> bool {
        matches!(self, MachineDetection::Machine | MachineDetection::Fax)
    }
}

/// A lead reference handed over by the CRM at enqueue time.
///
/// The lead store itself lives in the CRM; the queue only carries the id
/// and the number to dial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRef {
    pub lead_id: String,
    /// Phone number in E.164 form.
    pub phone: String,
}

/// One row per lead awaiting or undergoing dialing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub org_id: String,
    pub lead_id: String,
    /// Number to dial, captured from the CRM at enqueue time.
    pub phone: String,
    /// Higher priority dials sooner; ties break oldest-first.
    pub priority: i64,
    pub status: QueueStatus,
    pub added_at: String,
    pub added_by: Option<String>,
    pub last_attempt_at: Option<String>,
    pub last_disposition: Option<String>,
    pub attempt_count: i64,
    /// Earliest time the entry may be dialed again (redial cooldown).
    pub not_before: Option<String>,
}

/// One row per individual outbound dial. A queue entry may spawn several
/// attempts over its retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAttempt {
    /// Opaque id assigned by the telephony provider; primary correlation
    /// key for all webhook lookups.
    pub call_handle: String,
    pub queue_entry_id: i64,
    pub org_id: String,
    pub lead_id: String,
    pub batch_id: String,
    pub status: AttemptStatus,
    pub caller_id: Option<String>,
    pub assigned_rep_id: Option<String>,
    pub session_id: Option<String>,
    pub conference_name: Option<String>,
    /// At most one attempt per batch ever carries this flag.
    pub is_first_answer: bool,
    pub ringing_at: Option<String>,
    pub answered_at: Option<String>,
    pub connected_at: Option<String>,
    pub ended_at: Option<String>,
    pub recording_url: Option<String>,
    pub voicemail_url: Option<String>,
    pub voicemail_transcription: Option<String>,
}

/// One row per rep currently logged into the dialing pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepSession {
    pub session_id: String,
    pub rep_id: String,
    pub org_id: String,
    pub availability: Availability,
    /// Non-null iff the session is claimed.
    pub conference_name: Option<String>,
    pub claimed_at: Option<String>,
    /// Monotonic counter of calls with non-zero talk time.
    pub connected_call_count: i64,
}
