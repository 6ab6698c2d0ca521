// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch engine: shared state for every call-coordination path.
//!
//! One `DialerEngine` is built at startup and shared (via `Arc`) between
//! the dispatch loop and the webhook handlers. It owns no mutable state of
//! its own; all coordination state lives in the database, which is what
//! makes the concurrent webhook handlers safe without in-process locking.

use std::sync::Arc;

use turbodial_config::DialerConfig;
use turbodial_core::{CrmHooks, TelephonyProvider};
use turbodial_storage::Database;

/// Shared engine state for dispatch, answer, lifecycle, and voicemail
/// handling.
pub struct DialerEngine {
    pub(crate) db: Database,
    pub(crate) provider: Arc<dyn TelephonyProvider>,
    pub(crate) crm: Arc<dyn CrmHooks>,
    pub(crate) config: DialerConfig,
    pub(crate) caller_id: String,
    answer_url: String,
    status_url: String,
    conference_url: String,
    recording_url: String,
}

impl DialerEngine {
    /// Assemble the engine.
    ///
    /// `public_base_url` is the externally reachable gateway base the
    /// provider calls back into; webhook URLs are derived from it.
    pub fn new(
        db: Database,
        provider: Arc<dyn TelephonyProvider>,
        crm: Arc<dyn CrmHooks>,
        config: DialerConfig,
        caller_id: String,
        public_base_url: &str,
    ) -> Self {
        let base = public_base_url.trim_end_matches('/');
        Self {
            db,
            provider,
            crm,
            config,
            caller_id,
            answer_url: format!("{base}/hooks/answer"),
            status_url: format!("{base}/hooks/status"),
            conference_url: format!("{base}/hooks/conference"),
            recording_url: format!("{base}/hooks/recording"),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Webhook invoked when a placed call is answered.
    pub fn answer_url(&self) -> &str {
        &self.answer_url
    }

    /// Webhook receiving call-status lifecycle events.
    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    /// Webhook receiving conference membership events.
    pub fn conference_url(&self) -> &str {
        &self.conference_url
    }

    /// Webhook receiving recording and transcription completions.
    pub fn recording_url(&self) -> &str {
        &self.recording_url
    }
}
