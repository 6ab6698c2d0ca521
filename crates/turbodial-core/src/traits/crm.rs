// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM collaborator seam: outbound calls made on a successful connect.
//!
//! The CRM itself (lead store, email, documents) is an external system.
//! The engine only hands off ownership and records the call.

use async_trait::async_trait;

use crate::error::TurbodialError;

/// A CRM call record created when a lead is bridged to a rep.
#[derive(Debug, Clone)]
pub struct CrmCallRecord {
    pub org_id: String,
    pub lead_id: String,
    pub rep_id: String,
    pub call_handle: String,
    pub conference_name: String,
    pub connected_at: String,
}

/// Outbound hooks into the surrounding CRM, invoked after a rep claim succeeds.
#[async_trait]
pub trait CrmHooks: Send + Sync {
    /// Assign ownership of the lead to the rep who took the call.
    async fn assign_lead_owner(
        &self,
        org_id: &str,
        lead_id: &str,
        rep_id: &str,
    ) -> Result<(), TurbodialError>;

    /// Record the call in the CRM activity log.
    async fn record_call(&self, record: &CrmCallRecord) -> Result<(), TurbodialError>;
}

/// No-op CRM hooks for deployments without a CRM callback configured.
///
/// Logs the handoff at debug level and succeeds.
#[derive(Debug, Default, Clone)]
pub struct NoopCrmHooks;

#[async_trait]
impl CrmHooks for NoopCrmHooks {
    async fn assign_lead_owner(
        &self,
        org_id: &str,
        lead_id: &str,
        rep_id: &str,
    ) -> Result<(), TurbodialError> {
        tracing::debug!(org_id, lead_id, rep_id, "noop CRM: assign lead owner");
        Ok(())
    }

    async fn record_call(&self, record: &CrmCallRecord) -> Result<(), TurbodialError> {
        tracing::debug!(
            lead_id = %record.lead_id,
            rep_id = %record.rep_id,
            call_handle = %record.call_handle,
            "noop CRM: record call"
        );
        Ok(())
    }
}
