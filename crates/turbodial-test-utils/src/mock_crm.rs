// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock CRM hooks for deterministic testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use turbodial_core::{CrmCallRecord, CrmHooks, TurbodialError};

/// An owner assignment captured by the mock CRM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerAssignment {
    pub org_id: String,
    pub lead_id: String,
    pub rep_id: String,
}

/// Mock CRM that records every handoff it receives.
#[derive(Default)]
pub struct MockCrm {
    assignments: Arc<Mutex<Vec<OwnerAssignment>>>,
    call_records: Arc<Mutex<Vec<CrmCallRecord>>>,
}

impl MockCrm {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lead-ownership assignments seen so far.
    pub async fn assignments(&self) -> Vec<OwnerAssignment> {
        self.assignments.lock().await.clone()
    }

    /// All CRM call records seen so far.
    pub async fn call_records(&self) -> Vec<CrmCallRecord> {
        self.call_records.lock().await.clone()
    }
}

#[async_trait]
impl CrmHooks for MockCrm {
    async fn assign_lead_owner(
        &self,
        org_id: &str,
        lead_id: &str,
        rep_id: &str,
    ) -> Result<(), TurbodialError> {
        self.assignments.lock().await.push(OwnerAssignment {
            org_id: org_id.to_string(),
            lead_id: lead_id.to_string(),
            rep_id: rep_id.to_string(),
        });
        Ok(())
    }

    async fn record_call(&self, record: &CrmCallRecord) -> Result<(), TurbodialError> {
        self.call_records.lock().await.push(record.clone());
        Ok(())
    }
}
