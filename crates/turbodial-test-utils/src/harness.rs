// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a temp SQLite database with mock collaborators.

use std::sync::Arc;

use tempfile::TempDir;

use turbodial_storage::Database;

use crate::mock_crm::MockCrm;
use crate::mock_telephony::MockTelephony;

/// A complete in-memory test environment: temp database plus mock
/// telephony and CRM collaborators.
///
/// The temp directory is owned by the harness, so the database lives
/// until the harness drops.
pub struct TestHarness {
    pub db: Database,
    pub telephony: Arc<MockTelephony>,
    pub crm: Arc<MockCrm>,
    _dir: TempDir,
}

impl TestHarness {
    /// Create a fresh harness with an empty, fully-migrated database.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("turbodial-test.db");
        let db = Database::open(db_path.to_str().expect("utf-8 temp path"))
            .await
            .expect("open test database");

        Self {
            db,
            telephony: Arc::new(MockTelephony::new()),
            crm: Arc::new(MockCrm::new()),
            _dir: dir,
        }
    }
}
