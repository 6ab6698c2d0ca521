// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Turbodial integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic,
//! CI-runnable tests without a telephony provider or CRM.
//!
//! # Components
//!
//! - [`MockTelephony`] - Records placed/canceled calls in memory
//! - [`MockCrm`] - Records lead-ownership handoffs and call records
//! - [`TestHarness`] - Temp SQLite database wired to both mocks

pub mod harness;
pub mod mock_crm;
pub mod mock_telephony;

pub use harness::TestHarness;
pub use mock_crm::{MockCrm, OwnerAssignment};
pub use mock_telephony::MockTelephony;
