// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the engine's external collaborator seams.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch so the engine can
//! run against the real provider/CRM in production and mocks in tests.

pub mod crm;
pub mod telephony;

pub use crm::{CrmCallRecord, CrmHooks, NoopCrmHooks};
pub use telephony::{PlaceCallRequest, TelephonyProvider};
