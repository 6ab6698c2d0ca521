// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Turbodial outbound call dispatch engine.
//!
//! This crate provides the foundational trait definitions, error type, and
//! domain types used throughout the Turbodial workspace. The telephony
//! provider and CRM collaborators implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TurbodialError;
pub use types::{
    AttemptStatus, Availability, CallAttempt, Disposition, LeadRef, MachineDetection, QueueEntry,
    QueueStatus, RepSession,
};

// Re-export the collaborator traits at crate root.
pub use traits::{CrmCallRecord, CrmHooks, NoopCrmHooks, PlaceCallRequest, TelephonyProvider};
