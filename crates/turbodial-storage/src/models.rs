// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `turbodial-core::types` for use across
//! the collaborator trait boundaries. This module re-exports them for
//! convenience within the storage crate.

pub use turbodial_core::types::{
    AttemptStatus, Availability, CallAttempt, Disposition, LeadRef, QueueEntry, QueueStatus,
    RepSession,
};
