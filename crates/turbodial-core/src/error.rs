// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Turbodial dispatch engine.

use thiserror::Error;

/// The primary error type used across all Turbodial crates.
///
/// Expected control-flow outcomes are NOT errors: a claim returning no
/// available rep and a machine-detection result are ordinary return values
/// handled by the answer flow, never surfaced through this type.
#[derive(Debug, Error)]
pub enum TurbodialError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Telephony provider errors (dial rejected, cancel failed, HTTP failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A webhook referenced a call handle with no tracked call attempt.
    ///
    /// Always acknowledged and dropped, never propagated to the provider.
    #[error("untracked callback for call handle {call_handle}")]
    UntrackedCallback { call_handle: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
