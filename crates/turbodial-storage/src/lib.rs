// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Turbodial dispatch engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and the atomic
//! conditional updates the dispatch engine's correctness rests on: the
//! rep-pool compare-and-set claim, the batch claim in the queue store, and
//! sticky terminal call-attempt transitions.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
