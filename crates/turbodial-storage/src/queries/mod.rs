// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the queue store, call attempts, and the rep pool.
//!
//! Every mutation here is either a true atomic conditional update or an
//! explicit idempotency check, because webhook delivery is at-least-once.

pub mod attempts;
pub mod queue;
pub mod reps;

/// Parse a stored enum column, converting parse failures into a rusqlite
/// conversion error carrying the column index.
pub(crate) fn parse_enum<T>(idx: usize, value: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
