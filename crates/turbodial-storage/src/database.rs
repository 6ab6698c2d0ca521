// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes: the
//! atomicity of the claim operations depends on the single-writer model.

use turbodial_core::TurbodialError;

use crate::migrations;

/// Handle to the SQLite database backing all engine state.
///
/// Cloneable; all clones share the one background writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, TurbodialError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::from(e)))?;

        conn.call(|conn| {
            let map = |e: rusqlite::Error| TurbodialError::Storage {
                source: Box::new(e),
            };
            conn.pragma_update(None, "journal_mode", "WAL").map_err(map)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(map)?;
            conn.pragma_update(None, "foreign_keys", "ON").map_err(map)?;
            conn.pragma_update(None, "busy_timeout", 5000).map_err(map)?;
            migrations::run_migrations(conn).map_err(|e| TurbodialError::Storage {
                source: Box::new(e),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(e) => e,
            e => TurbodialError::Storage {
                source: Box::new(e),
            },
        })?;

        Ok(Self { conn })
    }

    /// Access the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the database, flushing pending writes.
    pub async fn close(self) -> Result<(), TurbodialError> {
        self.conn
            .close()
            .await
            .map_err(|e| TurbodialError::Storage {
                source: Box::new(e),
            })
    }
}

/// Map a tokio-rusqlite error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> TurbodialError {
    TurbodialError::Storage {
        source: Box::new(e),
    }
}
