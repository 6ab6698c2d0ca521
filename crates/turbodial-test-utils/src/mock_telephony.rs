// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock telephony provider for deterministic testing.
//!
//! `MockTelephony` implements `TelephonyProvider` entirely in memory,
//! recording every call it is asked to place or cancel and handing out
//! sequential call handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use turbodial_core::{PlaceCallRequest, TelephonyProvider, TurbodialError};

/// A mock telephony provider that records operations in memory.
///
/// Handles are sequential (`CA-mock-1`, `CA-mock-2`, ...) so tests can
/// correlate placed calls with attempts deterministically.
#[derive(Default)]
pub struct MockTelephony {
    next_handle: AtomicU64,
    fail_place: AtomicBool,
    fail_cancel: AtomicBool,
    placed: Arc<Mutex<Vec<PlaceCallRequest>>>,
    canceled: Arc<Mutex<Vec<String>>>,
}

impl MockTelephony {
    /// Create a new mock provider with no recorded operations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `place_call` invocations fail.
    pub fn fail_next_placements(&self, fail: bool) {
        self.fail_place.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `cancel_call` invocations fail, emulating siblings
    /// that already ended on their own.
    pub fn fail_cancellations(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    /// All place-call requests seen so far.
    pub async fn placed(&self) -> Vec<PlaceCallRequest> {
        self.placed.lock().await.clone()
    }

    /// All call handles asked to cancel so far.
    pub async fn canceled(&self) -> Vec<String> {
        self.canceled.lock().await.clone()
    }
}

#[async_trait]
impl TelephonyProvider for MockTelephony {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<String, TurbodialError> {
        if self.fail_place.load(Ordering::SeqCst) {
            return Err(TurbodialError::Provider {
                message: "mock placement failure".to_string(),
                source: None,
            });
        }
        let n = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.placed.lock().await.push(request.clone());
        Ok(format!("CA-mock-{n}"))
    }

    async fn cancel_call(&self, call_handle: &str) -> Result<(), TurbodialError> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(TurbodialError::Provider {
                message: format!("mock cancel failure for {call_handle}"),
                source: None,
            });
        }
        self.canceled.lock().await.push(call_handle.to_string());
        Ok(())
    }
}
