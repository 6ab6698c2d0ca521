// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony provider seam: outbound REST calls consumed by the engine.
//!
//! Bridging into a conference and voicemail recording are expressed as
//! response documents returned from the answer webhook, so they do not
//! appear here; this trait covers only the provider's REST surface.

use async_trait::async_trait;

use crate::error::TurbodialError;

/// Parameters for placing one outbound call.
#[derive(Debug, Clone)]
pub struct PlaceCallRequest {
    /// Lead phone number in E.164 form.
    pub to: String,
    /// Caller ID presented to the lead.
    pub from: String,
    /// Webhook invoked when the call is answered (machine detection attached).
    pub answer_url: String,
    /// Webhook receiving call-status lifecycle events.
    pub status_url: String,
    /// Enable answering-machine detection for this dial.
    pub machine_detection: bool,
}

/// Outbound operations consumed from the telephony provider.
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Place an outbound call. Returns the provider-assigned call handle.
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<String, TurbodialError>;

    /// Cancel a still-ringing call. Canceling a call that already ended on
    /// its own may fail; callers treat that as best-effort.
    async fn cancel_call(&self, call_handle: &str) -> Result<(), TurbodialError>;
}
