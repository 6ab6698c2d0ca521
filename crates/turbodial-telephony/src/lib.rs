// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony provider integration for the Turbodial dispatch engine.
//!
//! Covers the three surfaces the engine touches the provider through:
//! the REST client for originating and steering calls ([`client`]), the
//! webhook payloads the provider posts back ([`types`]), and the
//! call-control XML the gateway answers webhooks with ([`twiml`]).
//! Webhook authenticity is checked by [`signature`].

pub mod client;
pub mod signature;
pub mod twiml;
pub mod types;

pub use client::ProviderClient;
pub use types::{AnswerCallback, ConferenceCallback, RecordingCallback, StatusCallback};
