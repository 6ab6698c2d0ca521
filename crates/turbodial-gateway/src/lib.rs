// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Turbodial dispatch engine.
//!
//! Exposes the CRM-facing queue API and rep pool routes under `/v1`
//! (bearer-token auth), the telephony provider's webhook endpoints under
//! `/hooks` (signature auth), and an unauthenticated `/health` probe.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhooks;

pub use auth::AuthConfig;
pub use server::{GatewayState, ServerConfig, SignatureConfig, build_router, start_server};
