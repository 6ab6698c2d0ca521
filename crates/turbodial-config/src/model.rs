// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Turbodial dispatch engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Turbodial configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values except the telephony credentials, which are validated at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TurbodialConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Dialing policy: retry limits, fan-out, hold and cooldown windows.
    #[serde(default)]
    pub dialer: DialerConfig,

    /// Telephony provider credentials and webhook settings.
    #[serde(default)]
    pub telephony: TelephonyConfig,

    /// HTTP gateway settings (webhooks + CRM-facing API).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "turbodial".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dialing policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialerConfig {
    /// Retryable dispositions re-queue an entry until it has been attempted
    /// this many times, after which it fails permanently.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: i64,

    /// Extra dials beyond the available-rep count in one batch, absorbing
    /// expected no-answers.
    #[serde(default = "default_fanout_slack")]
    pub fanout_slack: usize,

    /// Hard cap on simultaneous dials per dispatch cycle.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Pause length (seconds) before the single hold-and-retry claim when
    /// no rep is available. Kept short so the lead never hears dead air.
    #[serde(default = "default_hold_pause_secs")]
    pub hold_pause_secs: u64,

    /// Cooldown (seconds) before a retryable entry may be re-dialed.
    /// Zero means immediate re-dial.
    #[serde(default)]
    pub redial_cooldown_secs: u64,

    /// Interval (seconds) between dispatch cycles.
    #[serde(default = "default_dispatch_interval_secs")]
    pub dispatch_interval_secs: u64,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            fanout_slack: default_fanout_slack(),
            max_batch_size: default_max_batch_size(),
            hold_pause_secs: default_hold_pause_secs(),
            redial_cooldown_secs: 0,
            dispatch_interval_secs: default_dispatch_interval_secs(),
        }
    }
}

fn default_retry_limit() -> i64 {
    3
}

fn default_fanout_slack() -> usize {
    2
}

fn default_max_batch_size() -> usize {
    10
}

fn default_hold_pause_secs() -> u64 {
    5
}

fn default_dispatch_interval_secs() -> u64 {
    15
}

/// Telephony provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelephonyConfig {
    /// Provider account identifier.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Provider auth token, also the webhook signature key.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Caller ID presented on outbound dials (E.164).
    #[serde(default)]
    pub caller_id: Option<String>,

    /// Provider REST API base URL. Overridable for testing.
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Validate `X-Provider-Signature` on inbound webhooks.
    #[serde(default = "default_validate_signatures")]
    pub validate_signatures: bool,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            caller_id: None,
            base_url: default_provider_base_url(),
            validate_signatures: default_validate_signatures(),
        }
    }
}

fn default_provider_base_url() -> String {
    "https://api.telephony.example/2010-04-01".to_string()
}

fn default_validate_signatures() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Externally reachable base URL the provider uses to call back into
    /// the gateway (webhook URLs are derived from it).
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Bearer token protecting the CRM-facing API (None = auth disabled,
    /// local use only).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            public_base_url: None,
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8583
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("turbodial").join("turbodial.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("turbodial.db"))
        .to_string_lossy()
        .into_owned()
}
