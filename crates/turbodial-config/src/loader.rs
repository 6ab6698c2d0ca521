// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./turbodial.toml` > `~/.config/turbodial/turbodial.toml`
//! > `/etc/turbodial/turbodial.toml` with environment variable overrides via
//! the `TURBODIAL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TurbodialConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/turbodial/turbodial.toml` (system-wide)
/// 3. `~/.config/turbodial/turbodial.toml` (user XDG config)
/// 4. `./turbodial.toml` (local directory)
/// 5. `TURBODIAL_*` environment variables
pub fn load_config() -> Result<TurbodialConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurbodialConfig::default()))
        .merge(Toml::file("/etc/turbodial/turbodial.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("turbodial/turbodial.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("turbodial.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and for callers that already hold the config text.
pub fn load_config_from_str(toml_content: &str) -> Result<TurbodialConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurbodialConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TurbodialConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurbodialConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TURBODIAL_TELEPHONY_AUTH_TOKEN` must
/// map to `telephony.auth_token`, not `telephony.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("TURBODIAL_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: TURBODIAL_TELEPHONY_AUTH_TOKEN -> "telephony_auth_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("dialer_", "dialer.", 1)
            .replacen("telephony_", "telephony.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
