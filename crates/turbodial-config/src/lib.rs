// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Turbodial dispatch engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and miette diagnostic rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use turbodial_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Service: {}", config.service.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    DialerConfig, GatewayConfig, ServiceConfig, StorageConfig, TelephonyConfig, TurbodialConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to miette diagnostics with typo suggestions
///
/// Returns either a valid `TurbodialConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<TurbodialConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            let errors = validation::validate_config(&config);
            if errors.is_empty() {
                Ok(config)
            } else {
                Err(errors)
            }
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<TurbodialConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            let errors = validation::validate_config(&config);
            if errors.is_empty() {
                Ok(config)
            } else {
                Err(errors)
            }
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a specific file path and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<TurbodialConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            let errors = validation::validate_config(&config);
            if errors.is_empty() {
                Ok(config)
            } else {
                Err(errors)
            }
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
