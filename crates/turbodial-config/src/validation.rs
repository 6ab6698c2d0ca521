// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation of configuration values.
//!
//! Runs after deserialization succeeds. Collects all validation errors
//! rather than failing on the first, so an operator can fix everything in
//! one pass.

use crate::diagnostic::ConfigError;
use crate::model::TurbodialConfig;

/// Validate semantic constraints on a deserialized configuration.
///
/// Returns all violations found, or an empty vec if the config is valid.
pub fn validate_config(config: &TurbodialConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.dialer.retry_limit < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "dialer.retry_limit must be at least 1, got {}",
                config.dialer.retry_limit
            ),
        });
    }

    if config.dialer.max_batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "dialer.max_batch_size must be at least 1".to_string(),
        });
    }

    // A long pause leaves the answered lead listening to silence; the
    // provider also caps <Pause> length.
    if config.dialer.hold_pause_secs > 30 {
        errors.push(ConfigError::Validation {
            message: format!(
                "dialer.hold_pause_secs must be 30 or less, got {}",
                config.dialer.hold_pause_secs
            ),
        });
    }

    if config.dialer.dispatch_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dialer.dispatch_interval_secs must be at least 1".to_string(),
        });
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    }

    if let Some(url) = &config.gateway.public_base_url
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "gateway.public_base_url must start with http:// or https://, got `{url}`"
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.telephony.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "telephony.base_url must not be empty".to_string(),
        });
    }

    // Signature validation needs the auth token as the HMAC key.
    if config.telephony.validate_signatures && config.telephony.auth_token.is_none() {
        errors.push(ConfigError::Validation {
            message: "telephony.validate_signatures requires telephony.auth_token to be set"
                .to_string(),
        });
    }

    if let Some(caller_id) = &config.telephony.caller_id
        && !caller_id.starts_with('+')
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "telephony.caller_id must be in E.164 format (leading +), got `{caller_id}`"
            ),
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_with_signatures_off() {
        let mut config = TurbodialConfig::default();
        config.telephony.validate_signatures = false;
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn default_config_requires_auth_token_for_signatures() {
        let config = TurbodialConfig::default();
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("auth_token"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = TurbodialConfig::default();
        config.telephony.validate_signatures = false;
        config.dialer.retry_limit = 0;
        config.dialer.max_batch_size = 0;
        config.gateway.host = "  ".to_string();
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_long_hold_pause() {
        let mut config = TurbodialConfig::default();
        config.telephony.validate_signatures = false;
        config.dialer.hold_pause_secs = 120;
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("hold_pause_secs"));
    }

    #[test]
    fn rejects_non_e164_caller_id() {
        let mut config = TurbodialConfig::default();
        config.telephony.validate_signatures = false;
        config.telephony.caller_id = Some("5551234567".to_string());
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("caller_id"));
    }

    #[test]
    fn rejects_bare_public_base_url() {
        let mut config = TurbodialConfig::default();
        config.telephony.validate_signatures = false;
        config.gateway.public_base_url = Some("dialer.example.com".to_string());
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("public_base_url"));
    }
}
