// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Turbodial configuration system.

use turbodial_config::diagnostic::suggest_key;
use turbodial_config::{ConfigError, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_turbodial_config() {
    let toml = r#"
[service]
name = "turbodial-test"
log_level = "debug"

[dialer]
retry_limit = 5
fanout_slack = 3
max_batch_size = 8
hold_pause_secs = 4
redial_cooldown_secs = 300
dispatch_interval_secs = 10

[telephony]
account_sid = "AC0000"
auth_token = "secret"
caller_id = "+15551230000"
base_url = "https://api.example.test/2010-04-01"
validate_signatures = true

[gateway]
host = "0.0.0.0"
port = 9000
public_base_url = "https://dialer.example.com"
bearer_token = "hunter2"

[storage]
database_path = "/tmp/test.db"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "turbodial-test");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.dialer.retry_limit, 5);
    assert_eq!(config.dialer.fanout_slack, 3);
    assert_eq!(config.dialer.max_batch_size, 8);
    assert_eq!(config.dialer.hold_pause_secs, 4);
    assert_eq!(config.dialer.redial_cooldown_secs, 300);
    assert_eq!(config.dialer.dispatch_interval_secs, 10);
    assert_eq!(config.telephony.account_sid.as_deref(), Some("AC0000"));
    assert_eq!(config.telephony.auth_token.as_deref(), Some("secret"));
    assert_eq!(config.telephony.caller_id.as_deref(), Some("+15551230000"));
    assert!(config.telephony.validate_signatures);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(
        config.gateway.public_base_url.as_deref(),
        Some("https://dialer.example.com")
    );
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("hunter2"));
    assert_eq!(config.storage.database_path, "/tmp/test.db");
}

/// Unknown field in [dialer] section produces an error.
#[test]
fn unknown_field_in_dialer_produces_error() {
    let toml = r#"
[dialer]
retry_limt = 2
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    // Figment wraps serde's deny_unknown_fields error
    assert!(
        err_str.contains("unknown field") || err_str.contains("retry_limt"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let toml = "";
    let config = load_config_from_str(toml).expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "turbodial");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.dialer.retry_limit, 3);
    assert_eq!(config.dialer.fanout_slack, 2);
    assert_eq!(config.dialer.max_batch_size, 10);
    assert_eq!(config.dialer.hold_pause_secs, 5);
    assert_eq!(config.dialer.redial_cooldown_secs, 0);
    assert_eq!(config.dialer.dispatch_interval_secs, 15);
    assert!(config.telephony.account_sid.is_none());
    assert!(config.telephony.auth_token.is_none());
    assert!(config.telephony.validate_signatures);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8583);
    assert!(config.gateway.bearer_token.is_none());
}

/// Environment variable TURBODIAL_DIALER_RETRY_LIMIT overrides dialer.retry_limit.
#[test]
fn env_var_mapping_handles_multi_underscore_keys() {
    // We test this via the Figment builder directly to control env vars in test
    use figment::{
        Figment, Jail,
        providers::{Format, Serialized, Toml},
    };
    use turbodial_config::TurbodialConfig;

    Jail::expect_with(|jail| {
        jail.set_env("TURBODIAL_TELEPHONY_AUTH_TOKEN", "from-env");
        jail.set_env("TURBODIAL_DIALER_RETRY_LIMIT", "7");

        let config: TurbodialConfig = Figment::new()
            .merge(Serialized::defaults(TurbodialConfig::default()))
            .merge(Toml::string("[dialer]\nretry_limit = 2\n"))
            .merge(
                figment::providers::Env::prefixed("TURBODIAL_").map(|key| {
                    key.as_str()
                        .replacen("dialer_", "dialer.", 1)
                        .replacen("telephony_", "telephony.", 1)
                        .into()
                }),
            )
            .extract()?;

        // auth_token contains an underscore and must not be split further
        assert_eq!(config.telephony.auth_token.as_deref(), Some("from-env"));
        assert_eq!(config.dialer.retry_limit, 7);
        Ok(())
    });
}

/// Validation rejects a zero retry limit even when the TOML parses.
#[test]
fn validation_rejects_zero_retry_limit() {
    let toml = r#"
[dialer]
retry_limit = 0

[telephony]
validate_signatures = false
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
    assert!(errors[0].to_string().contains("retry_limit"));
}

/// Signature validation without an auth token is a config error.
#[test]
fn validation_requires_auth_token_when_signatures_enabled() {
    let toml = r#"
[telephony]
validate_signatures = true
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.iter().any(|e| e.to_string().contains("auth_token")));
}

/// Typo suggestions point at the intended key.
#[test]
fn suggest_key_recovers_intended_field() {
    let valid = [
        "retry_limit",
        "fanout_slack",
        "max_batch_size",
        "hold_pause_secs",
        "redial_cooldown_secs",
        "dispatch_interval_secs",
    ];
    assert_eq!(
        suggest_key("max_bach_size", &valid).as_deref(),
        Some("max_batch_size")
    );
    assert_eq!(
        suggest_key("redial_cooldown", &valid).as_deref(),
        Some("redial_cooldown_secs")
    );
}
