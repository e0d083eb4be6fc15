// Config loading, validation and environment override tests

use mondash::config::{AppConfig, DEFAULT_AUTH_TOKEN, StorageBackend};
use std::collections::HashMap;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[server]
port = 8080
host = "0.0.0.0"

[storage]
backend = "sqlite"
path = "data/mondash.db"
max_pool_size = 4

[monitoring]
scan_interval_secs = 5
notify_timeout_secs = 10

[email]
enabled = true
smtp_host = "smtp.example.org"
smtp_port = 587
smtp_user = "mondash"
smtp_pass = "secret"
smtp_from = "mondash@example.org"

[auth]
token = "s3cret"
"#;

const MINIMAL_CONFIG: &str = r#"
[server]
port = 8080
host = "127.0.0.1"
"#;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(config.storage.path, "data/mondash.db");
    assert_eq!(config.storage.max_pool_size, 4);
    assert_eq!(config.monitoring.scan_interval(), Duration::from_secs(5));
    assert_eq!(config.monitoring.notify_timeout(), Duration::from_secs(10));
    assert!(config.email.enabled);
    assert_eq!(config.email.smtp_port, Some(587));
    assert_eq!(config.email.smtp_from, "mondash@example.org");
}

#[test]
fn test_config_defaults() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).expect("load_from_str");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.monitoring.scan_interval_secs, 5);
    assert_eq!(config.monitoring.notify_timeout_secs, 10);
    assert!(!config.email.enabled);
    assert_eq!(config.email.smtp_port, None);
    assert_eq!(config.auth.token, DEFAULT_AUTH_TOKEN);
}

#[test]
fn test_config_reads_auth_token() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    assert_eq!(config.auth.token, "s3cret");
}

#[test]
fn test_config_validation_rejects_empty_auth_token() {
    let bad = VALID_CONFIG.replace("token = \"s3cret\"", "token = \" \"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("auth.token"));
}

#[test]
fn test_env_overrides_auth_token() {
    let mut config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    config
        .apply_env_overrides(env(&[("AUTH_TOKEN", " from-env ")]))
        .unwrap();
    assert_eq!(config.auth.token, "from-env");
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8080", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_sqlite_path() {
    let bad = VALID_CONFIG.replace("path = \"data/mondash.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("storage.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 4", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_scan_interval_zero() {
    let bad = VALID_CONFIG.replace("scan_interval_secs = 5", "scan_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("scan_interval_secs"));
}

#[test]
fn test_config_validation_rejects_notify_timeout_zero() {
    let bad = VALID_CONFIG.replace("notify_timeout_secs = 10", "notify_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("notify_timeout_secs"));
}

#[test]
fn test_config_rejects_unknown_backend() {
    let bad = VALID_CONFIG.replace("backend = \"sqlite\"", "backend = \"mongo\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_env_overrides_email_settings() {
    let mut config = AppConfig::load_from_str(MINIMAL_CONFIG).unwrap();
    config
        .apply_env_overrides(env(&[
            ("EMAIL_ON_ALERT", "TRUE"),
            ("SMTP_HOST", "mail.local"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USERNAME", "u"),
            ("SMTP_PASSWORD", "p"),
            ("SMTP_FROM", "alerts@mail.local"),
            ("SCAN_INTERVAL_SECS", "30"),
        ]))
        .unwrap();
    assert!(config.email.enabled);
    assert_eq!(config.email.smtp_host, "mail.local");
    assert_eq!(config.email.smtp_port, Some(2525));
    assert_eq!(config.email.smtp_user, "u");
    assert_eq!(config.email.smtp_pass, "p");
    assert_eq!(config.email.smtp_from, "alerts@mail.local");
    assert_eq!(config.monitoring.scan_interval_secs, 30);
}

#[test]
fn test_env_email_flag_other_than_true_disables() {
    let mut config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    config
        .apply_env_overrides(env(&[("EMAIL_ON_ALERT", "yes"), ("SMTP_PORT", "")]))
        .unwrap();
    assert!(!config.email.enabled);
    assert_eq!(config.email.smtp_port, None);
}

#[test]
fn test_env_rejects_bad_port() {
    let mut config = AppConfig::load_from_str(MINIMAL_CONFIG).unwrap();
    let err = config
        .apply_env_overrides(env(&[("SMTP_PORT", "smtp")]))
        .unwrap_err();
    assert!(err.to_string().contains("SMTP_PORT"));
}

#[test]
fn test_env_without_overrides_keeps_file_values() {
    let mut config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    config.apply_env_overrides(env(&[])).unwrap();
    assert!(config.email.enabled);
    assert_eq!(config.email.smtp_host, "smtp.example.org");
}
