//! Settings resolution tests
//!
//! Serial because they mutate process environment variables.

use serial_test::serial;
use shelfwatch_common::config::{Overrides, Settings, DEFAULT_LOOKUP_BASE_URL, DEFAULT_SYSTEM_ID};
use std::io::Write;
use std::time::Duration;

const ENV_VARS: &[&str] = &[
    "SHELFWATCH_WISHLIST_ID",
    "SHELFWATCH_LOOKUP_APPKEY",
    "SHELFWATCH_SYSTEM_ID",
    "SHELFWATCH_LOOKUP_URL",
    "SHELFWATCH_DATABASE",
    "SHELFWATCH_REPORT_LOG",
    "SHELFWATCH_COLLECTOR_CMD",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn required_overrides() -> Overrides {
    Overrides {
        wishlist_id: Some("WL1".to_string()),
        lookup_appkey: Some("key-1".to_string()),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_missing_wishlist_id_fails_with_instructions() {
    clear_env();

    let err = Settings::resolve(&Overrides::default(), None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("SHELFWATCH_WISHLIST_ID"));
    assert!(message.contains("--wishlist-id"));
}

#[test]
#[serial]
fn test_missing_appkey_fails_with_instructions() {
    clear_env();
    std::env::set_var("SHELFWATCH_WISHLIST_ID", "WL1");

    let err = Settings::resolve(&Overrides::default(), None).unwrap_err();
    assert!(err.to_string().contains("SHELFWATCH_LOOKUP_APPKEY"));

    clear_env();
}

#[test]
#[serial]
fn test_defaults_applied() {
    clear_env();

    let settings = Settings::resolve(&required_overrides(), None).unwrap();

    assert_eq!(settings.lookup_system_id, DEFAULT_SYSTEM_ID);
    assert_eq!(settings.lookup_base_url, DEFAULT_LOOKUP_BASE_URL);
    assert_eq!(settings.pending_retry_delay, Duration::from_secs(5));
    assert_eq!(settings.max_pending_retries, 3);
    assert_eq!(settings.dispatch_pacing, Duration::from_secs(5));
    assert_eq!(settings.max_concurrency, 4);
    assert_eq!(settings.collection_deadline, Duration::from_secs(300));
    assert!(settings.collector_command.is_none());
}

#[test]
#[serial]
fn test_environment_supplies_required_values() {
    clear_env();
    std::env::set_var("SHELFWATCH_WISHLIST_ID", "WL-env");
    std::env::set_var("SHELFWATCH_LOOKUP_APPKEY", "key-env");
    std::env::set_var("SHELFWATCH_SYSTEM_ID", "City_Example");

    let settings = Settings::resolve(&Overrides::default(), None).unwrap();

    assert_eq!(settings.wishlist_id, "WL-env");
    assert_eq!(settings.lookup_appkey, "key-env");
    assert_eq!(settings.lookup_system_id, "City_Example");

    clear_env();
}

#[test]
#[serial]
fn test_cli_override_beats_environment() {
    clear_env();
    std::env::set_var("SHELFWATCH_WISHLIST_ID", "WL-env");
    std::env::set_var("SHELFWATCH_LOOKUP_APPKEY", "key-env");

    let settings = Settings::resolve(&required_overrides(), None).unwrap();

    assert_eq!(settings.wishlist_id, "WL1");
    assert_eq!(settings.lookup_appkey, "key-1");

    clear_env();
}

#[test]
#[serial]
fn test_blank_environment_value_is_unset() {
    clear_env();
    std::env::set_var("SHELFWATCH_WISHLIST_ID", "   ");

    let err = Settings::resolve(&Overrides::default(), None).unwrap_err();
    assert!(err.to_string().contains("Wishlist id"));

    clear_env();
}

#[test]
#[serial]
fn test_toml_file_supplies_values_and_tunables() {
    clear_env();

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        r#"
wishlist_id = "WL-toml"
lookup_appkey = "key-toml"
collector_command = "collect-wishlist --headless"
pending_retry_delay_ms = 10
dispatch_pacing_ms = 20
max_concurrency = 2
collection_deadline_secs = 60
"#
    )
    .unwrap();

    let settings = Settings::resolve(&Overrides::default(), Some(&config_path)).unwrap();

    assert_eq!(settings.wishlist_id, "WL-toml");
    assert_eq!(settings.lookup_appkey, "key-toml");
    assert_eq!(
        settings.collector_command.as_deref(),
        Some("collect-wishlist --headless")
    );
    assert_eq!(settings.pending_retry_delay, Duration::from_millis(10));
    assert_eq!(settings.dispatch_pacing, Duration::from_millis(20));
    assert_eq!(settings.max_concurrency, 2);
    assert_eq!(settings.collection_deadline, Duration::from_secs(60));
}

#[test]
#[serial]
fn test_explicit_missing_config_file_is_an_error() {
    clear_env();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = Settings::resolve(&required_overrides(), Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Read config file"));
}
