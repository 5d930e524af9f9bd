//! Configuration loading and validation tests.
//!
//! Tests the example config, environment variable overrides, CLI precedence,
//! and first-run creation of the config file.

use clap::Parser;
use logwell_core::config::LogwellConfig;
use logwell_daemon::cli::DaemonCli;
use serial_test::serial;

const EXAMPLE_CONFIG: &str = include_str!("../../logwell.toml.example");

/// Env vars touched by these tests.
const ENV_KEYS: &[&str] = &[
    "LOGWELL_COLLECTOR_PORT",
    "LOGWELL_COLLECTOR_LOG_DIRECTORY",
    "LOGWELL_COLLECTOR_SHOW_REMOTE_DATE_AND_TIME",
    "LOGWELL_GENERAL_LOG_LEVEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        // SAFETY: serial tests, no other thread reads these variables concurrently
        unsafe { std::env::remove_var(key) };
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: serial tests, no other thread reads these variables concurrently
    unsafe { std::env::set_var(key, value) };
}

#[test]
fn test_example_config_matches_defaults() {
    // Given: the shipped example config
    let config = LogwellConfig::parse(EXAMPLE_CONFIG).expect("example config should parse");

    // Then: it is valid and documents the defaults
    config.validate().expect("example config should validate");
    let defaults = LogwellConfig::default();
    assert_eq!(config.collector.port, defaults.collector.port);
    assert_eq!(config.collector.log_directory, defaults.collector.log_directory);
    assert_eq!(config.collector.rotate_size_mb, defaults.collector.rotate_size_mb);
    assert_eq!(config.collector.rotate_count, defaults.collector.rotate_count);
    assert_eq!(config.metrics.port, defaults.metrics.port);
}

#[test]
fn test_example_config_is_valid_toml() {
    let table: toml::Table = toml::from_str(EXAMPLE_CONFIG).expect("valid TOML");
    assert!(table.contains_key("general"));
    assert!(table.contains_key("collector"));
    assert!(table.contains_key("metrics"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        "[collector]\nport = 0",
        "[collector]\nrotate_count = 0",
        "[collector]\nrotate_size_mb = 0",
        "[collector]\nbind_address = \"not-an-ip\"",
        "[collector]\nlog_directory = \"\"",
        "[general]\nlog_format = \"xml\"",
        "[general]\nlog_level = \"verbose\"",
    ];
    for toml_str in cases {
        let config = LogwellConfig::parse(toml_str).expect("should parse");
        assert!(config.validate().is_err(), "should reject: {toml_str}");
    }
}

#[tokio::test]
#[serial]
async fn test_env_overrides_file_values() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");
    std::fs::write(&path, "[collector]\nport = 5514\nlog_directory = \"from-file\"\n").unwrap();

    // When: env vars override two fields
    set_env("LOGWELL_COLLECTOR_PORT", "6514");
    set_env("LOGWELL_COLLECTOR_SHOW_REMOTE_DATE_AND_TIME", "true");
    let config = LogwellConfig::load(&path).await;
    clear_env();

    // Then: env wins, untouched fields come from the file
    let config = config.expect("config should load");
    assert_eq!(config.collector.port, 6514);
    assert!(config.collector.show_remote_date_and_time);
    assert_eq!(config.collector.log_directory, "from-file");
}

#[tokio::test]
#[serial]
async fn test_unparsable_env_value_is_ignored() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");
    std::fs::write(&path, "[collector]\nport = 5514\n").unwrap();

    set_env("LOGWELL_COLLECTOR_PORT", "not-a-port");
    let config = LogwellConfig::load(&path).await;
    clear_env();

    assert_eq!(config.expect("config should load").collector.port, 5514);
}

#[tokio::test]
#[serial]
async fn test_cli_overrides_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");
    std::fs::write(&path, "").unwrap();

    set_env("LOGWELL_COLLECTOR_PORT", "6514");
    set_env("LOGWELL_GENERAL_LOG_LEVEL", "warn");
    let mut config = LogwellConfig::load(&path).await.expect("config should load");
    clear_env();

    let cli = DaemonCli::parse_from(["logwell-daemon", "--port", "7514"]);
    cli.apply_overrides(&mut config);

    assert_eq!(config.collector.port, 7514);
    assert_eq!(config.general.log_level, "warn");
    config.validate().unwrap();
}

#[tokio::test]
#[serial]
async fn test_missing_config_file_is_created_with_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("logwell.toml");

    let config = LogwellConfig::load_or_create(&path)
        .await
        .expect("should create config");

    assert!(path.exists());
    assert_eq!(config.collector.port, 514);

    // The written file round-trips to the same values
    let reloaded = LogwellConfig::load(&path).await.expect("should reload");
    assert_eq!(reloaded.collector.log_directory, "Log");
    assert_eq!(reloaded.collector.rotate_count, 5);
}

#[tokio::test]
#[serial]
async fn test_cli_flag_replaces_invalid_env_value_before_validation() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");
    std::fs::write(&path, "").unwrap();

    // Given: an env value that would fail validation on its own
    set_env("LOGWELL_GENERAL_LOG_LEVEL", "verbose");
    let path_arg = path.to_str().unwrap();
    let overridden =
        DaemonCli::parse_from(["logwell-daemon", "-c", path_arg, "--log-level", "debug"])
            .load_config()
            .await;
    let plain = DaemonCli::parse_from(["logwell-daemon", "-c", path_arg])
        .load_config()
        .await;
    clear_env();

    // Then: the CLI flag wins and validation runs on the final value
    assert_eq!(overridden.expect("config should load").general.log_level, "debug");
    assert!(plain.is_err());
}

#[tokio::test]
#[serial]
async fn test_validate_flag_does_not_create_config_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwell.toml");

    let cli = DaemonCli::parse_from(["logwell-daemon", "-c", path.to_str().unwrap(), "--validate"]);
    assert!(cli.load_config().await.is_err());
    assert!(!path.exists());

    // Without --validate the defaults are written on first run
    let cli = DaemonCli::parse_from(["logwell-daemon", "-c", path.to_str().unwrap()]);
    let config = cli.load_config().await.expect("config should be created");
    assert!(path.exists());
    assert_eq!(config.collector.port, 514);
}
