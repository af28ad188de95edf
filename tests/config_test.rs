//! Tests for config module

use std::io::Write;

use chrono::NaiveTime;
use serial_test::serial;
use tempfile::NamedTempFile;

use tour_roster::config::{Config, DatabaseBackend};

const ENV_KEYS: &[&str] = &[
    "TOUR_ROSTER_BIND",
    "TOUR_ROSTER_API_KEYS",
    "TOUR_ROSTER_DB_BACKEND",
    "TOUR_ROSTER_DATABASE_URL",
    "DATABASE_URL",
    "TOUR_ROSTER_PUSH_ENABLED",
    "TOUR_ROSTER_PUSH_BATCH_SIZE",
    "TOUR_ROSTER_MORNING",
    "TOUR_ROSTER_AFTERNOON",
    "TOUR_ROSTER_HISTORY_MONTHS",
    "TOUR_ROSTER_LOG_FORMAT",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// Environment
// ============================================================================

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.backend, DatabaseBackend::Postgres);
    assert_eq!(config.push.batch_size, 100);
    assert_eq!(config.roster.history_months, 6);
    assert!(config.server.api_keys.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("TOUR_ROSTER_BIND", "127.0.0.1:9090");
    std::env::set_var("TOUR_ROSTER_API_KEYS", "tok-a:user-1, tok-b:user-2,broken");
    std::env::set_var("TOUR_ROSTER_DB_BACKEND", "memory");
    std::env::set_var("TOUR_ROSTER_MORNING", "09:45");
    std::env::set_var("TOUR_ROSTER_HISTORY_MONTHS", "3");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.server.bind_address.port(), 9090);
    assert_eq!(config.server.api_keys.len(), 2);
    assert_eq!(config.server.user_for_token("tok-b"), Some("user-2"));
    assert_eq!(config.database.backend, DatabaseBackend::Memory);
    assert_eq!(config.roster.morning, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
    assert_eq!(config.roster.history_months, 3);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    clear_env();
    std::env::set_var("TOUR_ROSTER_BIND", "not-an-address");
    assert!(Config::from_env().is_err());

    clear_env();
    std::env::set_var("TOUR_ROSTER_DB_BACKEND", "sqlite");
    assert!(Config::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_load_validates_env_config() {
    clear_env();
    std::env::set_var("TOUR_ROSTER_PUSH_BATCH_SIZE", "500");

    let result = Config::load(None);
    clear_env();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("batch_size"));
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_from_file_partial_sections() {
    let file = write_config(
        r#"
[database]
backend = "memory"

[roster]
afternoon = "15:30:00"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.database.backend, DatabaseBackend::Memory);
    assert_eq!(config.roster.afternoon, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    assert_eq!(config.roster.morning, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_load_rejects_invalid_file() {
    let file = write_config(
        r#"
[roster]
morning = "16:00:00"
afternoon = "14:00:00"
"#,
    );
    assert!(Config::load(Some(file.path())).is_err());

    let file = write_config("[logging]\nformat = \"xml\"\n");
    assert!(Config::load(Some(file.path())).is_err());

    let file = write_config("this is not toml = = =");
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_missing_file() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/roster.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

// ============================================================================
// Shipped example
// ============================================================================

#[test]
fn test_config_file_exists() {
    let config_path = std::path::Path::new("config.toml");
    assert!(
        config_path.exists(),
        "config.toml should exist in project root"
    );
}

#[test]
fn test_config_toml_readable() {
    let content =
        std::fs::read_to_string("config.toml").expect("Should be able to read config.toml");

    for section in ["[server]", "[database]", "[push]", "[roster]", "[logging]"] {
        assert!(
            content.contains(section),
            "config.toml should have {section} section"
        );
    }
}

#[test]
fn test_shipped_config_is_valid() {
    let config = Config::load(Some(std::path::Path::new("config.toml"))).unwrap();
    assert_eq!(config.database.backend, DatabaseBackend::Memory);
    assert!(!config.push.enabled);
    assert_eq!(config.server.user_for_token("change-me-admin-token"), Some("demo-admin"));
}
