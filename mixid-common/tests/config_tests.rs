//! Integration tests for TOML configuration loading and write-back
//!
//! Covers:
//! - Explicit config path must exist
//! - Atomic write followed by reload returns the same settings
//! - Invalid values are rejected at load time
//! - Default config initialization refuses to clobber an existing file

use mixid_common::config::{
    init_config, load_or_default, load_toml_config, write_toml_config, LoggingConfig, PipelineSettings,
    RecognizerConfig, SearchConfig, TomlConfig,
};
use mixid_common::Error;
use tempfile::TempDir;

#[test]
fn test_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let result = load_or_default(Some(missing.as_path()));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_write_then_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let config = TomlConfig {
        recognizer: RecognizerConfig {
            endpoint: "http://10.0.0.5:9000/recognize".to_string(),
            api_key: Some("secret".to_string()),
            timeout_secs: 12,
            requests_per_second: Some(3),
        },
        search: SearchConfig::default(),
        pipeline: PipelineSettings {
            window_seconds: 30,
            max_concurrency: 8,
            max_retries: 1,
            audio_format: "m4a".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    };

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_rejects_invalid_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[pipeline]\nmax_concurrency = 0\n").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(err.to_string().contains("max_concurrency"));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[pipeline\nwindow_seconds = ").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(err.to_string().contains("Parse"));
}

#[test]
fn test_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded, TomlConfig::default());
}

#[test]
fn test_init_config_writes_loadable_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mixid").join("config.toml");

    init_config(&path, false).unwrap();

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded, TomlConfig::default());
}

#[test]
fn test_init_config_keeps_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[pipeline]\nwindow_seconds = 25\n").unwrap();

    let result = init_config(&path, false);
    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(load_toml_config(&path).unwrap().pipeline.window_seconds, 25);

    init_config(&path, true).unwrap();
    assert_eq!(load_toml_config(&path).unwrap().pipeline.window_seconds, 40);
}
