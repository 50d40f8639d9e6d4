//! Configuration resolution for mixid-ai
//!
//! Turns the merged [`TomlConfig`] into runtime components. Command-line and
//! `MIXID_*` environment values arrive as [`Overrides`] and win over the file.

use crate::error::{Error, Result};
use crate::services::{HttpRecognizer, RecognitionClient, SlskdClient};
use crate::workflow::PipelineConfig;
use mixid_common::config::TomlConfig;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the recognizer API key
pub const API_KEY_ENV: &str = "MIXID_RECOGNIZER_API_KEY";

/// Values supplied on the command line or through `MIXID_*` variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub window_seconds: Option<u64>,
    pub max_concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub requests_per_second: Option<u32>,
    pub recognizer_endpoint: Option<String>,
    pub search_endpoint: Option<String>,
    pub audio_format: Option<String>,
}

/// Apply `overrides` on top of `config` and re-validate
pub fn apply_overrides(mut config: TomlConfig, overrides: &Overrides) -> Result<TomlConfig> {
    if let Some(v) = overrides.window_seconds {
        config.pipeline.window_seconds = v;
    }
    if let Some(v) = overrides.max_concurrency {
        config.pipeline.max_concurrency = v;
    }
    if let Some(v) = overrides.max_retries {
        config.pipeline.max_retries = v;
    }
    if let Some(v) = overrides.timeout_secs {
        config.recognizer.timeout_secs = v;
    }
    if let Some(v) = overrides.requests_per_second {
        config.recognizer.requests_per_second = Some(v);
    }
    if let Some(v) = &overrides.recognizer_endpoint {
        config.recognizer.endpoint = v.clone();
    }
    if let Some(v) = &overrides.search_endpoint {
        config.search.endpoint = v.clone();
    }
    if let Some(v) = &overrides.audio_format {
        config.pipeline.audio_format = v.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Resolve the recognizer API key
///
/// **Priority:** ENV → TOML. A missing key is not an error; the recognizer
/// is then called without one.
pub fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .recognizer
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    match (env_key, toml_key) {
        (Some(env_key), Some(_)) => {
            warn!(
                "Recognizer API key found in environment and TOML. Using environment (highest priority)."
            );
            Some(env_key)
        }
        (Some(env_key), None) => {
            info!("Recognizer API key loaded from environment variable");
            Some(env_key)
        }
        (None, Some(toml_key)) => {
            info!("Recognizer API key loaded from TOML config");
            Some(toml_key)
        }
        (None, None) => None,
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Window length from the pipeline settings
pub fn window_duration(config: &TomlConfig) -> Duration {
    Duration::from_secs(config.pipeline.window_seconds)
}

/// Coordinator settings from the pipeline section
pub fn pipeline_config(config: &TomlConfig) -> PipelineConfig {
    PipelineConfig {
        max_concurrency: config.pipeline.max_concurrency,
        max_retries: config.pipeline.max_retries,
        ..PipelineConfig::default()
    }
}

/// HTTP recognition client with the configured timeout, key and rate limit
pub fn build_recognition_client(
    config: &TomlConfig,
    api_key: Option<String>,
) -> Result<RecognitionClient> {
    let timeout = Duration::from_secs(config.recognizer.timeout_secs);

    // Transport timeout sits just above the per-window timeout so the
    // client-level timeout is the one that fires.
    let mut recognizer = HttpRecognizer::new(
        config.recognizer.endpoint.clone(),
        timeout + Duration::from_secs(1),
    )
    .map_err(|e| config_error(format!("Recognizer client: {}", e)))?
    .with_api_key(api_key);

    if let Some(rps) = config.recognizer.requests_per_second.and_then(NonZeroU32::new) {
        recognizer = recognizer.with_rate_limit(rps);
    }

    Ok(RecognitionClient::new(Arc::new(recognizer), timeout))
}

/// Search client for the configured JSON-RPC endpoint
pub fn build_search_client(config: &TomlConfig) -> Result<SlskdClient> {
    SlskdClient::new(
        config.search.endpoint.clone(),
        Duration::from_secs(config.search.timeout_secs),
    )
    .map_err(|e| config_error(format!("Search client: {}", e)))
}

fn config_error(message: String) -> Error {
    Error::Config(mixid_common::Error::Config(message))
}
