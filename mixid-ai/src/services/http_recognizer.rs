//! HTTP recognition backend
//!
//! POSTs one WAV-encoded window to a recognition endpoint and parses the
//! nested JSON answer into a [`RawPayload`].
//!
//! # Response mapping
//! - 200 with a `track` object → match
//! - 200 without `track`, 204, 404 → no match
//! - 401/403 → invalid API key
//! - anything else → API error

use super::recognition_client::{RecognitionError, Recognizer};
use crate::models::RawPayload;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{header, Client, StatusCode};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("mixid/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Recognition backend reached over HTTP
pub struct HttpRecognizer {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
    rate_limiter: Option<DirectRateLimiter>,
}

impl HttpRecognizer {
    /// Create a client for `endpoint`
    ///
    /// `transport_timeout` bounds the whole HTTP exchange; the recognition
    /// client applies its own per-window timeout on top.
    pub fn new(
        endpoint: impl Into<String>,
        transport_timeout: Duration,
    ) -> Result<Self, RecognitionError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(transport_timeout)
            .build()
            .map_err(|e| RecognitionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: None,
            rate_limiter: None,
        })
    }

    /// Send `api_key` with every request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Cap outgoing requests per second, spaced evenly (no bursts)
    pub fn with_rate_limit(mut self, requests_per_second: NonZeroU32) -> Self {
        let quota = Quota::per_second(requests_per_second).allow_burst(NonZeroU32::MIN);
        self.rate_limiter = Some(RateLimiter::direct(quota));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Recognizer for HttpRecognizer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn ready(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    async fn recognize(&self, audio: &[u8]) -> Result<Option<RawPayload>, RecognitionError> {
        debug!(bytes = audio.len(), endpoint = %self.endpoint, "Submitting window");

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "audio/wav")
            .body(audio.to_vec());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RecognitionError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(RecognitionError::Api(
                    status.as_u16(),
                    "invalid API key".to_string(),
                ));
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(RecognitionError::Api(status.as_u16(), body));
            }
            _ => {}
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecognitionError::Parse(e.to_string()))?;

        if !value.is_object() {
            return Err(RecognitionError::Parse(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }

        let payload = RawPayload::from_value(value);
        if payload.has_track() {
            let identity = payload.identity();
            debug!(identity = ?identity, "Recognition match");
            Ok(Some(payload))
        } else {
            Ok(None)
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
