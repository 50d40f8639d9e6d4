//! Recognition Client
//!
//! Wraps exactly one external recognition call per window. The backend sits
//! behind the [`Recognizer`] trait; [`RecognitionClient`] adds the per-call
//! timeout and folds every service-level failure into a [`Recognition`] value,
//! so callers always get an outcome back and never an error.

use crate::models::{AudioWindow, RawPayload, Recognition, RecognitionOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Per-window recognition errors
///
/// These never leave the pipeline; they are recorded as
/// [`Recognition::Failed`] for the affected window.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Recognition timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// External recognition backend
///
/// # Example
/// ```rust,ignore
/// struct Fixed;
///
/// #[async_trait::async_trait]
/// impl Recognizer for Fixed {
///     fn name(&self) -> &'static str { "fixed" }
///
///     async fn recognize(&self, _audio: &[u8]) -> Result<Option<RawPayload>, RecognitionError> {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Wait until the backend may accept another request
    ///
    /// Local throttling belongs here. The wait is not counted against the
    /// per-window timeout.
    async fn ready(&self) {}

    /// Submit one WAV-encoded window
    ///
    /// Returns `Ok(None)` when the service answered without a match.
    async fn recognize(&self, audio: &[u8]) -> Result<Option<RawPayload>, RecognitionError>;
}

/// Timeout-bounded, non-failing wrapper around a [`Recognizer`]
#[derive(Clone)]
pub struct RecognitionClient {
    recognizer: Arc<dyn Recognizer>,
    timeout: Duration,
}

impl RecognitionClient {
    pub fn new(recognizer: Arc<dyn Recognizer>, timeout: Duration) -> Self {
        Self {
            recognizer,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Recognize one window
    ///
    /// Always returns an outcome for `window.index`: a match, a no-match, or a
    /// failure carrying the reason. No retries happen here. The timeout starts
    /// once the backend reports ready.
    pub async fn recognize(&self, window: &AudioWindow) -> RecognitionOutcome {
        self.recognizer.ready().await;

        let result = match tokio::time::timeout(
            self.timeout,
            self.recognizer.recognize(&window.audio_bytes),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RecognitionError::Timeout(self.timeout)),
        };

        let recognition = match result {
            Ok(Some(payload)) if payload.has_track() => Recognition::Matched { payload },
            Ok(_) => Recognition::NoMatch,
            Err(e) => {
                tracing::warn!(
                    recognizer = self.recognizer.name(),
                    window_index = window.index,
                    error = %e,
                    "Recognition failed (window recorded as unmatched)"
                );
                Recognition::Failed {
                    reason: e.to_string(),
                }
            }
        };

        tracing::debug!(
            window_index = window.index,
            matched = matches!(recognition, Recognition::Matched { .. }),
            "Window recognized"
        );

        RecognitionOutcome {
            window_index: window.index,
            start_offset: window.start_offset,
            recognition,
        }
    }
}
