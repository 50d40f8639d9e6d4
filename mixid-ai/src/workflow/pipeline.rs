//! Pipeline Coordinator
//!
//! Runs the recognition client over every window with bounded concurrency.
//!
//! # Ordering
//! Windows complete in any order. Each outcome is stored under its window
//! index and the result is read back in ascending index order, so the output
//! never depends on completion order.
//!
//! # Error Handling
//! - Per-window isolation: a failed window is recorded and never affects
//!   another window
//! - Only `Failed` windows are retried (when `max_retries > 0`)
//! - Cancellation abandons in-flight calls and returns `Error::Cancelled`
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(client, PipelineConfig::default());
//! let tracks = pipeline.tracklist(&windows, &CancellationToken::new()).await?;
//! ```

use super::{PipelineEvent, RunStats};
use crate::error::{Error, Result};
use crate::models::{AudioWindow, ExtractedTrack, RecognitionOutcome};
use crate::services::{dedupe, extract_all, RecognitionClient};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default number of in-flight recognition calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Upper bound for the retry backoff
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(10);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum in-flight recognition calls (≥ 1)
    pub max_concurrency: usize,
    /// Extra attempts for windows whose recognition failed
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Every outcome of a run, in window-index order
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub outcomes: Vec<RecognitionOutcome>,
    pub stats: RunStats,
}

impl PipelineRun {
    /// Matched outcomes, in window-index order
    pub fn into_matched(self) -> Vec<RecognitionOutcome> {
        self.outcomes
            .into_iter()
            .filter(RecognitionOutcome::is_matched)
            .collect()
    }
}

/// Pipeline coordinator
pub struct Pipeline {
    client: RecognitionClient,
    config: PipelineConfig,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl Pipeline {
    pub fn new(client: RecognitionClient, config: PipelineConfig) -> Self {
        Self {
            client,
            config,
            event_tx: None,
        }
    }

    /// Create pipeline with event channel for progress reporting
    pub fn with_events(
        client: RecognitionClient,
        config: PipelineConfig,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> Self {
        Self {
            client,
            config,
            event_tx: Some(event_tx),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Recognize every window and return the matched outcomes in index order
    ///
    /// Returns `Ok(vec![])` when nothing matched, including when every window
    /// failed.
    pub async fn run(
        &self,
        windows: &[AudioWindow],
        cancel: &CancellationToken,
    ) -> Result<Vec<RecognitionOutcome>> {
        Ok(self.run_detailed(windows, cancel).await?.into_matched())
    }

    /// Recognize every window and return all outcomes with run statistics
    pub async fn run_detailed(
        &self,
        windows: &[AudioWindow],
        cancel: &CancellationToken,
    ) -> Result<PipelineRun> {
        self.validate(windows)?;

        let total_windows = windows.len();
        info!(
            windows = total_windows,
            max_concurrency = self.config.max_concurrency,
            max_retries = self.config.max_retries,
            "Starting recognition run"
        );

        let dispatch = stream::iter(windows)
            .map(|window| self.recognize_window(window, total_windows))
            .buffer_unordered(self.config.max_concurrency)
            .fold(BTreeMap::new(), |mut slots, outcome| async move {
                slots.insert(outcome.window_index, outcome);
                slots
            });

        let slots = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Recognition run cancelled");
                return Err(Error::Cancelled);
            }
            slots = dispatch => slots,
        };

        let outcomes: Vec<RecognitionOutcome> = slots.into_values().collect();
        let stats = RunStats::from_outcomes(&outcomes);

        info!(
            windows = stats.windows,
            matched = stats.matched,
            no_match = stats.no_match,
            failed = stats.failed,
            "Recognition run complete"
        );
        self.emit_event(PipelineEvent::RunCompleted { stats });

        Ok(PipelineRun { outcomes, stats })
    }

    /// Run, deduplicate and extract: the ordered tracklist for `windows`
    pub async fn tracklist(
        &self,
        windows: &[AudioWindow],
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractedTrack>> {
        let matched = self.run(windows, cancel).await?;
        Ok(extract_all(&dedupe(matched)))
    }

    fn validate(&self, windows: &[AudioWindow]) -> Result<()> {
        if self.config.max_concurrency == 0 {
            return Err(Error::InvalidInput(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let mut indices = HashSet::with_capacity(windows.len());
        for window in windows {
            if !indices.insert(window.index) {
                return Err(Error::InvalidInput(format!(
                    "duplicate window index {}",
                    window.index
                )));
            }
        }

        Ok(())
    }

    /// One window through the client, retrying failures with backoff
    async fn recognize_window(&self, window: &AudioWindow, total_windows: usize) -> RecognitionOutcome {
        self.emit_event(PipelineEvent::WindowStarted {
            window_index: window.index,
            total_windows,
        });

        let mut outcome = self.client.recognize(window).await;
        let mut attempts = 1u32;
        let mut backoff = self.config.retry_backoff;

        while outcome.is_failed() && attempts <= self.config.max_retries {
            debug!(
                window_index = window.index,
                attempt = attempts + 1,
                backoff_ms = backoff.as_millis() as u64,
                "Retrying failed window"
            );
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_RETRY_BACKOFF);

            outcome = self.client.recognize(window).await;
            attempts += 1;
        }

        self.emit_event(PipelineEvent::WindowCompleted {
            window_index: window.index,
            matched: outcome.is_matched(),
            attempts,
        });

        outcome
    }

    /// Emit pipeline event if channel configured
    ///
    /// Never waits: when the receiver lags and the channel is full the event
    /// is dropped, so a slow consumer cannot stall recognition.
    fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            if let Err(mpsc::error::TrySendError::Full(event)) = tx.try_send(event) {
                tracing::trace!(?event, "Event channel full, dropping event");
            }
        }
    }
}
