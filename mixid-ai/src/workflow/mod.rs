//! Recognition workflow
//!
//! [`Pipeline`] fans windows out to the recognition client, reassembles the
//! outcomes by window index and hands matched outcomes to the deduplicator
//! and extractor. [`dump`] persists deduplicated payloads for offline
//! re-extraction.

pub mod dump;
pub mod pipeline;

pub use dump::{load_dump, save_dump, DumpEntry};
pub use pipeline::{Pipeline, PipelineConfig, PipelineRun};

use crate::models::RecognitionOutcome;
use serde::Serialize;

/// Progress events emitted during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A window was handed to the recognition client
    WindowStarted {
        window_index: usize,
        total_windows: usize,
    },

    /// A window finished (after any retries)
    WindowCompleted {
        window_index: usize,
        matched: bool,
        /// Recognition attempts made for this window
        attempts: u32,
    },

    /// Every window finished
    RunCompleted { stats: RunStats },
}

/// Per-run recognition counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub windows: usize,
    pub matched: usize,
    pub no_match: usize,
    pub failed: usize,
}

impl RunStats {
    /// Tally a complete outcome set
    pub fn from_outcomes(outcomes: &[RecognitionOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                windows: outcomes.len(),
                ..Self::default()
            },
            |mut stats, outcome| {
                if outcome.is_matched() {
                    stats.matched += 1;
                } else if outcome.is_failed() {
                    stats.failed += 1;
                } else {
                    stats.no_match += 1;
                }
                stats
            },
        )
    }
}
