//! Per-window recognition outcome

use super::payload::{RawPayload, TrackIdentity};
use std::time::Duration;

/// Result of submitting one window to the recognition service
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    /// The service identified a track
    Matched { payload: RawPayload },
    /// The service answered but found nothing
    NoMatch,
    /// Timeout, transport or response error
    Failed { reason: String },
}

/// Outcome of one window, produced exactly once per window
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOutcome {
    pub window_index: usize,
    pub start_offset: Duration,
    pub recognition: Recognition,
}

impl RecognitionOutcome {
    pub fn matched(window_index: usize, start_offset: Duration, payload: RawPayload) -> Self {
        Self {
            window_index,
            start_offset,
            recognition: Recognition::Matched { payload },
        }
    }

    pub fn no_match(window_index: usize, start_offset: Duration) -> Self {
        Self {
            window_index,
            start_offset,
            recognition: Recognition::NoMatch,
        }
    }

    pub fn failed(window_index: usize, start_offset: Duration, reason: impl Into<String>) -> Self {
        Self {
            window_index,
            start_offset,
            recognition: Recognition::Failed {
                reason: reason.into(),
            },
        }
    }

    /// Payload of a matched outcome
    pub fn payload(&self) -> Option<&RawPayload> {
        match &self.recognition {
            Recognition::Matched { payload } => Some(payload),
            _ => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self.recognition, Recognition::Matched { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.recognition, Recognition::Failed { .. })
    }

    /// Track identity of a matched outcome
    pub fn identity(&self) -> Option<TrackIdentity> {
        self.payload().and_then(RawPayload::identity)
    }
}
