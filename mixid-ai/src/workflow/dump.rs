//! Raw payload dump
//!
//! Saves deduplicated matched payloads with their window offsets so a run can
//! be re-extracted later without contacting any service. Loading also accepts
//! a plain JSON array of raw payloads; those entries get a zero offset.

use crate::error::{Error, Result};
use crate::models::{RawPayload, RecognitionOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// One saved sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpEntry {
    pub window_index: usize,
    pub start_offset_ms: u64,
    pub payload: RawPayload,
}

impl DumpEntry {
    pub fn start_offset(&self) -> Duration {
        Duration::from_millis(self.start_offset_ms)
    }

    pub fn into_outcome(self) -> RecognitionOutcome {
        let start_offset = self.start_offset();
        RecognitionOutcome::matched(self.window_index, start_offset, self.payload)
    }
}

/// Write matched outcomes to `path` as pretty JSON
///
/// Unmatched outcomes are skipped.
pub fn save_dump(outcomes: &[RecognitionOutcome], path: &Path) -> Result<usize> {
    let entries: Vec<DumpEntry> = outcomes
        .iter()
        .filter_map(|outcome| {
            outcome.payload().map(|payload| DumpEntry {
                window_index: outcome.window_index,
                start_offset_ms: outcome.start_offset.as_millis() as u64,
                payload: payload.clone(),
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;

    tracing::info!(path = %path.display(), entries = entries.len(), "Raw payloads saved");
    Ok(entries.len())
}

/// Read a dump back as matched outcomes in file order
///
/// Entries without a `track` are dropped.
pub fn load_dump(path: &Path) -> Result<Vec<RecognitionOutcome>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::InvalidInput(format!(
                "{}: expected a JSON array, got {}",
                path.display(),
                if other.is_object() { "an object" } else { "a scalar" }
            )))
        }
    };

    let outcomes: Vec<RecognitionOutcome> = items
        .into_iter()
        .enumerate()
        .map(|(position, item)| parse_item(position, item))
        .filter(RecognitionOutcome::is_matched)
        .collect();

    tracing::debug!(path = %path.display(), outcomes = outcomes.len(), "Dump loaded");
    Ok(outcomes)
}

fn parse_item(position: usize, item: Value) -> RecognitionOutcome {
    if item.get("payload").is_some() {
        if let Ok(entry) = serde_json::from_value::<DumpEntry>(item.clone()) {
            return if entry.payload.has_track() {
                entry.into_outcome()
            } else {
                RecognitionOutcome::no_match(entry.window_index, entry.start_offset())
            };
        }
    }

    let payload = RawPayload::from_value(item);
    if payload.has_track() {
        RecognitionOutcome::matched(position, Duration::ZERO, payload)
    } else {
        RecognitionOutcome::no_match(position, Duration::ZERO)
    }
}
