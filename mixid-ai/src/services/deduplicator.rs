//! Deduplicator
//!
//! Collapses an ordered outcome sequence to the first sighting of each track.
//! The seen-set lives for one call; pass a set explicitly to carry identities
//! across runs.

use crate::models::{RecognitionOutcome, TrackIdentity};
use std::collections::HashSet;

/// Keep the first outcome per track identity, preserving input order
///
/// Outcomes without an identity (no-match, failures, payloads missing a key)
/// are dropped.
pub fn dedupe(outcomes: Vec<RecognitionOutcome>) -> Vec<RecognitionOutcome> {
    let mut seen = HashSet::new();
    dedupe_with_seen(outcomes, &mut seen)
}

/// [`dedupe`] against a caller-owned seen-set, which is updated in place
pub fn dedupe_with_seen(
    outcomes: Vec<RecognitionOutcome>,
    seen: &mut HashSet<TrackIdentity>,
) -> Vec<RecognitionOutcome> {
    let total = outcomes.len();
    let mut unidentified = 0usize;

    let kept: Vec<RecognitionOutcome> = outcomes
        .into_iter()
        .filter(|outcome| match outcome.identity() {
            Some(identity) => {
                if seen.insert(identity.clone()) {
                    true
                } else {
                    tracing::debug!(
                        window_index = outcome.window_index,
                        identity = %identity,
                        "Dropping repeat sighting"
                    );
                    false
                }
            }
            None => {
                unidentified += 1;
                false
            }
        })
        .collect();

    tracing::debug!(
        total,
        kept = kept.len(),
        unidentified,
        "Deduplication complete"
    );

    kept
}
