//! Metadata Extractor
//!
//! Flattens a matched payload into an [`ExtractedTrack`]. Absent or malformed
//! fields resolve to the placeholders in [`crate::models::track`]; extraction
//! has no failure path.

use crate::models::track::{
    UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_GENRE, UNKNOWN_TRACK_NAME, UNKNOWN_YEAR,
};
use crate::models::{ExtractedTrack, RawPayload, RawTrack, RecognitionOutcome};
use mixid_common::human_time::format_offset;
use std::time::Duration;

/// Metadata key holding the album name
pub const ALBUM_KEY: &str = "Album";
/// Metadata key holding the release year
pub const RELEASED_KEY: &str = "Released";

/// Extract the flat record for one outcome
///
/// Outcomes without a payload yield an all-default record stamped with the
/// window's offset.
pub fn extract(outcome: &RecognitionOutcome) -> ExtractedTrack {
    match outcome.payload() {
        Some(payload) => extract_payload(payload, outcome.start_offset),
        None => extract_payload(&RawPayload::default(), outcome.start_offset),
    }
}

/// Extract from a bare payload seen at `offset`
pub fn extract_payload(payload: &RawPayload, offset: Duration) -> ExtractedTrack {
    let empty = RawTrack::default();
    let track = payload.track.as_ref().unwrap_or(&empty);

    ExtractedTrack {
        track_name: or_default(track.title.as_deref(), UNKNOWN_TRACK_NAME),
        artist: or_default(track.subtitle.as_deref(), UNKNOWN_ARTIST),
        album: metadata_or(track, ALBUM_KEY, UNKNOWN_ALBUM),
        genre: or_default(
            track.genres.as_ref().and_then(|g| g.primary.as_deref()),
            UNKNOWN_GENRE,
        ),
        release_year: metadata_or(track, RELEASED_KEY, UNKNOWN_YEAR),
        timestamp: format_offset(offset),
    }
}

/// Extract every outcome in order
pub fn extract_all(outcomes: &[RecognitionOutcome]) -> Vec<ExtractedTrack> {
    outcomes.iter().map(extract).collect()
}

/// First value for `key` across all sections, or `default`
fn metadata_or(track: &RawTrack, key: &str, default: &str) -> String {
    or_default(track.find_metadata(key), default)
}

fn or_default(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
