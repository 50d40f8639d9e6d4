//! Pipeline stages
//!
//! Each stage is usable on its own; [`crate::workflow::Pipeline`] wires them
//! together for a full run.

pub mod acquisition;
pub mod deduplicator;
pub mod http_recognizer;
pub mod match_lookup;
pub mod metadata_extractor;
pub mod recognition_client;
pub mod segmenter;

pub use acquisition::{is_remote_locator, AcquiredAudio, AudioSource, LocalFileSource, YtDlpAcquirer};
pub use deduplicator::{dedupe, dedupe_with_seen};
pub use http_recognizer::HttpRecognizer;
pub use match_lookup::{search_tracks, MatchLookup, SlskdClient};
pub use metadata_extractor::{extract, extract_all, extract_payload};
pub use recognition_client::{RecognitionClient, RecognitionError, Recognizer};
pub use segmenter::{export_windows, load_windows, segment};
