//! Data model for the recognition pipeline

pub mod outcome;
pub mod payload;
pub mod track;
pub mod window;

pub use outcome::{Recognition, RecognitionOutcome};
pub use payload::{RawGenres, RawMetadataEntry, RawPayload, RawSection, RawTrack, TrackIdentity};
pub use track::{ExtractedTrack, MatchCandidate};
pub use window::AudioWindow;
