//! Terminal records: extracted tracks and search candidates

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for a missing track title
pub const UNKNOWN_TRACK_NAME: &str = "Unknown Track Name";
/// Placeholder for a missing artist
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Placeholder for a missing album
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
/// Placeholder for a missing genre
pub const UNKNOWN_GENRE: &str = "Unknown Genre";
/// Placeholder for a missing release year
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// Flattened, defaulted metadata for one uniquely identified track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTrack {
    pub track_name: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub release_year: String,
    /// Rendered start offset of the window that first recognized the track
    pub timestamp: String,
}

impl ExtractedTrack {
    /// Name used as the file-search query
    pub fn display_name(&self) -> &str {
        &self.track_name
    }
}

/// One file listing returned by the search service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "username", alias = "owner_handle")]
    pub owner_handle: String,

    #[serde(rename = "path", alias = "file_path")]
    pub file_path: String,

    /// Size in bytes; unknown for synthetic error candidates
    #[serde(
        rename = "filesize",
        alias = "file_size_bytes",
        default,
        deserialize_with = "size_or_none"
    )]
    pub file_size_bytes: Option<u64>,
}

/// Sizes arrive as numbers, numeric strings, or placeholders like "N/A"
fn size_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl MatchCandidate {
    /// Owner handle marking a synthetic error candidate
    pub const ERROR_OWNER: &'static str = "Error";

    /// Synthetic candidate carrying a transport error message
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            owner_handle: Self::ERROR_OWNER.to_string(),
            file_path: message.into(),
            file_size_bytes: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.owner_handle == Self::ERROR_OWNER && self.file_size_bytes.is_none()
    }
}
