//! Raw recognition payload
//!
//! The recognition service answers with a nested, partially-populated record:
//!
//! ```json
//! {
//!   "matches": [ ... ],
//!   "track": {
//!     "key": "40333609",
//!     "title": "Song",
//!     "subtitle": "Artist",
//!     "genres": { "primary": "Electronic" },
//!     "sections": [
//!       { "type": "SONG", "metadata": [ { "title": "Album", "text": "LP" } ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Every level is optional. Fields that are present but have the wrong shape
//! deserialize to their empty value instead of failing the whole payload, so a
//! single odd field never turns a match into an error.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Top-level recognition response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    /// Matched track, absent on no-match responses
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub track: Option<RawTrack>,

    /// Candidate matches as returned by the service (opaque)
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Value>,
}

/// `track` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    /// Stable service-side identifier
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Artist line
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub genres: Option<RawGenres>,

    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<RawSection>,
}

/// `track.genres` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGenres {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
}

/// One entry of `track.sections`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    /// Section kind ("SONG", "LYRICS", ...)
    #[serde(rename = "type", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<RawMetadataEntry>,
}

/// `{title, text}` fact inside a section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetadataEntry {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Key used to deduplicate sightings of the same track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackIdentity(String);

impl TrackIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl RawPayload {
    /// Identity of the matched track, if the payload carries a non-empty key
    pub fn identity(&self) -> Option<TrackIdentity> {
        self.track
            .as_ref()?
            .key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(TrackIdentity::new)
    }

    /// Whether the payload describes a matched track
    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    /// Build a payload from loosely-shaped JSON, never failing
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

impl RawTrack {
    /// Text of the first metadata entry titled `key`, scanning every section in order
    pub fn find_metadata(&self, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .flat_map(|section| section.metadata.iter())
            .find(|entry| entry.title.as_deref() == Some(key))
            .and_then(|entry| entry.text.as_deref())
    }
}

/// Deserialize `T`, substituting `T::default()` when the value has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a list, keeping the elements that have the right shape
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accept strings and numbers (keys are sometimes numeric), drop anything else
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
