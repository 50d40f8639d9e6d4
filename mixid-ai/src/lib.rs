//! mixid-ai: chunked song recognition for long recordings
//!
//! A recording (DJ set, radio capture, live stream archive) is cut into
//! fixed-length windows, each window is sent to a recognition service
//! concurrently, repeated sightings of the same track are collapsed, and the
//! result is an ordered tracklist with the offset where each track first
//! appeared.
//!
//! # Stages
//! - [`services::acquisition`]: locator to local audio file
//! - [`services::segmenter`]: decode and cut into [`models::AudioWindow`]s
//! - [`workflow::Pipeline`]: bounded concurrent recognition, reassembled by index
//! - [`services::deduplicator`]: first sighting per track
//! - [`services::metadata_extractor`]: flat [`models::ExtractedTrack`] records
//! - [`services::match_lookup`]: optional file search per track

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{Error, Result};
