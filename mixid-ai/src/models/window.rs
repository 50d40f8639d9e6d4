//! Audio window produced by the segmenter

use std::fmt;
use std::time::Duration;

/// One fixed-length slice of the source recording
///
/// Windows are contiguous and non-overlapping; only the last one may be
/// shorter than the configured window duration.
#[derive(Clone)]
pub struct AudioWindow {
    /// Ordinal position (0-based)
    pub index: usize,
    /// Offset of the first sample from stream start
    pub start_offset: Duration,
    /// Covered duration
    pub duration: Duration,
    /// WAV-encoded audio for this window
    pub audio_bytes: Vec<u8>,
}

impl AudioWindow {
    /// Offset just past the last sample of this window
    pub fn end_offset(&self) -> Duration {
        self.start_offset + self.duration
    }
}

impl fmt::Debug for AudioWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioWindow")
            .field("index", &self.index)
            .field("start_offset", &self.start_offset)
            .field("duration", &self.duration)
            .field("audio_bytes", &self.audio_bytes.len())
            .finish()
    }
}
