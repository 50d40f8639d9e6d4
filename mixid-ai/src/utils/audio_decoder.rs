//! Audio Decoding Utilities
//!
//! Decodes an acquired recording to mono f32 PCM so the segmenter can cut it
//! into windows. Uses symphonia for format-agnostic decoding (MP3, M4A/AAC,
//! FLAC, WAV, OGG, ...).

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decoded audio stream
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source before down-mixing
    pub channels: usize,
}

impl DecodedAudio {
    /// Wrap already-decoded mono samples
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Number of mono frames
    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total stream duration
    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }
}

/// Exact offset of a frame position at `sample_rate`
pub fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = frames as u128 * 1_000_000_000 / sample_rate as u128;
    Duration::from_nanos(nanos as u64)
}

/// Decode audio file to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Probe the container using the file extension as a hint
/// 2. Pick the first track with a known codec
/// 3. Decode every packet of that track, skipping corrupt packets
/// 4. Average all channels down to mono
pub fn decode_audio_file(file_path: &Path) -> Result<DecodedAudio> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    tracing::debug!(
        path = %file_path.display(),
        sample_rate,
        channels,
        "Audio file info"
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(anyhow::anyhow!("Error reading packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_mono(&decoded, &mut samples),
            Err(SymphoniaError::DecodeError(reason)) => {
                skipped_packets += 1;
                tracing::trace!(reason, "Skipping corrupt packet");
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to decode packet in: {}", file_path.display())
                });
            }
        }
    }

    if skipped_packets > 0 {
        tracing::warn!(
            path = %file_path.display(),
            skipped_packets,
            "Some packets could not be decoded"
        );
    }

    let audio = DecodedAudio {
        samples,
        sample_rate,
        channels,
    };

    tracing::debug!(
        path = %file_path.display(),
        total_samples = audio.frames(),
        duration_seconds = format!("{:.2}", audio.duration().as_secs_f64()),
        "Audio decoding complete"
    );

    Ok(audio)
}

/// Down-mix one decoded buffer to mono and append it
fn append_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => mix_channels(buf, out),
        AudioBufferRef::U16(buf) => mix_channels(buf, out),
        AudioBufferRef::U24(buf) => mix_channels(buf, out),
        AudioBufferRef::U32(buf) => mix_channels(buf, out),
        AudioBufferRef::S8(buf) => mix_channels(buf, out),
        AudioBufferRef::S16(buf) => mix_channels(buf, out),
        AudioBufferRef::S24(buf) => mix_channels(buf, out),
        AudioBufferRef::S32(buf) => mix_channels(buf, out),
        AudioBufferRef::F32(buf) => mix_channels(buf, out),
        AudioBufferRef::F64(buf) => mix_channels(buf, out),
    }
}

fn mix_channels<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count().max(1);
    let num_frames = buf.frames();
    out.reserve(num_frames);

    for frame_idx in 0..num_frames {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame_idx]);
        }
        out.push(sum / num_channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_audio_file_not_found() {
        let result = decode_audio_file(Path::new("/nonexistent/file.mp3"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to open audio file"));
    }

    #[test]
    fn test_frames_to_duration() {
        assert_eq!(frames_to_duration(44_100, 44_100), Duration::from_secs(1));
        assert_eq!(frames_to_duration(4_000, 8_000), Duration::from_millis(500));
        assert_eq!(frames_to_duration(10, 0), Duration::ZERO);
    }

    #[test]
    fn test_decoded_audio_duration() {
        let audio = DecodedAudio::from_mono(vec![0.0; 16_000], 8_000);
        assert_eq!(audio.duration(), Duration::from_secs(2));
        assert_eq!(audio.channels, 1);
        assert!(!audio.is_empty());
    }
}
