//! Segmenter
//!
//! Cuts a decoded stream into consecutive fixed-length windows. Window length
//! is fixed in whole frames at the stream's sample rate, and offsets are derived
//! from frame positions, so windows tile the stream exactly: window `i` starts
//! where window `i - 1` ends and only the last window may be shorter.

use crate::error::{Error, Result};
use crate::models::AudioWindow;
use crate::utils::{decode_audio_file, encode_wav_mono16, frames_to_duration, DecodedAudio};
use mixid_common::human_time::format_offset_for_filename;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Decode `path` off the async runtime and segment it
pub async fn load_windows(path: &Path, window_duration: Duration) -> Result<Vec<AudioWindow>> {
    let owned = path.to_path_buf();
    let audio = tokio::task::spawn_blocking(move || decode_audio_file(&owned))
        .await
        .map_err(|e| Error::Audio(format!("Decode task failed: {}", e)))?
        .map_err(|e| Error::Audio(format!("{:#}", e)))?;

    tracing::info!(
        path = %path.display(),
        sample_rate = audio.sample_rate,
        channels = audio.channels,
        duration_seconds = format!("{:.1}", audio.duration().as_secs_f64()),
        "Audio decoded"
    );

    segment(&audio, window_duration)
}

/// Write each window to `dir` as `chunk_<H_MM_SS>.wav`
pub fn export_windows(windows: &[AudioWindow], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let paths = windows
        .iter()
        .map(|window| {
            let path = dir.join(format!(
                "chunk_{}.wav",
                format_offset_for_filename(window.start_offset)
            ));
            std::fs::write(&path, &window.audio_bytes)?;
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(dir = %dir.display(), chunks = paths.len(), "Chunks exported");
    Ok(paths)
}

/// Split `audio` into `ceil(D / window_duration)` WAV-encoded windows
///
/// # Errors
/// `InvalidInput` if the audio is empty, the sample rate is zero, or
/// `window_duration` is shorter than one frame.
pub fn segment(audio: &DecodedAudio, window_duration: Duration) -> Result<Vec<AudioWindow>> {
    let window_frames = window_frames(audio, window_duration)?;
    let total_frames = audio.frames();

    let windows = audio
        .samples
        .chunks(window_frames)
        .enumerate()
        .map(|(index, chunk)| {
            let start_frame = index * window_frames;
            let end_frame = start_frame + chunk.len();
            let start_offset = frames_to_duration(start_frame, audio.sample_rate);
            let end_offset = frames_to_duration(end_frame, audio.sample_rate);

            let audio_bytes = encode_wav_mono16(chunk, audio.sample_rate)
                .map_err(|e| Error::Audio(format!("Failed to encode window {}: {}", index, e)))?;

            Ok(AudioWindow {
                index,
                start_offset,
                duration: end_offset - start_offset,
                audio_bytes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        windows = windows.len(),
        window_frames,
        total_frames,
        sample_rate = audio.sample_rate,
        "Audio segmented"
    );

    Ok(windows)
}

/// Number of frames per window at the stream's sample rate
fn window_frames(audio: &DecodedAudio, window_duration: Duration) -> Result<usize> {
    if audio.is_empty() {
        return Err(Error::InvalidInput("audio is empty".to_string()));
    }
    if audio.sample_rate == 0 {
        return Err(Error::InvalidInput("sample rate is zero".to_string()));
    }

    let frames = window_duration.as_nanos() * audio.sample_rate as u128 / 1_000_000_000;
    if frames == 0 {
        return Err(Error::InvalidInput(format!(
            "window duration {:?} is shorter than one frame at {} Hz",
            window_duration, audio.sample_rate
        )));
    }

    Ok(usize::try_from(frames).unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(seconds: f64, sample_rate: u32) -> DecodedAudio {
        let frames = (seconds * sample_rate as f64).round() as usize;
        let samples = (0..frames)
            .map(|i| (i as f32 * 0.01).sin() * 0.3)
            .collect();
        DecodedAudio::from_mono(samples, sample_rate)
    }

    #[test]
    fn test_exact_multiple() {
        let audio = tone(120.0, 1_000);
        let windows = segment(&audio, Duration::from_secs(40)).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start_offset, Duration::ZERO);
        assert_eq!(windows[1].start_offset, Duration::from_secs(40));
        assert_eq!(windows[2].start_offset, Duration::from_secs(80));
        assert!(windows.iter().all(|w| w.duration == Duration::from_secs(40)));
    }

    #[test]
    fn test_remainder_window() {
        let audio = tone(95.5, 1_000);
        let windows = segment(&audio, Duration::from_secs(40)).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].start_offset, Duration::from_secs(80));
        assert_eq!(windows[2].duration, Duration::from_millis(15_500));
        assert_eq!(windows[2].end_offset(), audio.duration());
    }

    #[test]
    fn test_shorter_than_one_window() {
        let audio = tone(3.0, 8_000);
        let windows = segment(&audio, Duration::from_secs(40)).unwrap();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].duration, Duration::from_secs(3));
    }

    #[test]
    fn test_windows_tile_the_stream() {
        for (seconds, window_ms) in [(10.0, 700u64), (7.3, 1_000), (1.0, 333), (61.0, 20_000)] {
            let audio = tone(seconds, 8_000);
            let window = Duration::from_millis(window_ms);
            let windows = segment(&audio, window).unwrap();

            let frames_per_window = window_ms as usize * 8;
            let expected = audio.frames().div_ceil(frames_per_window);
            assert_eq!(windows.len(), expected, "D={} w={}ms", seconds, window_ms);

            let mut cursor = Duration::ZERO;
            for (i, w) in windows.iter().enumerate() {
                assert_eq!(w.index, i);
                assert_eq!(w.start_offset, cursor);
                assert!(w.duration > Duration::ZERO);
                cursor = w.end_offset();
            }
            assert_eq!(cursor, audio.duration());
        }
    }

    #[test]
    fn test_window_bytes_are_wav() {
        let audio = tone(2.0, 8_000);
        let windows = segment(&audio, Duration::from_secs(1)).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(windows[1].audio_bytes.clone()))
            .unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.len(), 8_000);
    }

    #[test]
    fn test_zero_window_rejected() {
        let audio = tone(1.0, 8_000);
        let result = segment(&audio, Duration::ZERO);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_sub_frame_window_rejected() {
        let audio = tone(1.0, 1_000);
        let result = segment(&audio, Duration::from_micros(500));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_export_names_by_offset() {
        let audio = tone(3.0, 1_000);
        let windows = segment(&audio, Duration::from_secs(1)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let paths = export_windows(&windows, dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["chunk_0_00_00.wav", "chunk_0_00_01.wav", "chunk_0_00_02.wav"]
        );
        assert_eq!(std::fs::read(&paths[1]).unwrap(), windows[1].audio_bytes);
    }

    #[tokio::test]
    async fn test_load_windows_missing_file() {
        let result = load_windows(Path::new("/nonexistent/mix.mp3"), Duration::from_secs(40)).await;
        assert!(matches!(result, Err(Error::Audio(_))));
    }

    #[test]
    fn test_empty_audio_rejected() {
        let audio = DecodedAudio::from_mono(Vec::new(), 44_100);
        let result = segment(&audio, Duration::from_secs(40));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
