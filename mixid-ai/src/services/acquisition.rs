//! Audio acquisition
//!
//! Resolves a source locator to a local audio file. Remote locators are
//! fetched with `yt-dlp` into a scratch directory that lives as long as the
//! returned [`AcquiredAudio`]; local paths are used in place.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Default download program
pub const DEFAULT_YT_DLP: &str = "yt-dlp";

/// Default audio bitrate requested from the downloader
pub const DEFAULT_AUDIO_QUALITY: &str = "192K";

/// Output file stem inside the scratch directory
const OUTPUT_STEM: &str = "audio_file";

/// A local audio file ready for decoding
///
/// Dropping this removes any scratch directory created during acquisition.
#[derive(Debug)]
pub struct AcquiredAudio {
    path: PathBuf,
    _scratch: Option<TempDir>,
}

impl AcquiredAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turns a locator into a local audio file
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn acquire(&self, locator: &str) -> Result<AcquiredAudio>;
}

/// Whether `locator` should be downloaded rather than opened
pub fn is_remote_locator(locator: &str) -> bool {
    let lower = locator.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Uses an existing file on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSource;

#[async_trait]
impl AudioSource for LocalFileSource {
    async fn acquire(&self, locator: &str) -> Result<AcquiredAudio> {
        let path = PathBuf::from(locator);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| acquisition_error(locator, e.to_string()))?;

        if !metadata.is_file() {
            return Err(acquisition_error(locator, "not a regular file"));
        }

        Ok(AcquiredAudio {
            path,
            _scratch: None,
        })
    }
}

/// Downloads and extracts audio with `yt-dlp`
#[derive(Debug, Clone)]
pub struct YtDlpAcquirer {
    program: PathBuf,
    audio_format: String,
    audio_quality: String,
}

impl Default for YtDlpAcquirer {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_YT_DLP),
            audio_format: "mp3".to_string(),
            audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
        }
    }
}

impl YtDlpAcquirer {
    pub fn new(audio_format: impl Into<String>) -> Self {
        Self {
            audio_format: audio_format.into(),
            ..Self::default()
        }
    }

    /// Use a different downloader binary
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, locator: &str, scratch: &Path) -> Command {
        let template = scratch.join(format!("{}.%(ext)s", OUTPUT_STEM));
        let mut command = Command::new(&self.program);
        command
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.audio_format)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("-o")
            .arg(template)
            .arg(locator);
        command
    }

    /// Downloaded file in `scratch` carrying the requested extension
    fn find_output(&self, scratch: &Path) -> std::io::Result<Option<PathBuf>> {
        let suffix = format!(".{}", self.audio_format);
        for entry in std::fs::read_dir(scratch)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.starts_with(OUTPUT_STEM) && name.ends_with(&suffix) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AudioSource for YtDlpAcquirer {
    async fn acquire(&self, locator: &str) -> Result<AcquiredAudio> {
        let scratch = tempfile::Builder::new().prefix("mixid-").tempdir()?;

        tracing::info!(
            locator,
            program = %self.program.display(),
            format = %self.audio_format,
            "Downloading audio"
        );

        let mut command = self.command(locator, scratch.path());
        let output = tokio::task::spawn_blocking(move || command.output())
            .await
            .map_err(|e| acquisition_error(locator, format!("download task failed: {}", e)))?
            .map_err(|e| {
                acquisition_error(
                    locator,
                    format!("failed to run {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(acquisition_error(
                locator,
                format!("exit code {:?}: {}", output.status.code(), stderr.trim()),
            ));
        }

        let path = self
            .find_output(scratch.path())?
            .ok_or_else(|| acquisition_error(locator, "downloader produced no audio file"))?;

        tracing::debug!(path = %path.display(), "Audio downloaded");

        Ok(AcquiredAudio {
            path,
            _scratch: Some(scratch),
        })
    }
}

fn acquisition_error(locator: &str, message: impl Into<String>) -> Error {
    Error::Acquisition {
        locator: locator.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_locator_detection() {
        assert!(is_remote_locator("https://www.youtube.com/watch?v=abc"));
        assert!(is_remote_locator("HTTP://example.com/a.mp3"));
        assert!(!is_remote_locator("/tmp/mix.mp3"));
        assert!(!is_remote_locator("mix.flac"));
    }

    #[tokio::test]
    async fn test_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mix.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let acquired = LocalFileSource
            .acquire(file.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(acquired.path(), file);
    }

    #[tokio::test]
    async fn test_local_file_missing() {
        let result = LocalFileSource.acquire("/nonexistent/mix.mp3").await;
        assert!(matches!(result, Err(Error::Acquisition { .. })));
    }

    #[tokio::test]
    async fn test_local_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalFileSource.acquire(dir.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(Error::Acquisition { .. })));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let acquirer = YtDlpAcquirer::default().with_program("/nonexistent/yt-dlp");
        let result = acquirer.acquire("https://example.com/v").await;

        match result {
            Err(Error::Acquisition { locator, message }) => {
                assert_eq!(locator, "https://example.com/v");
                assert!(message.contains("failed to run"));
            }
            other => panic!("expected acquisition error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "echo 'ERROR: video unavailable' >&2\nexit 1");

        let result = YtDlpAcquirer::default()
            .with_program(program)
            .acquire("https://example.com/v")
            .await;

        match result {
            Err(Error::Acquisition { message, .. }) => {
                assert!(message.contains("video unavailable"));
            }
            other => panic!("expected acquisition error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_lands_in_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            dir.path(),
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
touch "$(echo "$out" | sed 's/%(ext)s/mp3/')""#,
        );

        let acquired = YtDlpAcquirer::default()
            .with_program(program)
            .acquire("https://example.com/v")
            .await
            .unwrap();

        let path = acquired.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "audio_file.mp3");

        drop(acquired);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "exit 0");

        let result = YtDlpAcquirer::default()
            .with_program(program)
            .acquire("https://example.com/v")
            .await;
        assert!(matches!(result, Err(Error::Acquisition { .. })));
    }
}
