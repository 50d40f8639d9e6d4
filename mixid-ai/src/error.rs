//! Error types for mixid-ai
//!
//! Only run-level failures live here. Per-window recognition failures are
//! [`RecognitionError`](crate::services::recognition_client::RecognitionError)
//! values that never leave the pipeline, and search transport failures are
//! returned as data by the match lookup adapter.

use thiserror::Error;

/// Run-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Source audio could not be acquired (download tool failed, file missing)
    #[error("Acquisition failed for {locator}: {message}")]
    Acquisition { locator: String, message: String },

    /// Acquired audio could not be decoded or a window could not be encoded
    #[error("Audio error: {0}")]
    Audio(String),

    /// Bad top-level parameters, raised before any dispatch
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The run was cancelled before every window finished
    #[error("Run cancelled")]
    Cancelled,

    /// Configuration error
    #[error(transparent)]
    Config(#[from] mixid_common::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for mixid-ai operations
pub type Result<T> = std::result::Result<T, Error>;
