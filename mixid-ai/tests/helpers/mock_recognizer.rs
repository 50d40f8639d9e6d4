//! Scripted recognizer for pipeline tests
//!
//! Windows built with [`window`] carry their index as the audio bytes, so the
//! recognizer can look up what to answer for each window.

use async_trait::async_trait;
use mixid_ai::models::{AudioWindow, RawPayload};
use mixid_ai::services::{RecognitionError, Recognizer};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted answer for one window
#[derive(Debug, Clone)]
pub enum Reply {
    Track { key: &'static str, title: &'static str },
    NoMatch,
    Fail,
    Hang,
}

/// Recognizer answering from a per-window script
#[derive(Default)]
pub struct ScriptedRecognizer {
    replies: HashMap<usize, (Duration, Reply)>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `reply` for window `index` after `delay`
    pub fn reply(mut self, index: usize, delay: Duration, reply: Reply) -> Self {
        self.replies.insert(index, (delay, reply));
        self
    }

    /// Highest number of concurrent calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recognize(&self, audio: &[u8]) -> Result<Option<RawPayload>, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let index = window_index_of(audio);
        let (delay, reply) = self
            .replies
            .get(&index)
            .cloned()
            .unwrap_or((Duration::ZERO, Reply::NoMatch));

        tokio::time::sleep(delay).await;
        let result = match reply {
            Reply::Track { key, title } => Ok(Some(RawPayload::from_value(json!({
                "track": {"key": key, "title": title, "subtitle": "Test Artist"}
            })))),
            Reply::NoMatch => Ok(None),
            Reply::Fail => Err(RecognitionError::Api(500, "scripted failure".to_string())),
            Reply::Hang => std::future::pending().await,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Window whose audio bytes encode its index
pub fn window(index: usize, window_seconds: u64) -> AudioWindow {
    AudioWindow {
        index,
        start_offset: Duration::from_secs(index as u64 * window_seconds),
        duration: Duration::from_secs(window_seconds),
        audio_bytes: (index as u64).to_le_bytes().to_vec(),
    }
}

/// `count` consecutive 40-second windows
pub fn windows(count: usize) -> Vec<AudioWindow> {
    (0..count).map(|i| window(i, 40)).collect()
}

fn window_index_of(audio: &[u8]) -> usize {
    let mut bytes = [0u8; 8];
    let len = audio.len().min(8);
    bytes[..len].copy_from_slice(&audio[..len]);
    u64::from_le_bytes(bytes) as usize
}
