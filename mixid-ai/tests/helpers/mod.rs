//! Shared test helpers
#![allow(dead_code)]

pub mod audio_generator;
pub mod mock_recognizer;
pub mod mock_server;
