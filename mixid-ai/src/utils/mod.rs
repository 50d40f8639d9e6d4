//! Utility modules for mixid-ai

pub mod audio_decoder;
pub mod wav;

pub use audio_decoder::{decode_audio_file, frames_to_duration, DecodedAudio};
pub use wav::encode_wav_mono16;
