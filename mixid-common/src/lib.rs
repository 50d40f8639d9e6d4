//! # mixid common library
//!
//! Shared code for the mixid workspace:
//! - Error type used across crates
//! - TOML configuration loading, validation and atomic write-back
//! - Offset and elapsed-time formatting

pub mod config;
pub mod error;
pub mod human_time;

pub use error::{Error, Result};
