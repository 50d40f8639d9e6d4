//! Human-readable offset and elapsed-time formatting
//!
//! Offsets are carried as [`Duration`] everywhere and only rendered at the edge,
//! so every caller prints them the same way.

use std::time::Duration;

const SECONDS_PER_HOUR: u64 = 3600;
const SHORT_ELAPSED_MAX: f64 = 100.0;

/// Format a stream offset for display.
///
/// Offsets under one hour render as `M:SS`, longer ones as `H:MM:SS`.
/// Sub-second precision is truncated.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mixid_common::human_time::format_offset;
///
/// assert_eq!(format_offset(Duration::ZERO), "0:00");
/// assert_eq!(format_offset(Duration::from_secs(80)), "1:20");
/// assert_eq!(format_offset(Duration::from_secs(3725)), "1:02:05");
/// ```
pub fn format_offset(offset: Duration) -> String {
    let total = offset.as_secs();
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format an offset for use inside a file name (`H_MM_SS`).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mixid_common::human_time::format_offset_for_filename;
///
/// assert_eq!(format_offset_for_filename(Duration::from_secs(40)), "0_00_40");
/// assert_eq!(format_offset_for_filename(Duration::from_secs(3725)), "1_02_05");
/// ```
pub fn format_offset_for_filename(offset: Duration) -> String {
    let total = offset.as_secs();
    format!(
        "{}_{:02}_{:02}",
        total / SECONDS_PER_HOUR,
        (total % SECONDS_PER_HOUR) / 60,
        total % 60
    )
}

/// Format elapsed wall time for log lines.
///
/// Short spans render as `X.XXs`, longer ones as `M:SS.Xs`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < SHORT_ELAPSED_MAX {
        format!("{:.2}s", secs)
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{}:{:04.1}s", minutes as u64, secs - minutes * 60.0)
    }
}
