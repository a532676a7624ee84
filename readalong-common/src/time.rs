//! Timestamp and playback-position formatting utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a playback position in seconds as clock time.
///
/// Positions under an hour render as `M:SS`, longer ones as `H:MM:SS`.
/// Audiobook recordings run multiple hours, so both forms appear in the UI.
/// Negative inputs (possible transiently with a large negative calibration
/// offset) are clamped to zero rather than rendered with a sign.
///
/// # Examples
///
/// ```
/// use readalong_common::time::format_position;
///
/// assert_eq!(format_position(0.0), "0:00");
/// assert_eq!(format_position(65.4), "1:05");
/// assert_eq!(format_position(3661.0), "1:01:01");
/// ```
pub fn format_position(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
