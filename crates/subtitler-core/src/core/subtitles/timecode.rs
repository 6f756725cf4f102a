//! Timestamp formatting and parsing (`HH:MM:SS,mmm`)

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{CoreError, CoreResult, TimeSec};

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2,}:\d{2}:\d{2},\d{3}$").expect("timestamp pattern is valid")
});

/// Absorbs binary representation error so values like `1.001` keep their
/// last millisecond while sub-millisecond parts are still truncated.
const MILLIS_EPSILON: f64 = 1e-6;

/// Formats seconds as a zero-padded `HH:MM:SS,mmm` timestamp.
///
/// The sub-second component is truncated to milliseconds, never rounded.
/// Negative and non-finite inputs format as zero.
pub fn format_time_with_millis(seconds: TimeSec) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0 + MILLIS_EPSILON).floor() as u64
    } else {
        0
    };

    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Parses a `HH:MM:SS,mmm` timestamp into seconds.
///
/// Fails with [`CoreError::MalformedTimestamp`] unless the string splits into
/// exactly four numeric parts on `:` and `,`.
pub fn parse_time_to_seconds(formatted: &str) -> CoreResult<TimeSec> {
    let malformed = || CoreError::MalformedTimestamp(formatted.to_string());

    let parts: Vec<&str> = formatted.trim().split([':', ',']).collect();
    if parts.len() != 4 {
        return Err(malformed());
    }

    let mut values = [0u64; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        *value = part.parse().map_err(|_| malformed())?;
    }

    let [hours, minutes, seconds, millis] = values;
    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}

/// Checks that a string is a fixed-width `HH:MM:SS,mmm` timestamp.
pub fn is_valid_timestamp(value: &str) -> bool {
    TIMESTAMP_RE.is_match(value)
}

/// Normalizes an SRT-style timestamp, accepting `.` as the millisecond separator.
///
/// Returns `None` when the value is not a valid timestamp after normalization.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    let normalized = value.trim().replace('.', ",");
    is_valid_timestamp(&normalized).then_some(normalized)
}
