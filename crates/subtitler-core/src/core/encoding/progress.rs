//! Progress extraction from encoder output
//!
//! FFmpeg reports elapsed output time as `time=HH:MM:SS.xx` on its stats line
//! and as `out_time=HH:MM:SS.xxxxxx` with `-progress`. Both forms match.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::TimeMillis;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d{2,}):(\d{2}):(\d{2})(?:\.(\d+))?").expect("progress pattern is valid")
});

/// Extracts the elapsed time in milliseconds from one output line.
///
/// Returns `None` for lines without a well-formed `time=` token
/// (including `time=N/A`) and for times too large to represent.
pub fn parse_progress_millis(line: &str) -> Option<TimeMillis> {
    let caps = TIME_RE.captures(line)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let millis = caps
        .get(4)
        .map(|m| fraction_to_millis(m.as_str()))
        .unwrap_or(0);

    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

/// Truncates a decimal fraction (`"45"`, `"123456"`) to milliseconds.
fn fraction_to_millis(digits: &str) -> u64 {
    let mut padded: String = digits.chars().take(3).collect();
    while padded.len() < 3 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

/// Integer percentage of `elapsed_ms` over `total_ms`, clamped to 100.
///
/// `None` when the total is unknown (zero).
pub fn progress_percent(elapsed_ms: TimeMillis, total_ms: TimeMillis) -> Option<u8> {
    if total_ms == 0 {
        return None;
    }
    let percent = elapsed_ms.saturating_mul(100) / total_ms;
    Some(percent.min(100) as u8)
}
