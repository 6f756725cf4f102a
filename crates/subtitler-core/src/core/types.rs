//! Subtitler Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

// =============================================================================
// ID Types
// =============================================================================

/// Encode task unique identifier (ULID)
pub type TaskId = String;

/// Generates a new unique task identifier.
pub fn new_task_id() -> TaskId {
    ulid::Ulid::new().to_string()
}

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Time in whole milliseconds
pub type TimeMillis = u64;

/// Converts seconds to whole milliseconds, saturating negatives and NaN to zero.
pub fn seconds_to_millis(seconds: TimeSec) -> TimeMillis {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0) as TimeMillis
}
