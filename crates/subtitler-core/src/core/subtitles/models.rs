//! Subtitle Data Models

use serde::{Deserialize, Serialize};

/// One subtitle cue.
///
/// Times are kept in their formatted `HH:MM:SS,mmm` form; `None` means the
/// time has not been spotted yet. No ordering is enforced between start and
/// end, inverted ranges are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEntry {
    /// Caption text (may contain newlines when imported from SRT)
    pub content: String,
    /// Start time (`HH:MM:SS,mmm`)
    pub start_time: Option<String>,
    /// End time (`HH:MM:SS,mmm`)
    pub end_time: Option<String>,
}

impl TimedEntry {
    /// Creates an entry without times
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            start_time: None,
            end_time: None,
        }
    }

    /// Creates an entry with optional start and end times
    pub fn with_times(
        content: impl Into<String>,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Self {
        Self {
            content: content.into(),
            start_time: start_time.map(str::to_string),
            end_time: end_time.map(str::to_string),
        }
    }

    /// Checks whether both start and end are set
    pub fn is_fully_timed(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Copies the time range of another entry, keeping this entry's content
    pub fn take_times_from(&mut self, other: &TimedEntry) {
        self.start_time = other.start_time.clone();
        self.end_time = other.end_time.clone();
    }
}
