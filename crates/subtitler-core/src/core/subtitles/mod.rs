//! Subtitle Text Model
//!
//! Keeps a free-text editor (one cue per line) and a structured list of
//! timed entries in sync, and converts entries to and from SRT files.
//!
//! # Editor line grammar
//!
//! ```text
//! 00:00:05,909 -> 00:00:08,909 | both times set
//! 00:00:05,909 -> | only the start time set
//! -> 00:00:08,909 | only the end time set
//! plain text without any time
//! ```

mod document;
mod formats;
mod line;
mod models;
mod timecode;

pub use document::*;
pub use formats::*;
pub use line::*;
pub use models::*;
pub use timecode::*;
