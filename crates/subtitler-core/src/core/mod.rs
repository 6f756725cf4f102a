//! Subtitler Core Engine
//!
//! Handles subtitle timing, file formats, encode tasks and settings.

pub mod encoding;
pub mod ffmpeg;
pub mod fs;
pub mod player;
pub mod process;
pub mod settings;
pub mod subtitles;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
